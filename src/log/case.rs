//! Scrapers applied to the standard case layout.

use crate::Result;
use crate::log::parse::{
    block_counts, cell_count, ddt_scheme, last_keyed_value, layer_settings, time_step_policy,
    y_plus,
};
use crate::log::row::{CaseSummary, RecoveryTerms};

use anyhow::Context;
use std::fs;
use std::path::Path;

fn read(case: &Path, rel: &str) -> Result<String> {
    let path = case.join(rel);
    fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
}

/// Run every scraper the performance log needs against `case`.
///
/// Reads `log.checkMesh`, `log.yPlus`, `constant/polyMesh/blockMeshDict`,
/// `system/snappyHexMeshDict`, `system/fvSchemes` and `system/controlDict`.
pub fn collect_case_summary(case: &Path, wall_patch: &str) -> Result<CaseSummary> {
    let n_cells = cell_count(&read(case, "log.checkMesh")?).context("log.checkMesh")?;
    let y_plus = y_plus(&read(case, "log.yPlus")?, wall_patch).context("log.yPlus")?;
    if y_plus.min <= 0.0 || y_plus.mean <= 0.0 {
        tracing::warn!(?y_plus, "y+ statistics are not positive; check the yPlus log layout");
    }

    let blocks = block_counts(&read(case, "constant/polyMesh/blockMeshDict")?)
        .context("constant/polyMesh/blockMeshDict")?;
    let layers = layer_settings(&read(case, "system/snappyHexMeshDict")?)
        .context("system/snappyHexMeshDict")?;
    let ddt_scheme = ddt_scheme(&read(case, "system/fvSchemes")?).context("system/fvSchemes")?;
    let time_step =
        time_step_policy(&read(case, "system/controlDict")?).context("system/controlDict")?;

    Ok(CaseSummary {
        n_cells,
        y_plus,
        blocks,
        layers,
        time_step,
        ddt_scheme,
    })
}

/// Mean-momentum recovery terms from `log.funkyDoCalc.{0,1,2}`.
///
/// `weightedAverage` means a different term in each log: the z advection in
/// the first, turbulent transport in the second, pressure transport in the
/// third.
pub fn read_recovery_terms(case: &Path) -> Result<RecoveryTerms> {
    let log0 = read(case, "log.funkyDoCalc.0")?;
    let log1 = read(case, "log.funkyDoCalc.1")?;
    let log2 = read(case, "log.funkyDoCalc.2")?;

    Ok(RecoveryTerms {
        y_adv: last_keyed_value(&log0, "planeAverageAdvectionY").context("log.funkyDoCalc.0")?,
        z_adv: last_keyed_value(&log0, "weightedAverage").context("log.funkyDoCalc.0")?,
        turb_trans: last_keyed_value(&log1, "weightedAverage").context("log.funkyDoCalc.1")?,
        visc_trans: last_keyed_value(&log1, "planeAverageViscTrans")
            .context("log.funkyDoCalc.1")?,
        pressure_trans: last_keyed_value(&log2, "weightedAverage").context("log.funkyDoCalc.2")?,
    })
}
