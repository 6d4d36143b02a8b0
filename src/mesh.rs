//! Wall-layer refinement.
//!
//! `snappyHexMesh` is asked for a single thick wall layer; `refineWallLayer`
//! then splits it repeatedly into `nlayers` cells growing geometrically away
//! from the wall.

use crate::Result;

use anyhow::{Context, bail};
use std::process::Command;

pub const REFINE_UTILITY: &str = "refineWallLayer";

/// Split ratios that turn one layer into `nlayers` cells with the given
/// expansion ratio.
///
/// Each split keeps the fraction of the current layer nearest the wall; the
/// first split peels off the outermost cell.
pub fn layer_split_ratios(nlayers: usize, expansion: f64) -> Vec<f64> {
    if nlayers < 2 {
        return Vec::new();
    }

    let mut heights = Vec::with_capacity(nlayers);
    let mut h = 1.0;
    for _ in 0..nlayers {
        heights.push(h);
        h *= expansion;
    }
    let total: f64 = heights.iter().sum();
    for h in &mut heights {
        *h /= total;
    }

    // prefix[k] = sum of the k cells nearest the wall
    let mut prefix = vec![0.0; nlayers + 1];
    for (k, h) in heights.iter().enumerate() {
        prefix[k + 1] = prefix[k] + h;
    }

    (1..nlayers)
        .map(|n| prefix[nlayers - n] / prefix[nlayers - n + 1])
        .collect()
}

pub fn refine_args(patch: &str, ratio: f64) -> Vec<String> {
    vec!["-overwrite".to_string(), patch.to_string(), ratio.to_string()]
}

/// Run the refinement utility for every patch and ratio, in that order.
/// With `dry_run` the commands are only logged.
pub fn refine_wall_layers(patches: &[String], ratios: &[f64], dry_run: bool) -> Result<usize> {
    let mut runs = 0;
    for patch in patches {
        for &ratio in ratios {
            let args = refine_args(patch, ratio);
            tracing::info!("{} {}", REFINE_UTILITY, args.join(" "));
            runs += 1;
            if dry_run {
                continue;
            }
            let status = Command::new(REFINE_UTILITY)
                .args(&args)
                .status()
                .with_context(|| format!("spawn {}", REFINE_UTILITY))?;
            if !status.success() {
                bail!("{} {} failed: {}", REFINE_UTILITY, args.join(" "), status);
            }
        }
    }
    Ok(runs)
}
