//! CSV writers.

use crate::log::row::CaseSummary;
use crate::model::profile::TkeProfile;
use crate::model::{FieldMap, MeanPerformance, PerfReport, WakeMap};

use anyhow::Context;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

pub const PERF_LOG_HEADER: [&str; 14] = [
    "dt",
    "maxco",
    "nx",
    "nz",
    "ncells",
    "nlayers",
    "expratio",
    "tsr",
    "cp",
    "cd",
    "yplus_min",
    "yplus_max",
    "yplus_mean",
    "ddt_scheme",
];

/// One row of the cumulative performance log.
///
/// `None` is written as `nan`: `dt` for adaptive runs, `maxco` for fixed
/// ones, and the coefficients when the means are not settled.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfLogRow {
    pub dt: Option<f64>,
    pub maxco: Option<f64>,
    pub nx: u64,
    pub nz: u64,
    pub ncells: u64,
    pub nlayers: u32,
    pub expratio: f64,
    pub tsr: Option<f64>,
    pub cp: Option<f64>,
    pub cd: Option<f64>,
    pub yplus_min: f64,
    pub yplus_max: f64,
    pub yplus_mean: f64,
    pub ddt_scheme: String,
}

impl PerfLogRow {
    pub fn new(case: &CaseSummary, outcome: &MeanPerformance) -> Self {
        let means = outcome.settled();
        Self {
            dt: case.time_step.delta_t(),
            maxco: case.time_step.max_co(),
            nx: case.blocks.nx,
            nz: case.blocks.nz,
            ncells: case.n_cells,
            nlayers: case.layers.n_layers,
            expratio: case.layers.expansion_ratio,
            tsr: means.map(|m| m.tsr),
            cp: means.map(|m| m.cp),
            cd: means.map(|m| m.cd),
            yplus_min: case.y_plus.min,
            yplus_max: case.y_plus.max,
            yplus_mean: case.y_plus.mean,
            ddt_scheme: case.ddt_scheme.clone(),
        }
    }

    fn record(&self) -> Vec<String> {
        let opt = |v: Option<f64>| v.map_or_else(|| "nan".to_string(), |v| v.to_string());
        vec![
            opt(self.dt),
            opt(self.maxco),
            self.nx.to_string(),
            self.nz.to_string(),
            self.ncells.to_string(),
            self.nlayers.to_string(),
            self.expratio.to_string(),
            opt(self.tsr),
            opt(self.cp),
            opt(self.cd),
            self.yplus_min.to_string(),
            self.yplus_max.to_string(),
            self.yplus_mean.to_string(),
            self.ddt_scheme.clone(),
        ]
    }
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create output directory {}", parent.display()))?;
    }
    Ok(())
}

/// Append one row, writing the header first when the file is new or empty.
pub fn append_perf_log(path: &Path, row: &PerfLogRow) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open performance log {}", path.display()))?;
    let empty = file.metadata()?.len() == 0;

    let mut w = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    if empty {
        w.write_record(PERF_LOG_HEADER)?;
    }
    w.write_record(row.record())?;
    w.flush()?;
    Ok(())
}

/// Pointwise coefficients against rotor angle.
pub fn write_perf_series(path: &Path, report: &PerfReport) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["theta_deg", "tsr", "cp", "cd"])?;
    for s in &report.samples {
        w.write_record([
            s.theta_deg.to_string(),
            s.tsr.to_string(),
            s.cp.to_string(),
            s.cd.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// A (z/H, y/R) map: the header row holds y/R, the first column z/H.
pub fn write_field_map(path: &Path, map: &FieldMap) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;

    let header: Vec<String> = std::iter::once("z_H".to_string())
        .chain(map.y_r.iter().map(|y| y.to_string()))
        .collect();
    w.write_record(&header)?;

    for (z, row) in map.z_h.iter().zip(map.values.rows()) {
        let record: Vec<String> = std::iter::once(z.to_string())
            .chain(row.iter().map(|v| v.to_string()))
            .collect();
        w.write_record(&record)?;
    }
    w.flush()?;
    Ok(())
}

/// k across one section. A modeled part that was never sampled stays `NaN`.
pub fn write_tke_profile(path: &Path, profile: &TkeProfile) -> anyhow::Result<()> {
    ensure_parent(path)?;
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["y_R", "k_resolved", "k_modeled", "k_total"])?;
    for i in 0..profile.y_r.len() {
        w.write_record([
            profile.y_r[i].to_string(),
            profile.k_resolved[i].to_string(),
            profile.k_modeled[i].to_string(),
            profile.k_total[i].to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

/// One `<field>.csv` per wake field under `dir`.
pub fn write_wake_map(dir: &Path, wake: &WakeMap) -> anyhow::Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for name in wake.fields.keys() {
        let Some(map) = wake.field(name) else {
            continue;
        };
        let path = dir.join(format!("{}.csv", name));
        write_field_map(&path, &map)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::row::{BlockCounts, LayerSettings, TimeStepPolicy, YPlus};
    use crate::model::PerfMeans;
    use pretty_assertions::assert_eq;

    fn case(time_step: TimeStepPolicy) -> CaseSummary {
        CaseSummary {
            n_cells: 120000,
            y_plus: YPlus {
                min: 0.5,
                max: 40.0,
                mean: 8.25,
            },
            blocks: BlockCounts { nx: 48, ny: 48, nz: 32 },
            layers: LayerSettings {
                n_layers: 3,
                expansion_ratio: 1.25,
            },
            time_step,
            ddt_scheme: "Euler".to_string(),
        }
    }

    #[test]
    fn header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("processed/all_perf.csv");
        let settled = MeanPerformance::Settled(PerfMeans {
            tsr: 1.5,
            cp: 0.25,
            cd: 0.75,
        });
        let row = PerfLogRow::new(&case(TimeStepPolicy::Adaptive { max_co: 0.9 }), &settled);
        append_perf_log(&path, &row).unwrap();

        let unsettled = MeanPerformance::Unsettled(PerfMeans {
            tsr: 1.0,
            cp: 0.1,
            cd: 0.2,
        });
        let row = PerfLogRow::new(&case(TimeStepPolicy::Fixed { delta_t: 0.002 }), &unsettled);
        append_perf_log(&path, &row).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "dt,maxco,nx,nz,ncells,nlayers,expratio,tsr,cp,cd,yplus_min,yplus_max,yplus_mean,ddt_scheme",
                "nan,0.9,48,32,120000,3,1.25,1.5,0.25,0.75,0.5,40,8.25,Euler",
                "0.002,nan,48,32,120000,3,1.25,nan,nan,nan,0.5,40,8.25,Euler",
            ]
        );
    }

    #[test]
    fn field_map_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meanu.csv");
        let map = FieldMap {
            z_h: vec![0.5, 0.0],
            y_r: vec![-1.0, 1.0],
            values: ndarray::arr2(&[[1.0, 2.0], [3.0, 4.5]]),
        };
        write_field_map(&path, &map).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "z_H,-1,1\n0.5,1,2\n0,3,4.5\n"
        );
    }

    #[test]
    fn tke_profile_keeps_missing_modeled_part() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k_profile_0.25.csv");
        let profile = TkeProfile {
            y_r: vec![-1.0, 0.5],
            k_resolved: vec![0.75, 0.25],
            k_modeled: vec![f64::NAN, f64::NAN],
            k_total: vec![0.75, 0.25],
        };
        write_tke_profile(&path, &profile).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "y_R,k_resolved,k_modeled,k_total\n-1,0.75,NaN,0.75\n0.5,0.25,NaN,0.25\n"
        );
    }
}
