//! Repair of `<time>/uniform/time` metadata files.
//!
//! Interrupted or reconstructed runs can leave time directories whose
//! `uniform/time` file is missing or empty, which stops the solver from
//! restarting there. The file only records the time value, the step index
//! and the step size, so it can be regenerated.

use crate::dict::banner::{FOOTER, foam_file_header};
use crate::error::FoamResult;

use std::fs;
use std::path::{Path, PathBuf};

/// Numeric directory name other than the initial-conditions directory `0`.
pub fn is_time_dir(name: &str) -> bool {
    name != "0" && name.parse::<f64>().is_ok_and(|v| v.is_finite())
}

pub fn time_dict(value: &str, index: u64, dt: f64) -> String {
    let mut out = foam_file_header("binary", Some(&format!("{}/uniform", value)), "time");
    out.push('\n');
    out.push_str(&format!("value           {};\n\n", value));
    out.push_str(&format!("name            \"{}\";\n\n", value));
    out.push_str(&format!("index           {};\n\n", index));
    out.push_str(&format!("deltaT          {};\n\n", dt));
    out.push_str(&format!("deltaT0         {};\n\n\n", dt));
    out.push_str(FOOTER);
    out
}

fn needs_repair(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    }
}

/// Write a time file into every time directory of `case` that lacks a
/// non-empty one. Returns the written paths, sorted.
pub fn repair_time_files(case: &Path, dt: f64) -> FoamResult<Vec<PathBuf>> {
    let mut fixed = Vec::new();
    for entry in fs::read_dir(case)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !is_time_dir(&name) {
            continue;
        }

        let path = entry.path().join("uniform").join("time");
        if !needs_repair(&path) {
            continue;
        }

        // Step count from the time value; rounding avoids 0.006 / 0.002 = 2.999...
        let value: f64 = name.parse().unwrap_or_default();
        let index = (value / dt).round().max(0.0) as u64;

        tracing::info!(path = %path.display(), index, "fixing time file");
        fs::create_dir_all(entry.path().join("uniform"))?;
        fs::write(&path, time_dict(&name, index, dt))?;
        fixed.push(path);
    }
    fixed.sort();
    Ok(fixed)
}
