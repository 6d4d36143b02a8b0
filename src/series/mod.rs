//! Time series read from solver output.
//!
//! Two sources feed the performance reduction:
//! - forces, either an OpenFOAM `forces.dat` or a plain column file
//! - rotor kinematics: time, rotation angle (degrees), angular velocity
//!
//! Kinematics are sampled on their own time base and are interpolated onto
//! the force times before any pointwise math.

pub mod diff;
pub mod forces;

pub use diff::{interp, second_order_diff};
pub use forces::{Forces, read_forces};

use crate::error::{FoamError, FoamResult};

use std::fs;
use std::path::Path;

/// Rows of whitespace-separated numbers. Blank lines and `#` comments are
/// skipped; every row must have at least `min_columns` fields.
pub fn parse_columns(text: &str, min_columns: usize, source: &str) -> FoamResult<Vec<Vec<f64>>> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|f| {
                f.parse::<f64>().map_err(|_| {
                    FoamError::parse(format!("{}:{}", source, lineno + 1), f)
                })
            })
            .collect::<FoamResult<Vec<f64>>>()?;
        if row.len() < min_columns {
            return Err(FoamError::MalformedSample(format!(
                "{}:{}: expected at least {} columns, found {}",
                source,
                lineno + 1,
                min_columns,
                row.len()
            )));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Rotor angle (degrees) and angular velocity (rad/s) over time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Kinematics {
    pub time: Vec<f64>,
    pub theta_deg: Vec<f64>,
    pub omega: Vec<f64>,
}

impl Kinematics {
    /// Parse `time theta omega` rows.
    pub fn parse(text: &str, source: &str) -> FoamResult<Self> {
        let rows = parse_columns(text, 3, source)?;
        let mut k = Kinematics::default();
        for row in rows {
            k.time.push(row[0]);
            k.theta_deg.push(row[1]);
            k.omega.push(row[2]);
        }
        Ok(k)
    }

    pub fn read(path: &Path) -> FoamResult<Self> {
        let text = fs::read_to_string(path)?;
        Self::parse(&text, &path.display().to_string())
    }

    /// Resample onto another time base.
    pub fn resample(&self, t: &[f64]) -> Self {
        Self {
            time: t.to_vec(),
            theta_deg: interp(t, &self.time, &self.theta_deg),
            omega: interp(t, &self.time, &self.omega),
        }
    }
}
