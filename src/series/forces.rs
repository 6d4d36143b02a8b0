//! Rotor torque and drag over time.

use crate::error::{FoamError, FoamResult};
use crate::series::parse_columns;

use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Forces {
    pub time: Vec<f64>,
    /// Moment about the rotor axis (z), pressure plus viscous.
    pub torque: Vec<f64>,
    /// Streamwise (x) force, pressure plus viscous.
    pub drag: Vec<f64>,
}

impl Forces {
    fn push(&mut self, t: f64, torque: f64, drag: f64) {
        self.time.push(t);
        self.torque.push(torque);
        self.drag.push(drag);
    }

    /// Append a later series, dropping samples of `self` at or after the
    /// later series' first time (a restart overwrites the overlap).
    pub fn extend_restart(&mut self, later: Forces) {
        if let Some(&t0) = later.time.first() {
            let keep = self.time.partition_point(|&t| t < t0);
            self.time.truncate(keep);
            self.torque.truncate(keep);
            self.drag.truncate(keep);
        }
        self.time.extend(later.time);
        self.torque.extend(later.torque);
        self.drag.extend(later.drag);
    }
}

/// Parse a forces file.
///
/// Rows containing parentheses are OpenFOAM `forces.dat` rows:
///     t ((px py pz) (vx vy vz) [(ox oy oz)]) ((mpx mpy mpz) (mvx mvy mvz) [...])
/// where all force vectors are summed for drag (x) and all moment vectors for
/// torque (z). Otherwise rows are plain `time torque drag` columns.
pub fn read_forces(text: &str, source: &str) -> FoamResult<Forces> {
    let is_foam = text
        .lines()
        .any(|l| !l.trim_start().starts_with('#') && l.contains('('));
    if !is_foam {
        let mut out = Forces::default();
        for row in parse_columns(text, 3, source)? {
            out.push(row[0], row[1], row[2]);
        }
        return Ok(out);
    }

    let flat = text
        .lines()
        .map(|l| {
            if l.trim_start().starts_with('#') {
                String::new()
            } else {
                l.replace(['(', ')'], " ")
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = Forces::default();
    for (i, row) in parse_columns(&flat, 7, source)?.into_iter().enumerate() {
        let values = row.len() - 1;
        if values % 6 != 0 {
            return Err(FoamError::MalformedSample(format!(
                "{}: row {} has {} vector components, expected a multiple of 6",
                source,
                i + 1,
                values
            )));
        }
        let vectors = values / 6;
        let drag: f64 = (0..vectors).map(|j| row[1 + 3 * j]).sum();
        let torque: f64 = (0..vectors).map(|j| row[1 + 3 * vectors + 3 * j + 2]).sum();
        out.push(row[0], torque, drag);
    }
    Ok(out)
}

/// Read every `<start time>/forces.dat` below `dir` and join them in start
/// time order.
pub fn load_forces_dir(dir: &Path) -> FoamResult<Forces> {
    let mut starts: Vec<(f64, std::path::PathBuf)> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Ok(t) = name.parse::<f64>() else {
            continue;
        };
        let path = entry.path().join("forces.dat");
        if path.is_file() {
            starts.push((t, path));
        }
    }
    starts.sort_by(|a, b| a.0.total_cmp(&b.0));

    if starts.is_empty() {
        return Err(FoamError::MalformedSample(format!(
            "no <time>/forces.dat under {}",
            dir.display()
        )));
    }

    let mut out = Forces::default();
    for (_, path) in starts {
        let text = fs::read_to_string(&path)?;
        out.extend_restart(read_forces(&text, &path.display().to_string())?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FORCES_DAT: &str = "\
# Forces
# CofR                : (0.000000e+00 0.000000e+00 0.000000e+00)
# Time                forces(pressure viscous porous) moment(pressure viscous porous)
0.001\t((10 1 0) (2 0 0) (0 0 0)) ((0 0 5) (0 0 1) (0 0 0))
0.002\t((11 1 0) (2 0 0) (0 0 0)) ((0 0 6) (0 0 1) (0 0 0))
";

    #[test]
    fn sums_pressure_and_viscous_parts() {
        let f = read_forces(FORCES_DAT, "forces.dat").unwrap();
        assert_eq!(f.time, vec![0.001, 0.002]);
        assert_eq!(f.drag, vec![12.0, 13.0]);
        assert_eq!(f.torque, vec![6.0, 7.0]);
    }

    #[test]
    fn plain_columns() {
        let f = read_forces("0 10 1\n1 10 1\n", "perf.dat").unwrap();
        assert_eq!(f.torque, vec![10.0, 10.0]);
        assert_eq!(f.drag, vec![1.0, 1.0]);
    }

    #[test]
    fn odd_vector_count_is_malformed() {
        let err = read_forces("0.1 ((1 2 3) (4 5 6)) ((7 8 9))\n", "forces.dat").unwrap_err();
        assert!(matches!(err, FoamError::MalformedSample(_)));
    }

    #[test]
    fn restarts_overwrite_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let runs = [
            ("0", "0.0 1 0\n0.1 1 0\n0.2 1 0\n"),
            ("0.15", "0.15 2 0\n0.25 2 0\n"),
        ];
        for (start, rows) in runs {
            fs::create_dir_all(dir.path().join(start)).unwrap();
            fs::write(dir.path().join(start).join("forces.dat"), rows).unwrap();
        }
        let f = load_forces_dir(dir.path()).unwrap();
        assert_eq!(f.time, vec![0.0, 0.1, 0.15, 0.25]);
        assert_eq!(f.torque, vec![1.0, 1.0, 2.0, 2.0]);
    }
}
