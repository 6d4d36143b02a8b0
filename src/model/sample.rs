//! Sampled-profile files written by the solver's `sets` function object.
//!
//! Layout:
//!   postProcessing/sets/<time>/profile_<z/H>_<fields>.xy
//! Each file is raw whitespace columns: the cross-stream coordinate first,
//! then every component of every sampled field, in sampling order.

use crate::error::{FoamError, FoamResult};
use crate::series::parse_columns;

use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};

const PROFILE_NAME_RE: &str = r"^profile_([-+0-9.eE]+)_(.+)\.xy$";

fn profile_name_re() -> FoamResult<Regex> {
    Regex::new(PROFILE_NAME_RE).map_err(|e| FoamError::parse("profile name regex", e.to_string()))
}

/// Split `profile_<z/H>_<fields>.xy` into section and field group.
pub fn parse_profile_name(re: &Regex, name: &str) -> Option<(f64, String)> {
    let caps = re.captures(name)?;
    let section = caps.get(1)?.as_str().parse::<f64>().ok()?;
    Some((section, caps.get(2)?.as_str().to_string()))
}

/// One profile file: all columns, column 0 being the coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSample {
    pub section: f64,
    pub group: String,
    pub columns: Vec<Vec<f64>>,
}

impl ProfileSample {
    pub fn coords(&self) -> &[f64] {
        self.columns.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn column(&self, index: usize) -> Option<&[f64]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    /// Parse file text into columns. Rows must all have the same width.
    pub fn parse(section: f64, group: &str, text: &str, source: &str) -> FoamResult<Self> {
        let rows = parse_columns(text, 1, source)?;
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if width == 0 {
            return Err(FoamError::MalformedSample(format!("{}: no data rows", source)));
        }

        let mut columns = vec![Vec::with_capacity(rows.len()); width];
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(FoamError::MalformedSample(format!(
                    "{}: row {} has {} columns, first row has {}",
                    source,
                    i + 1,
                    row.len(),
                    width
                )));
            }
            for (col, v) in columns.iter_mut().zip(row) {
                col.push(*v);
            }
        }

        Ok(Self {
            section,
            group: group.to_string(),
            columns,
        })
    }
}

/// Numeric subdirectories of `sets_dir`, ascending by time.
pub fn list_times(sets_dir: &Path) -> FoamResult<Vec<(f64, PathBuf)>> {
    let mut times = Vec::new();
    for entry in fs::read_dir(sets_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        if let Ok(t) = entry.file_name().to_string_lossy().parse::<f64>() {
            times.push((t, entry.path()));
        }
    }
    times.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(times)
}

/// The directory of the latest sample time.
pub fn latest_time(sets_dir: &Path) -> FoamResult<(f64, PathBuf)> {
    list_times(sets_dir)?.pop().ok_or_else(|| {
        FoamError::MalformedSample(format!("no time directories in {}", sets_dir.display()))
    })
}

/// Load every profile at one time, sorted by section.
///
/// With `group` set, only files of that field group are read. Without it,
/// each section must have exactly one file.
pub fn load_time(dir: &Path, group: Option<&str>) -> FoamResult<Vec<ProfileSample>> {
    let re = profile_name_re()?;
    let mut samples: Vec<ProfileSample> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some((section, file_group)) = parse_profile_name(&re, &name) else {
            tracing::debug!(file = %name, "skipping non-profile file");
            continue;
        };
        if group.is_some_and(|g| g != file_group) {
            continue;
        }

        let path = entry.path();
        let text = fs::read_to_string(&path)?;
        let source = path.display().to_string();
        let sample = ProfileSample::parse(section, &file_group, &text, &source)?;

        if let Some(prev) = samples.iter().find(|s| s.section == section) {
            return Err(FoamError::MalformedSample(format!(
                "z/H = {} has several field groups in {} ({} and {}); select one",
                section,
                dir.display(),
                prev.group,
                file_group
            )));
        }
        samples.push(sample);
    }
    samples.sort_by(|a, b| a.section.total_cmp(&b.section));
    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn profile_names() {
        let re = profile_name_re().unwrap();
        assert_eq!(
            parse_profile_name(&re, "profile_-1.125_U_vorticity.xy"),
            Some((-1.125, "U_vorticity".to_string()))
        );
        assert_eq!(
            parse_profile_name(&re, "profile_0.0_UMean.xy"),
            Some((0.0, "UMean".to_string()))
        );
        assert_eq!(parse_profile_name(&re, "profile_top_U.xy"), None);
        assert_eq!(parse_profile_name(&re, "forces.dat"), None);
    }

    #[test]
    fn ragged_rows_are_malformed() {
        let err = ProfileSample::parse(0.0, "U", "0 1 2\n1 1\n", "p.xy").unwrap_err();
        assert!(err.to_string().contains("row 2 has 2 columns"));
    }

    #[test]
    fn loads_one_group_per_section() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("profile_0.5_U.xy"), "0 1\n1 2\n").unwrap();
        fs::write(dir.path().join("profile_-0.5_U.xy"), "0 3\n1 4\n").unwrap();
        fs::write(dir.path().join("profile_0.5_k.xy"), "0 9\n1 9\n").unwrap();

        let err = load_time(dir.path(), None).unwrap_err();
        assert!(err.to_string().contains("several field groups"));

        let samples = load_time(dir.path(), Some("U")).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].section, -0.5);
        assert_eq!(samples[0].column(1), Some(&[3.0, 4.0][..]));
        assert_eq!(samples[1].coords(), &[0.0, 1.0]);
    }

    #[test]
    fn times_sorted_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for t in ["10", "2.5", "3"] {
            fs::create_dir(dir.path().join(t)).unwrap();
        }
        let times: Vec<f64> = list_times(dir.path()).unwrap().into_iter().map(|t| t.0).collect();
        assert_eq!(times, vec![2.5, 3.0, 10.0]);
        assert_eq!(latest_time(dir.path()).unwrap().0, 10.0);
    }
}
