//! Time-averaged wake maps from the sampled profiles.

use crate::config::RigGeometry;
use crate::error::{FoamError, FoamResult};
use crate::model::FieldMap;
use crate::model::sample::{ProfileSample, list_times, load_time};

use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One output field and the profile column it comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WakeColumn {
    pub name: String,
    pub index: usize,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

impl WakeColumn {
    pub fn required(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            required: true,
        }
    }

    pub fn optional(name: &str, index: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            required: false,
        }
    }

    /// Velocity components from `U`, plus streamwise vorticity when sampled.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::required("meanu", 1),
            Self::required("meanv", 2),
            Self::required("meanw", 3),
            Self::optional("xvorticity", 4),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WakeOptions {
    /// First sample time included in the average.
    pub t1: f64,
    /// Field group to read when several are sampled per section.
    pub group: Option<String>,
    pub columns: Vec<WakeColumn>,
}

impl Default for WakeOptions {
    fn default() -> Self {
        Self {
            t1: 3.0,
            group: None,
            columns: WakeColumn::defaults(),
        }
    }
}

/// An optional column that some section files lacked. Those entries were
/// zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncompleteSample {
    pub time: f64,
    pub section: f64,
    pub field: String,
    pub column: usize,
}

impl From<IncompleteSample> for FoamError {
    fn from(n: IncompleteSample) -> Self {
        FoamError::IncompleteSample {
            time: n.time,
            section: n.section,
            field: n.field,
            column: n.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WakeMap {
    /// Sample times that entered the average.
    pub times: Vec<f64>,
    pub z_h: Vec<f64>,
    pub y_r: Vec<f64>,
    /// (section, coordinate) arrays keyed by field name.
    pub fields: BTreeMap<String, Array2<f64>>,
    pub incomplete: Vec<IncompleteSample>,
}

impl WakeMap {
    pub fn field(&self, name: &str) -> Option<FieldMap> {
        self.fields.get(name).map(|values| FieldMap {
            z_h: self.z_h.clone(),
            y_r: self.y_r.clone(),
            values: values.clone(),
        })
    }
}

/// Every time must carry the same sections and every section the same
/// coordinates as the first one seen.
fn check_layout(
    time: f64,
    samples: &[ProfileSample],
    sections: &[f64],
    coords: &[f64],
) -> FoamResult<()> {
    let found: Vec<f64> = samples.iter().map(|s| s.section).collect();
    if found != sections {
        return Err(FoamError::MalformedSample(format!(
            "t = {} has sections {:?}, expected {:?}",
            time, found, sections
        )));
    }
    for s in samples {
        if s.coords() != coords {
            return Err(FoamError::MalformedSample(format!(
                "t = {}, z/H = {}: sample coordinates differ from the first profile",
                time, s.section
            )));
        }
    }
    Ok(())
}

/// Average the profiles of every sample time at or after `opts.t1`.
pub fn reduce_wake(sets_dir: &Path, opts: &WakeOptions, rig: &RigGeometry) -> FoamResult<WakeMap> {
    let selected: Vec<_> = list_times(sets_dir)?
        .into_iter()
        .filter(|(t, _)| *t >= opts.t1)
        .collect();
    if selected.is_empty() {
        return Err(FoamError::MalformedSample(format!(
            "no sample times at or after t = {} in {}",
            opts.t1,
            sets_dir.display()
        )));
    }

    let mut per_time = Vec::with_capacity(selected.len());
    for (t, dir) in &selected {
        tracing::debug!(time = t, dir = %dir.display(), "loading profiles");
        per_time.push((*t, load_time(dir, opts.group.as_deref())?));
    }

    let (t0, first) = &per_time[0];
    if first.is_empty() {
        return Err(FoamError::MalformedSample(format!(
            "no profile files at t = {}",
            t0
        )));
    }
    let sections: Vec<f64> = first.iter().map(|s| s.section).collect();
    let coords: Vec<f64> = first[0].coords().to_vec();
    for (t, samples) in &per_time {
        check_layout(*t, samples, &sections, &coords)?;
    }

    let shape = (per_time.len(), sections.len(), coords.len());
    let mut fields = BTreeMap::new();
    let mut incomplete = Vec::new();

    for col in &opts.columns {
        let mut cube = Array3::<f64>::zeros(shape);
        let mut missing = Vec::new();

        for (ti, (t, samples)) in per_time.iter().enumerate() {
            for (si, sample) in samples.iter().enumerate() {
                let notice = IncompleteSample {
                    time: *t,
                    section: sample.section,
                    field: col.name.clone(),
                    column: col.index,
                };
                match sample.column(col.index) {
                    Some(values) => {
                        for (k, v) in values.iter().enumerate() {
                            cube[[ti, si, k]] = *v;
                        }
                    }
                    None if col.required => return Err(notice.into()),
                    None => missing.push(notice),
                }
            }
        }

        if missing.len() == shape.0 * shape.1 {
            tracing::debug!(field = %col.name, "column not sampled; dropping field");
            continue;
        }
        for n in &missing {
            tracing::warn!(
                time = n.time,
                section = n.section,
                field = %n.field,
                "column {} missing; zero-filled",
                n.column
            );
        }
        incomplete.extend(missing);

        let mean = cube.mean_axis(Axis(0)).ok_or_else(|| {
            FoamError::MalformedSample(format!("no samples to average for {}", col.name))
        })?;
        fields.insert(col.name.clone(), mean);
    }

    Ok(WakeMap {
        times: per_time.iter().map(|(t, _)| *t).collect(),
        z_h: sections,
        y_r: coords.iter().map(|y| y / rig.radius).collect(),
        fields,
        incomplete,
    })
}
