//! `system/sampleDict` generation for cross-stream wake profiles.
//!
//! One cloud set is written per spanwise section `z/H`, each listing the
//! same cross-stream `y` points at a fixed streamwise `x`. The solver writes
//! the sampled data back as `profile_<z/H>_<fields>.xy`, which is what the
//! wake reduction reads.

use crate::dict::banner::{FOOTER, foam_file_header};
use crate::dict::foam_float;

use serde::Deserialize;

/// A list of coordinates, given explicitly or generated.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Spacing {
    /// `n` evenly spaced values from `min` to `max`, both included.
    Linspace { min: f64, max: f64, n: usize },
    /// `start, start + step, ...` strictly below `stop`.
    Arange { start: f64, stop: f64, step: f64 },
    Explicit { values: Vec<f64> },
}

impl Spacing {
    pub fn values(&self) -> Vec<f64> {
        match self {
            Spacing::Linspace { min, max, n } => match *n {
                0 => Vec::new(),
                1 => vec![*min],
                n => {
                    let step = (max - min) / (n - 1) as f64;
                    (0..n).map(|i| min + step * i as f64).collect()
                }
            },
            Spacing::Arange { start, stop, step } => {
                if *step == 0.0 || (stop - start) / step <= 0.0 {
                    return Vec::new();
                }
                let n = ((stop - start) / step).ceil() as usize;
                (0..n).map(|i| start + step * i as f64).collect()
            }
            Spacing::Explicit { values } => values.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SampleDictConfig {
    pub x: f64,
    pub y: Spacing,
    pub z_h: Spacing,
    pub fields: Vec<String>,
    pub set_format: String,
    pub interpolation_scheme: String,
}

/// Cross-stream points refined towards the rotor edge and mirrored about
/// `y = 0`.
fn refined_y_points() -> Vec<f64> {
    // The fourth point is +1.0 in every existing sampled data set; keep it.
    let mut half = vec![-1.5, -1.375, -1.25, 1.0];
    half.extend(Spacing::Arange { start: -1.0, stop: -0.799, step: 0.1 }.values());
    half.extend(Spacing::Arange { start: -0.75, stop: -0.001, step: 0.05 }.values());
    half.push(0.0);
    let mirror: Vec<f64> = half[..half.len() - 1].iter().rev().map(|y| -y).collect();
    half.extend(mirror);
    half
}

impl Default for SampleDictConfig {
    fn default() -> Self {
        Self {
            x: 1.0,
            y: Spacing::Explicit {
                values: refined_y_points(),
            },
            z_h: Spacing::Arange {
                start: -1.125,
                stop: 1.126,
                step: 0.125,
            },
            fields: vec!["U".to_string()],
            set_format: "raw".to_string(),
            interpolation_scheme: "cellPoint".to_string(),
        }
    }
}

pub fn set_name(z_h: f64) -> String {
    format!("profile_{}", foam_float(z_h))
}

fn push_set_block(out: &mut String, x: f64, ys: &[f64], z: f64) {
    out.push_str(&format!("    {}\n", set_name(z)));
    out.push_str("    {\n");
    out.push_str("        type        cloud;\n");
    out.push_str("        axis        y;\n");
    out.push_str("        points      (");
    for y in ys {
        out.push_str(&format!(
            "\n                        ({} {} {})",
            foam_float(x),
            foam_float(*y),
            foam_float(z)
        ));
    }
    out.push_str("\n                    );\n");
    out.push_str("    }\n");
}

/// Render the complete dictionary text.
pub fn render_sample_dict(cfg: &SampleDictConfig) -> String {
    let ys = cfg.y.values();
    let mut out = foam_file_header("ascii", None, "sampleDict");
    out.push('\n');
    out.push_str(&format!("setFormat {};\n\n", cfg.set_format));
    out.push_str(&format!("interpolationScheme {};\n\n", cfg.interpolation_scheme));
    out.push_str("sets\n(\n");
    for z in cfg.z_h.values() {
        push_set_block(&mut out, cfg.x, &ys, z);
        out.push('\n');
    }
    out.push_str(");\n\n");
    out.push_str("fields\n(\n");
    for field in &cfg.fields {
        out.push_str(&format!("    {}\n", field));
    }
    out.push_str(");\n\n");
    out.push_str(FOOTER);
    out
}
