//! Reductions from raw solver output to the quantities reported per case.
//!
//! - perf: torque/drag/kinematics -> TSR, C_P, C_D and their settled means
//! - sample: `postProcessing/sets/<time>/profile_<z/H>_<fields>.xy` loading
//! - wake: time-averaged (z/H, y/R) maps from the sampled profiles
//! - profile: latest-time velocity and turbulence-energy maps

pub mod perf;
pub mod profile;
pub mod sample;
pub mod wake;

pub use perf::{
    AlignedSeries, MeanPerformance, PerfMeans, PerfOptions, PerfReport, reduce_performance,
};
pub use wake::{WakeMap, WakeOptions, reduce_wake};

use ndarray::Array2;

/// A 2-D field indexed by (section, cross-stream coordinate), ready for
/// contour plotting or CSV export.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldMap {
    pub z_h: Vec<f64>,
    pub y_r: Vec<f64>,
    pub values: Array2<f64>,
}
