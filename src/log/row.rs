//! Values scraped from solver logs and case dictionaries.

use serde::Serialize;

/// Wall-normal y+ statistics for one patch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YPlus {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

/// Background mesh cell counts from `blockMeshDict`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub nx: u64,
    pub ny: u64,
    pub nz: u64,
}

/// Boundary-layer settings from `snappyHexMeshDict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayerSettings {
    pub n_layers: u32,
    pub expansion_ratio: f64,
}

/// How `controlDict` chooses the time step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeStepPolicy {
    Adaptive { max_co: f64 },
    Fixed { delta_t: f64 },
}

impl TimeStepPolicy {
    pub fn max_co(&self) -> Option<f64> {
        match self {
            TimeStepPolicy::Adaptive { max_co } => Some(*max_co),
            TimeStepPolicy::Fixed { .. } => None,
        }
    }

    pub fn delta_t(&self) -> Option<f64> {
        match self {
            TimeStepPolicy::Fixed { delta_t } => Some(*delta_t),
            TimeStepPolicy::Adaptive { .. } => None,
        }
    }
}

/// Plane-averaged mean-momentum recovery terms from `funkyDoCalc` logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecoveryTerms {
    pub y_adv: f64,
    pub z_adv: f64,
    pub turb_trans: f64,
    pub visc_trans: f64,
    pub pressure_trans: f64,
}

/// Everything the performance log records about a case besides the
/// coefficients themselves.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CaseSummary {
    pub n_cells: u64,
    pub y_plus: YPlus,
    pub blocks: BlockCounts,
    pub layers: LayerSettings,
    pub time_step: TimeStepPolicy,
    pub ddt_scheme: String,
}
