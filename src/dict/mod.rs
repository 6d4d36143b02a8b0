//! OpenFOAM dictionary text: scanning, patching and generation.
//!
//! Dictionaries are treated as line-oriented text. Only the blocks an
//! operation targets are touched; every other line is carried through
//! byte for byte.

pub mod banner;
pub mod patch;
pub mod sample;
pub mod scan;
pub mod times;

pub use patch::{CyclicAmi, patch_boundary_file};
pub use sample::{SampleDictConfig, render_sample_dict};

/// Render a float the way the solver names its output files: integral
/// values keep a trailing `.0` (`0.0`, `1.0`), everything else is the
/// shortest round-trip representation.
pub fn foam_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::foam_float;

    #[test]
    fn integral_floats_keep_decimal_point() {
        assert_eq!(foam_float(0.0), "0.0");
        assert_eq!(foam_float(-1.0), "-1.0");
        assert_eq!(foam_float(-1.125), "-1.125");
        assert_eq!(foam_float(0.0001), "0.0001");
    }
}
