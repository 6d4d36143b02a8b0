//! Rig geometry (rig.json).
//!
//! JSON shape, every field optional:
//! {
//!   "rho": 1000.0,      // fluid density, kg/m^3
//!   "height": 1.0,      // rotor height H, m
//!   "diameter": 1.0,    // rotor diameter D, m
//!   "radius": 0.5,      // rotor radius R, m
//!   "u_infty": 1.0,     // free-stream velocity, m/s
//!   "inertia": 3.0      // rotor inertia for the inertial torque correction, kg m^2
//! }

use anyhow::bail;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct RigGeometry {
    pub rho: f64,
    pub height: f64,
    pub diameter: f64,
    pub radius: f64,
    pub u_infty: f64,
    pub inertia: f64,
}

impl Default for RigGeometry {
    fn default() -> Self {
        Self {
            rho: 1000.0,
            height: 1.0,
            diameter: 1.0,
            radius: 0.5,
            u_infty: 1.0,
            inertia: 3.0,
        }
    }
}

impl RigGeometry {
    /// Frontal (reference) area A = H * D.
    pub fn area(&self) -> f64 {
        self.height * self.diameter
    }

    /// Dynamic pressure times area: 0.5 * rho * A * U^2.
    pub fn dynamic_force(&self) -> f64 {
        0.5 * self.rho * self.area() * self.u_infty.powi(2)
    }

    /// Available power: 0.5 * rho * A * U^3.
    pub fn dynamic_power(&self) -> f64 {
        self.dynamic_force() * self.u_infty
    }

    /// Reject geometries that would make every coefficient infinite or NaN.
    pub fn validate(self) -> anyhow::Result<Self> {
        for (name, v) in [
            ("rho", self.rho),
            ("height", self.height),
            ("diameter", self.diameter),
            ("radius", self.radius),
            ("u_infty", self.u_infty),
        ] {
            if !(v.is_finite() && v > 0.0) {
                bail!("rig.json: {} must be a positive number (got {})", name, v);
            }
        }
        Ok(self)
    }
}
