//! Turbine performance: tip-speed ratio, power and drag coefficients.

use crate::config::RigGeometry;
use crate::error::{FoamError, FoamResult};
use crate::series::{Forces, Kinematics, second_order_diff};

use serde::Serialize;

/// Start angle used when the rotor never reached the requested one.
pub const FALLBACK_START_ANGLE_DEG: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfOptions {
    /// Samples with rotor angle at or above this enter the means.
    pub start_angle_deg: f64,
    /// Subtract the rotor's inertial torque before computing C_P.
    pub inertial: bool,
}

impl Default for PerfOptions {
    fn default() -> Self {
        Self {
            start_angle_deg: 360.0,
            inertial: false,
        }
    }
}

/// Force and kinematics samples on one common time base.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AlignedSeries {
    pub time: Vec<f64>,
    pub torque: Vec<f64>,
    pub drag: Vec<f64>,
    pub theta_deg: Vec<f64>,
    pub omega: Vec<f64>,
}

impl AlignedSeries {
    /// Interpolate the kinematics onto the force times.
    pub fn align(forces: &Forces, kinematics: &Kinematics) -> Self {
        let k = kinematics.resample(&forces.time);
        Self {
            time: forces.time.clone(),
            torque: forces.torque.clone(),
            drag: forces.drag.clone(),
            theta_deg: k.theta_deg,
            omega: k.omega,
        }
    }

    fn check(&self) -> FoamResult<usize> {
        let n = self.time.len();
        for (name, len) in [
            ("torque", self.torque.len()),
            ("drag", self.drag.len()),
            ("theta", self.theta_deg.len()),
            ("omega", self.omega.len()),
        ] {
            if len != n {
                return Err(FoamError::MalformedSample(format!(
                    "{} has {} samples but time has {}",
                    name, len, n
                )));
            }
        }
        Ok(n)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerfSample {
    pub time: f64,
    pub theta_deg: f64,
    pub tsr: f64,
    pub cp: f64,
    pub cd: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PerfMeans {
    pub tsr: f64,
    pub cp: f64,
    pub cd: f64,
}

/// Means over the settled part of a run.
///
/// `Unsettled` means were taken from `FALLBACK_START_ANGLE_DEG` because the
/// rotor never reached the requested start angle; they are not converged
/// statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MeanPerformance {
    Settled(PerfMeans),
    Unsettled(PerfMeans),
    InsufficientData,
}

impl MeanPerformance {
    pub fn is_settled(&self) -> bool {
        matches!(self, MeanPerformance::Settled(_))
    }

    /// Means only when they are converged statistics.
    pub fn settled(&self) -> Option<&PerfMeans> {
        match self {
            MeanPerformance::Settled(m) => Some(m),
            _ => None,
        }
    }

    /// Means of either kind; unsettled ones are flagged by the variant.
    pub fn means(&self) -> Option<&PerfMeans> {
        match self {
            MeanPerformance::Settled(m) | MeanPerformance::Unsettled(m) => Some(m),
            MeanPerformance::InsufficientData => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerfReport {
    pub samples: Vec<PerfSample>,
    /// Start angle actually used for the means.
    pub start_angle_deg: f64,
    pub max_angle_deg: f64,
    pub outcome: MeanPerformance,
}

fn mean_where(values: &[f64], mask: &[bool]) -> f64 {
    let (sum, n) = values
        .iter()
        .zip(mask)
        .filter(|(_, keep)| **keep)
        .fold((0.0, 0usize), |(s, n), (v, _)| (s + v, n + 1));
    sum / n as f64
}

/// Pointwise coefficients plus their means from the start angle onward.
pub fn reduce_performance(
    series: &AlignedSeries,
    rig: &RigGeometry,
    opts: &PerfOptions,
) -> FoamResult<PerfReport> {
    let n = series.check()?;

    let max_angle_deg = series
        .theta_deg
        .iter()
        .copied()
        .fold(f64::NEG_INFINITY, f64::max);

    // TODO: confirm with the rig owners whether an unsettled run should
    // average everything from 1 degree or report no mean at all.
    let reached = max_angle_deg >= opts.start_angle_deg;
    let start_angle_deg = if reached {
        opts.start_angle_deg
    } else {
        FALLBACK_START_ANGLE_DEG
    };

    let tsr: Vec<f64> = series
        .omega
        .iter()
        .map(|w| w * rig.radius / rig.u_infty)
        .collect();

    let mut torque = series.torque.clone();
    if opts.inertial {
        let alpha = second_order_diff(&series.omega, &series.time);
        for (q, a) in torque.iter_mut().zip(&alpha) {
            *q -= rig.inertia * a;
        }
    }

    let cp: Vec<f64> = torque
        .iter()
        .zip(&series.omega)
        .map(|(q, w)| q * w / rig.dynamic_power())
        .collect();
    let cd: Vec<f64> = series.drag.iter().map(|d| d / rig.dynamic_force()).collect();

    let samples: Vec<PerfSample> = (0..n)
        .map(|i| PerfSample {
            time: series.time[i],
            theta_deg: series.theta_deg[i],
            tsr: tsr[i],
            cp: cp[i],
            cd: cd[i],
        })
        .collect();

    let mask: Vec<bool> = series
        .theta_deg
        .iter()
        .map(|&t| t >= start_angle_deg)
        .collect();

    let outcome = if !mask.iter().any(|&m| m) {
        MeanPerformance::InsufficientData
    } else {
        let means = PerfMeans {
            tsr: mean_where(&tsr, &mask),
            cp: mean_where(&cp, &mask),
            cd: mean_where(&cd, &mask),
        };
        if reached {
            MeanPerformance::Settled(means)
        } else {
            MeanPerformance::Unsettled(means)
        }
    };

    if !reached {
        tracing::warn!(
            max_angle_deg,
            requested = opts.start_angle_deg,
            "rotor never reached the start angle; means are not settled"
        );
    }

    Ok(PerfReport {
        samples,
        start_angle_deg,
        max_angle_deg,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rig() -> RigGeometry {
        RigGeometry {
            rho: 1000.0,
            height: 1.0,
            diameter: 1.0,
            radius: 0.5,
            u_infty: 1.0,
            inertia: 3.0,
        }
    }

    fn series(theta: Vec<f64>) -> AlignedSeries {
        let n = theta.len();
        AlignedSeries {
            time: (0..n).map(|i| i as f64).collect(),
            torque: vec![10.0; n],
            drag: vec![1.0; n],
            theta_deg: theta,
            omega: vec![2.0; n],
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn settled_after_one_revolution() {
        let report = reduce_performance(&series(vec![0.0, 380.0]), &rig(), &PerfOptions::default())
            .unwrap();
        assert!(report.samples.iter().all(|s| close(s.tsr, 1.0)));
        assert_eq!(report.start_angle_deg, 360.0);
        assert!(report.outcome.is_settled());
        let m = report.outcome.settled().unwrap();
        assert!(close(m.tsr, 1.0));
        assert!(close(m.cp, 0.04));
        assert!(close(m.cd, 0.002));
    }

    #[test]
    fn short_run_is_flagged_unsettled() {
        let report =
            reduce_performance(&series(vec![0.0, 90.0, 180.0]), &rig(), &PerfOptions::default())
                .unwrap();
        assert_eq!(report.start_angle_deg, FALLBACK_START_ANGLE_DEG);
        assert_eq!(report.max_angle_deg, 180.0);
        assert!(!report.outcome.is_settled());
        assert!(report.outcome.settled().is_none());
        match report.outcome {
            MeanPerformance::Unsettled(m) => assert!(close(m.cp, 0.04)),
            other => panic!("expected unsettled, got {:?}", other),
        }
    }

    #[test]
    fn nothing_past_fallback_is_insufficient() {
        let report = reduce_performance(&series(vec![0.0, 0.5]), &rig(), &PerfOptions::default())
            .unwrap();
        assert_eq!(report.outcome, MeanPerformance::InsufficientData);
        assert_eq!(report.samples.len(), 2);
    }

    #[test]
    fn inertial_correction_uses_angular_acceleration() {
        let mut s = series(vec![0.0, 200.0, 400.0]);
        s.omega = vec![1.0, 2.0, 3.0]; // alpha = 1 rad/s^2 everywhere
        let opts = PerfOptions {
            start_angle_deg: 360.0,
            inertial: true,
        };
        let report = reduce_performance(&s, &rig(), &opts).unwrap();
        // (10 - 3 * 1) * 3 / 500
        let m = report.outcome.settled().unwrap();
        assert!(close(m.cp, 21.0 / 500.0), "{}", m.cp);
        assert!(close(m.tsr, 1.5));
    }

    #[test]
    fn mismatched_lengths_are_malformed() {
        let mut s = series(vec![0.0, 380.0]);
        s.drag.pop();
        let err = reduce_performance(&s, &rig(), &PerfOptions::default()).unwrap_err();
        assert!(err.to_string().contains("drag has 1 samples"));
    }

    #[test]
    fn align_interpolates_kinematics() {
        let forces = Forces {
            time: vec![0.5, 1.0],
            torque: vec![1.0, 1.0],
            drag: vec![0.0, 0.0],
        };
        let kin = Kinematics {
            time: vec![0.0, 1.0],
            theta_deg: vec![0.0, 360.0],
            omega: vec![2.0, 2.0],
        };
        let a = AlignedSeries::align(&forces, &kin);
        assert_eq!(a.theta_deg, vec![180.0, 360.0]);
        assert_eq!(a.time, forces.time);
    }
}
