//! Latest-time mean velocity and turbulence kinetic energy.
//!
//! These read the time-averaged fields (`UMean`, `UPrime2Mean`, `kMean`) that
//! the solver's field averaging writes into the same `sets` output.

use crate::config::RigGeometry;
use crate::error::{FoamError, FoamResult};
use crate::model::FieldMap;
use crate::model::sample::{ProfileSample, latest_time, load_time};

use ndarray::Array2;
use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    U,
    V,
    W,
}

impl Component {
    fn column(self) -> usize {
        match self {
            Component::U => 1,
            Component::V => 2,
            Component::W => 3,
        }
    }
}

impl FromStr for Component {
    type Err = FoamError;

    fn from_str(s: &str) -> FoamResult<Self> {
        match s {
            "u" => Ok(Component::U),
            "v" => Ok(Component::V),
            "w" => Ok(Component::W),
            other => Err(FoamError::parse("velocity component (u, v or w)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TkeAmount {
    Resolved,
    Modeled,
    Total,
}

impl FromStr for TkeAmount {
    type Err = FoamError;

    fn from_str(s: &str) -> FoamResult<Self> {
        match s {
            "resolved" => Ok(TkeAmount::Resolved),
            "modeled" => Ok(TkeAmount::Modeled),
            "total" => Ok(TkeAmount::Total),
            other => Err(FoamError::parse("tke amount (resolved, modeled or total)", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TkeProfile {
    pub y_r: Vec<f64>,
    pub k_resolved: Vec<f64>,
    /// NaN when `kMean` was not sampled.
    pub k_modeled: Vec<f64>,
    pub k_total: Vec<f64>,
}

impl TkeProfile {
    fn amount(&self, amount: TkeAmount) -> &[f64] {
        match amount {
            TkeAmount::Resolved => &self.k_resolved,
            TkeAmount::Modeled => &self.k_modeled,
            TkeAmount::Total => &self.k_total,
        }
    }
}

fn column<'a>(sample: &'a ProfileSample, index: usize, what: &str) -> FoamResult<&'a [f64]> {
    sample.column(index).ok_or_else(|| {
        FoamError::MalformedSample(format!(
            "{} profile at z/H = {} has no column {}",
            what, sample.section, index
        ))
    })
}

/// Stack one row per section, top section first.
fn stack_rows(
    samples: &[ProfileSample],
    rig: &RigGeometry,
    row: impl Fn(&ProfileSample) -> FoamResult<Vec<f64>>,
) -> FoamResult<FieldMap> {
    let Some(first) = samples.first() else {
        return Err(FoamError::MalformedSample("no profiles at the latest time".to_string()));
    };
    let coords = first.coords().to_vec();

    let mut ordered: Vec<&ProfileSample> = samples.iter().collect();
    ordered.reverse();

    let mut values = Array2::<f64>::zeros((ordered.len(), coords.len()));
    for (i, s) in ordered.iter().enumerate() {
        if s.coords() != coords.as_slice() {
            return Err(FoamError::MalformedSample(format!(
                "z/H = {}: sample coordinates differ from the first profile",
                s.section
            )));
        }
        for (j, v) in row(s)?.into_iter().enumerate() {
            values[[i, j]] = v;
        }
    }

    Ok(FieldMap {
        z_h: ordered.iter().map(|s| s.section).collect(),
        y_r: coords.iter().map(|y| y / rig.radius).collect(),
        values,
    })
}

/// One mean velocity component over all sections, rows by descending z/H.
pub fn velocity_map(
    sets_dir: &Path,
    component: Component,
    rig: &RigGeometry,
) -> FoamResult<FieldMap> {
    let (_, dir) = latest_time(sets_dir)?;
    let samples = load_time(&dir, Some("UMean"))?;
    stack_rows(&samples, rig, |s| Ok(column(s, component.column(), "UMean")?.to_vec()))
}

fn tke_from_samples(
    prime: &ProfileSample,
    k: Option<&ProfileSample>,
    rig: &RigGeometry,
) -> FoamResult<TkeProfile> {
    // symmTensor columns: xx xy xz yy yz zz
    let xx = column(prime, 1, "UPrime2Mean")?;
    let yy = column(prime, 4, "UPrime2Mean")?;
    let zz = column(prime, 6, "UPrime2Mean")?;
    let k_resolved: Vec<f64> = (0..xx.len()).map(|i| 0.5 * (xx[i] + yy[i] + zz[i])).collect();

    let (k_modeled, k_total) = match k {
        Some(k) => {
            let modeled = column(k, 1, "kMean")?.to_vec();
            if modeled.len() != k_resolved.len() {
                return Err(FoamError::MalformedSample(format!(
                    "kMean at z/H = {} has {} points, UPrime2Mean has {}",
                    k.section,
                    modeled.len(),
                    k_resolved.len()
                )));
            }
            let total = modeled.iter().zip(&k_resolved).map(|(m, r)| m + r).collect();
            (modeled, total)
        }
        None => (vec![f64::NAN; k_resolved.len()], k_resolved.clone()),
    };

    Ok(TkeProfile {
        y_r: prime.coords().iter().map(|y| y / rig.radius).collect(),
        k_resolved,
        k_modeled,
        k_total,
    })
}

/// Resolved, modeled and total k at one section.
pub fn tke_profile(sets_dir: &Path, z_h: f64, rig: &RigGeometry) -> FoamResult<TkeProfile> {
    let (_, dir) = latest_time(sets_dir)?;
    let primes = load_time(&dir, Some("UPrime2Mean"))?;
    let prime = primes.iter().find(|s| s.section == z_h).ok_or_else(|| {
        FoamError::MalformedSample(format!("no UPrime2Mean profile at z/H = {}", z_h))
    })?;
    let ks = load_time(&dir, Some("kMean"))?;
    tke_from_samples(prime, ks.iter().find(|s| s.section == z_h), rig)
}

/// k over all sections, rows by descending z/H.
pub fn tke_map(sets_dir: &Path, amount: TkeAmount, rig: &RigGeometry) -> FoamResult<FieldMap> {
    let (_, dir) = latest_time(sets_dir)?;
    let primes = load_time(&dir, Some("UPrime2Mean"))?;
    let ks = load_time(&dir, Some("kMean"))?;
    stack_rows(&primes, rig, |s| {
        let k = ks.iter().find(|k| k.section == s.section);
        Ok(tke_from_samples(s, k, rig)?.amount(amount).to_vec())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn case() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let latest = dir.path().join("4.5");
        fs::create_dir_all(dir.path().join("2")).unwrap();
        fs::create_dir_all(&latest).unwrap();
        for (z, u) in [("0.0", 1.0), ("0.5", 2.0)] {
            fs::write(
                latest.join(format!("profile_{}_UMean.xy", z)),
                format!("-0.5 {u} 0.1 0.2\n0.5 {u} 0.3 0.4\n"),
            )
            .unwrap();
            fs::write(
                latest.join(format!("profile_{}_UPrime2Mean.xy", z)),
                "-0.5 0.25 9 9 0.5 9 0.75\n0.5 0.5 9 9 1.0 9 1.5\n",
            )
            .unwrap();
        }
        fs::write(latest.join("profile_0.0_kMean.xy"), "-0.5 0.25\n0.5 0.5\n").unwrap();
        dir
    }

    fn rig() -> RigGeometry {
        RigGeometry {
            radius: 0.5,
            ..RigGeometry::default()
        }
    }

    #[test]
    fn velocity_rows_run_top_down() {
        let dir = case();
        let map = velocity_map(dir.path(), Component::U, &rig()).unwrap();
        assert_eq!(map.z_h, vec![0.5, 0.0]);
        assert_eq!(map.y_r, vec![-1.0, 1.0]);
        assert_eq!(map.values, ndarray::arr2(&[[2.0, 2.0], [1.0, 1.0]]));

        let w = velocity_map(dir.path(), "w".parse().unwrap(), &rig()).unwrap();
        assert_eq!(w.values.row(1).to_vec(), vec![0.2, 0.4]);
    }

    #[test]
    fn tke_with_and_without_modeled_part() {
        let dir = case();
        let p = tke_profile(dir.path(), 0.0, &rig()).unwrap();
        assert_eq!(p.k_resolved, vec![0.75, 1.5]);
        assert_eq!(p.k_modeled, vec![0.25, 0.5]);
        assert_eq!(p.k_total, vec![1.0, 2.0]);

        let p = tke_profile(dir.path(), 0.5, &rig()).unwrap();
        assert!(p.k_modeled.iter().all(|k| k.is_nan()));
        assert_eq!(p.k_total, p.k_resolved);
    }

    #[test]
    fn tke_map_selects_amount() {
        let dir = case();
        let map = tke_map(dir.path(), TkeAmount::Resolved, &rig()).unwrap();
        assert_eq!(map.z_h, vec![0.5, 0.0]);
        assert_eq!(map.values, ndarray::arr2(&[[0.75, 1.5], [0.75, 1.5]]));
    }

    #[test]
    fn unknown_component() {
        assert!("x".parse::<Component>().is_err());
        assert!("total".parse::<TkeAmount>().is_ok());
    }
}
