//! Config layer: JSON inputs + validated in-memory structures.
//!
//! This module is intentionally separate from parsing and reduction.
//! It owns:
//! - RigGeometry (reference constants for coefficient formulas)
//! - JSON loading for the optional config files the CLI accepts

pub mod rig;

pub use rig::RigGeometry;

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Read a JSON config file, or fall back to `T::default()` when no path was given.
pub fn load_or_default<T>(path: Option<&Path>) -> anyhow::Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config file {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse config file {}", path.display()))
}
