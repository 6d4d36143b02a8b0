//! Output side: CSV exports and the terminal performance summary.
//!
//! Plotting is left to external tools; every map and series written here is
//! plain CSV that a plotting script can read directly.

pub mod export;
pub mod summary;

pub use export::{
    PerfLogRow, append_perf_log, write_field_map, write_perf_series, write_tke_profile,
    write_wake_map,
};
pub use summary::print_perf_summary;
