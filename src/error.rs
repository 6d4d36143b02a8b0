//! Error kinds shared by the dictionary, log, model and transfer layers.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FoamError {
    #[error("malformed dictionary: {0}")]
    MalformedDictionary(String),

    #[error("anchor {anchor:?} not found: {detail}")]
    AnchorNotFound { anchor: String, detail: String },

    #[error("incomplete sample at t = {time}, z/H = {section}: column {column} ({field}) missing")]
    IncompleteSample {
        time: f64,
        section: f64,
        field: String,
        column: usize,
    },

    #[error("malformed sample data: {0}")]
    MalformedSample(String),

    #[error("transfer failed: {0}")]
    TransferFailure(String),

    #[error("archive member {member:?} escapes {}", dest.display())]
    PathTraversal { member: String, dest: PathBuf },

    #[error("parse error ({context}): {value:?}")]
    Parse { context: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FoamError {
    pub fn anchor(anchor: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::AnchorNotFound {
            anchor: anchor.into(),
            detail: detail.into(),
        }
    }

    pub fn parse(context: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            value: value.into(),
        }
    }
}

impl From<reqwest::Error> for FoamError {
    fn from(e: reqwest::Error) -> Self {
        Self::TransferFailure(e.to_string())
    }
}

pub type FoamResult<T> = std::result::Result<T, FoamError>;
