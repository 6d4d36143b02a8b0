//! Access tokens from JSON dotfiles in the user's home directory.
//!
//! ~/.dropboxrc   {"token": "..."}
//! ~/.figsharerc  {"personal_token": "..."}

use crate::error::{FoamError, FoamResult};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct DropboxRc {
    token: String,
}

#[derive(Debug, Deserialize)]
struct FigshareRc {
    personal_token: String,
}

fn dotfile(name: &str) -> FoamResult<PathBuf> {
    home::home_dir()
        .map(|h| h.join(name))
        .ok_or_else(|| FoamError::TransferFailure("cannot locate the home directory".to_string()))
}

fn read_rc<T: DeserializeOwned>(path: &Path) -> FoamResult<T> {
    let text = fs::read_to_string(path).map_err(|e| {
        FoamError::TransferFailure(format!("read credentials {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&text).map_err(|e| {
        FoamError::TransferFailure(format!("parse credentials {}: {}", path.display(), e))
    })
}

pub fn dropbox_token_from(path: &Path) -> FoamResult<String> {
    read_rc::<DropboxRc>(path).map(|rc| rc.token)
}

pub fn figshare_token_from(path: &Path) -> FoamResult<String> {
    read_rc::<FigshareRc>(path).map(|rc| rc.personal_token)
}

pub fn dropbox_token() -> FoamResult<String> {
    dropbox_token_from(&dotfile(".dropboxrc")?)
}

pub fn figshare_token() -> FoamResult<String> {
    figshare_token_from(&dotfile(".figsharerc")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(".dropboxrc");
        fs::write(&db, r#"{"token": "abc"}"#).unwrap();
        assert_eq!(dropbox_token_from(&db).unwrap(), "abc");

        let fs_rc = dir.path().join(".figsharerc");
        fs::write(&fs_rc, r#"{"personal_token": "xyz", "other": 1}"#).unwrap();
        assert_eq!(figshare_token_from(&fs_rc).unwrap(), "xyz");
    }

    #[test]
    fn wrong_key_is_a_transfer_failure() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join(".figsharerc");
        fs::write(&rc, r#"{"token": "abc"}"#).unwrap();
        let err = figshare_token_from(&rc).unwrap_err();
        assert!(matches!(err, FoamError::TransferFailure(_)));
        assert!(matches!(
            dropbox_token_from(&dir.path().join("missing")),
            Err(FoamError::TransferFailure(_))
        ));
    }
}
