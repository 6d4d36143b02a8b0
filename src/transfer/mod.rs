//! Moving case results to and from remote storage.
//!
//! Directories travel as `<name>.gz` tarballs; the solver log travels as-is.
//! A remote that already holds a name is never overwritten by a batch, and a
//! local item that already exists is never downloaded again.

pub mod archive;
pub mod credentials;
pub mod dropbox;
pub mod figshare;

pub use archive::{compress_dir, extract};
pub use dropbox::DropboxStore;
pub use figshare::FigshareStore;

use crate::dict::times::is_time_dir;
use crate::error::{FoamError, FoamResult};

use reqwest::blocking::Response;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub size: u64,
}

/// A flat remote folder of named files.
pub trait RemoteStore {
    fn list(&self) -> FoamResult<Vec<RemoteEntry>>;
    fn fetch(&self, name: &str, dest: &Path) -> FoamResult<()>;
    fn store(&self, local: &Path, name: &str) -> FoamResult<()>;
}

/// Turn a non-success response into `TransferFailure`.
pub(crate) fn checked(resp: Response, what: &str) -> FoamResult<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    Err(FoamError::TransferFailure(format!(
        "{}: HTTP {}: {}",
        what,
        status,
        body.trim()
    )))
}

/// Fields kept when a time directory is archived.
pub const TIME_DIR_FIELDS: [&str; 6] = ["U", "p", "k", "nut", "uniform", "polyMesh"];

pub const SOLVER_LOG: &str = "log.pimpleDyMFoam";

#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub time_fields: Vec<String>,
    pub solver_log: String,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            time_fields: TIME_DIR_FIELDS.iter().map(|s| s.to_string()).collect(),
            solver_log: SOLVER_LOG.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferReport {
    pub transferred: Vec<String>,
    pub skipped: Vec<String>,
}

/// Local items worth keeping remotely, sorted: numeric time directories
/// except `0`, `constant`, `postProcessing`, and the solver log if present.
pub fn local_items(case: &Path, solver_log: &str) -> FoamResult<Vec<String>> {
    let mut items = Vec::new();
    for entry in fs::read_dir(case)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry.file_type()?.is_dir();
        let wanted = if name == solver_log {
            !is_dir
        } else {
            is_dir && (is_time_dir(&name) || name == "constant" || name == "postProcessing")
        };
        if wanted {
            items.push(name);
        }
    }
    items.sort();
    Ok(items)
}

/// Compress and upload every local item the store lacks.
///
/// Archives are deleted after upload. The first failure aborts the batch.
pub fn upload_all<S: RemoteStore + ?Sized>(
    store: &S,
    case: &Path,
    opts: &UploadOptions,
) -> FoamResult<TransferReport> {
    let remote: BTreeSet<String> = store.list()?.into_iter().map(|e| e.name).collect();
    let mut report = TransferReport::default();

    for item in local_items(case, &opts.solver_log)? {
        let path = case.join(&item);
        let is_log = item == opts.solver_log;
        let remote_name = if is_log { item.clone() } else { format!("{}.gz", item) };

        if remote.contains(&remote_name) {
            tracing::info!(name = %remote_name, "already uploaded");
            report.skipped.push(remote_name);
            continue;
        }

        if is_log {
            tracing::info!(name = %remote_name, "Uploading");
            store.store(&path, &remote_name)?;
        } else {
            tracing::info!(dir = %item, "Compressing");
            let allow = is_time_dir(&item).then_some(opts.time_fields.as_slice());
            let gz = compress_dir(&path, allow)?;
            tracing::info!(name = %remote_name, "Uploading");
            store.store(&gz, &remote_name)?;
            tracing::info!(name = %remote_name, "Deleting local copy");
            fs::remove_file(&gz)?;
        }
        report.transferred.push(remote_name);
    }
    Ok(report)
}

/// Download every remote file missing locally and unpack the archives.
pub fn download_all<S: RemoteStore + ?Sized>(store: &S, case: &Path) -> FoamResult<TransferReport> {
    let mut report = TransferReport::default();

    for entry in store.list()? {
        let name = entry.name;
        let stem = name.strip_suffix(".gz");
        let present = case.join(&name).exists() || stem.is_some_and(|s| case.join(s).exists());
        if present {
            tracing::info!(name = %name, "already exists");
            report.skipped.push(name);
            continue;
        }

        let dest = case.join(&name);
        tracing::info!(name = %name, size = entry.size, "Downloading");
        store.fetch(&name, &dest)?;
        if stem.is_some() {
            tracing::info!(name = %name, "Uncompressing");
            if let Err(e) = extract(&dest, case) {
                // A leftover archive would count as present on the next run.
                fs::remove_file(&dest)?;
                return Err(e);
            }
            tracing::info!(name = %name, "Deleting local copy");
            fs::remove_file(&dest)?;
        }
        report.transferred.push(name);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MemoryStore {
        files: RefCell<BTreeMap<String, Vec<u8>>>,
    }

    impl RemoteStore for MemoryStore {
        fn list(&self) -> FoamResult<Vec<RemoteEntry>> {
            Ok(self
                .files
                .borrow()
                .iter()
                .map(|(name, data)| RemoteEntry {
                    name: name.clone(),
                    size: data.len() as u64,
                })
                .collect())
        }

        fn fetch(&self, name: &str, dest: &Path) -> FoamResult<()> {
            let files = self.files.borrow();
            let data = files
                .get(name)
                .ok_or_else(|| FoamError::TransferFailure(format!("no {}", name)))?;
            fs::write(dest, data)?;
            Ok(())
        }

        fn store(&self, local: &Path, name: &str) -> FoamResult<()> {
            self.files.borrow_mut().insert(name.to_string(), fs::read(local)?);
            Ok(())
        }
    }

    struct FailingStore;

    impl RemoteStore for FailingStore {
        fn list(&self) -> FoamResult<Vec<RemoteEntry>> {
            Ok(Vec::new())
        }
        fn fetch(&self, _: &str, _: &Path) -> FoamResult<()> {
            Err(FoamError::TransferFailure("HTTP 500".to_string()))
        }
        fn store(&self, _: &Path, _: &str) -> FoamResult<()> {
            Err(FoamError::TransferFailure("HTTP 500".to_string()))
        }
    }

    fn case() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let c = dir.path();
        for d in ["0", "0.5/uniform", "constant/polyMesh", "system", "postProcessing/sets/0.5"] {
            fs::create_dir_all(c.join(d)).unwrap();
        }
        fs::write(c.join("0.5/U"), "U").unwrap();
        fs::write(c.join("0.5/vorticity"), "w").unwrap();
        fs::write(c.join("0.5/uniform/time"), "t").unwrap();
        fs::write(c.join("constant/polyMesh/points"), "pts").unwrap();
        fs::write(c.join("postProcessing/sets/0.5/profile_0.0_U.xy"), "0 1\n").unwrap();
        fs::write(c.join(SOLVER_LOG), "Time = 0.5\n").unwrap();
        dir
    }

    #[test]
    fn picks_case_items() {
        let dir = case();
        assert_eq!(
            local_items(dir.path(), SOLVER_LOG).unwrap(),
            vec!["0.5", "constant", "log.pimpleDyMFoam", "postProcessing"]
        );
    }

    #[test]
    fn upload_then_download_round_trip() {
        let dir = case();
        let store = MemoryStore::default();
        store
            .files
            .borrow_mut()
            .insert("constant.gz".to_string(), Vec::new());

        let up = upload_all(&store, dir.path(), &UploadOptions::default()).unwrap();
        assert_eq!(up.transferred, vec!["0.5.gz", "log.pimpleDyMFoam", "postProcessing.gz"]);
        assert_eq!(up.skipped, vec!["constant.gz"]);
        assert!(!dir.path().join("0.5.gz").exists());

        // The placeholder is not a valid archive.
        store.files.borrow_mut().remove("constant.gz");

        let fresh = tempfile::tempdir().unwrap();
        fs::create_dir(fresh.path().join("postProcessing")).unwrap();
        let down = download_all(&store, fresh.path()).unwrap();
        assert_eq!(down.transferred, vec!["0.5.gz", "log.pimpleDyMFoam"]);
        assert_eq!(down.skipped, vec!["postProcessing.gz"]);

        let f = fresh.path();
        assert_eq!(fs::read_to_string(f.join("0.5/U")).unwrap(), "U");
        assert_eq!(fs::read_to_string(f.join("0.5/uniform/time")).unwrap(), "t");
        assert!(!f.join("0.5/vorticity").exists());
        assert!(!f.join("0.5.gz").exists());
        assert_eq!(fs::read_to_string(f.join(SOLVER_LOG)).unwrap(), "Time = 0.5\n");
    }

    #[test]
    fn failed_extraction_leaves_nothing_behind() {
        let store = MemoryStore::default();
        store
            .files
            .borrow_mut()
            .insert("0.5.gz".to_string(), b"not a gzip stream".to_vec());

        let fresh = tempfile::tempdir().unwrap();
        assert!(download_all(&store, fresh.path()).is_err());
        assert!(!fresh.path().join("0.5.gz").exists());

        // The next run tries again instead of skipping.
        let err = download_all(&store, fresh.path()).unwrap_err();
        assert!(matches!(err, FoamError::Io(_)), "{:?}", err);
    }

    #[test]
    fn failure_aborts_batch() {
        let dir = case();
        let err = upload_all(&FailingStore, dir.path(), &UploadOptions::default()).unwrap_err();
        assert!(matches!(err, FoamError::TransferFailure(_)));
    }
}
