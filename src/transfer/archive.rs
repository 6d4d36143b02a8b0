//! tar.gz packing of case directories, and guarded extraction.

use crate::error::{FoamError, FoamResult};

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::{self, File};
use std::path::{Component, Path, PathBuf};

/// `<dir>.gz` next to `dir`.
pub fn archive_path(dir: &Path) -> PathBuf {
    let mut name = dir.as_os_str().to_owned();
    name.push(".gz");
    PathBuf::from(name)
}

/// Pack `dir` into `<dir>.gz` with every entry under `<dir name>/`.
///
/// With `allow` set only those top-level names are packed; names missing
/// from `dir` are skipped with a warning.
pub fn compress_dir(dir: &Path, allow: Option<&[String]>) -> FoamResult<PathBuf> {
    let base = dir
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| FoamError::TransferFailure(format!("cannot archive {}", dir.display())))?;

    let names: Vec<String> = match allow {
        Some(list) => list.to_vec(),
        None => {
            let mut all = Vec::new();
            for entry in fs::read_dir(dir)? {
                all.push(entry?.file_name().to_string_lossy().into_owned());
            }
            all.sort();
            all
        }
    };

    let out = archive_path(dir);
    let file = File::create(&out)?;
    let mut tar = tar::Builder::new(GzEncoder::new(file, Compression::default()));

    for name in names {
        let src = dir.join(&name);
        if !src.exists() {
            tracing::warn!(dir = %dir.display(), entry = %name, "not present; skipped");
            continue;
        }
        tracing::debug!(entry = %name, archive = %out.display(), "adding");
        if src.is_dir() {
            tar.append_dir_all(base.join(&name), &src)?;
        } else {
            tar.append_path_with_name(&src, base.join(&name))?;
        }
    }

    tar.into_inner()?.finish()?;
    Ok(out)
}

/// True when `path`, taken relative to a directory `depth` levels below the
/// destination, is absolute or climbs above the destination.
fn escapes(path: &Path, mut depth: usize) -> bool {
    for c in path.components() {
        match c {
            Component::Prefix(_) | Component::RootDir => return true,
            Component::ParentDir => {
                if depth == 0 {
                    return true;
                }
                depth -= 1;
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
        }
    }
    false
}

fn open(archive: &Path) -> FoamResult<tar::Archive<GzDecoder<File>>> {
    Ok(tar::Archive::new(GzDecoder::new(File::open(archive)?)))
}

/// Unpack `archive` into `dest`.
///
/// Every member is checked before anything is written: an absolute member
/// path, a path that climbs above `dest`, or a link pointing outside it fails
/// the whole archive with `PathTraversal`.
pub fn extract(archive: &Path, dest: &Path) -> FoamResult<()> {
    let mut checked = open(archive)?;
    for entry in checked.entries()? {
        let entry = entry?;
        let path = entry.path()?.into_owned();
        let member = path.to_string_lossy().into_owned();
        let traversal = || FoamError::PathTraversal {
            member: member.clone(),
            dest: dest.to_path_buf(),
        };

        if escapes(&path, 0) {
            return Err(traversal());
        }
        if let Some(link) = entry.link_name()? {
            // Hard links name another member, so they resolve from the
            // archive root; symlinks resolve from the member's own directory.
            let depth = match entry.header().entry_type() {
                tar::EntryType::Link => 0,
                _ => path.components().count().saturating_sub(1),
            };
            if escapes(&link, depth) {
                return Err(traversal());
            }
        }
    }

    fs::create_dir_all(dest)?;
    open(archive)?.unpack(dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    enum Member<'a> {
        File(&'a str, &'a [u8]),
        HardLink(&'a str, &'a str),
        Symlink(&'a str, &'a str),
    }

    fn raw_header(name: &str, kind: tar::EntryType, size: u64, link: Option<&str>) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
        if let Some(link) = link {
            header.as_old_mut().linkname[..link.len()].copy_from_slice(link.as_bytes());
        }
        header.set_size(size);
        header.set_mode(0o644);
        header.set_entry_type(kind);
        header.set_cksum();
        header
    }

    fn crafted(path: &Path, members: &[Member]) {
        let file = File::create(path).unwrap();
        let mut b = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        for member in members {
            match *member {
                Member::File(name, data) => {
                    let header = raw_header(name, tar::EntryType::Regular, data.len() as u64, None);
                    b.append(&header, data).unwrap();
                }
                Member::HardLink(name, target) => {
                    let header = raw_header(name, tar::EntryType::Link, 0, Some(target));
                    b.append(&header, std::io::empty()).unwrap();
                }
                Member::Symlink(name, target) => {
                    let header = raw_header(name, tar::EntryType::Symlink, 0, Some(target));
                    b.append(&header, std::io::empty()).unwrap();
                }
            }
        }
        b.into_inner().unwrap().finish().unwrap();
    }

    fn assert_traversal(archive: &Path, dest: &Path, expected: &str) {
        match extract(archive, dest).unwrap_err() {
            FoamError::PathTraversal { member, .. } => assert_eq!(member, expected),
            other => panic!("expected traversal, got {:?}", other),
        }
        assert_eq!(fs::read_dir(dest).unwrap().count(), 0);
    }

    #[test]
    fn traversal_rejected_before_anything_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("bad.gz");
        crafted(
            &archive,
            &[Member::File("case/ok.txt", b"fine"), Member::File("../../evil", b"pwned")],
        );

        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        assert_traversal(&archive, &dest, "../../evil");
        assert!(!dir.path().join("evil").exists());
    }

    #[test]
    fn hard_link_resolves_from_archive_root() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("link.gz");
        // From a/b/c this would stay inside; from the root it climbs out.
        crafted(
            &archive,
            &[Member::File("a/b/c/ok.txt", b"fine"), Member::HardLink("a/b/c/l", "../../secret")],
        );

        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        assert_traversal(&archive, &dest, "a/b/c/l");
    }

    #[test]
    fn escaping_symlink_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("sym.gz");
        crafted(
            &archive,
            &[Member::File("a/ok.txt", b"fine"), Member::Symlink("a/l", "../../secret")],
        );

        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        assert_traversal(&archive, &dest, "a/l");
    }

    #[test]
    fn hard_link_inside_archive_is_unpacked() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("ok.gz");
        crafted(
            &archive,
            &[Member::File("a/b/c/ok.txt", b"fine"), Member::HardLink("a/b/c/l", "a/b/c/ok.txt")],
        );

        let dest = dir.path().join("dest");
        extract(&archive, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a/b/c/l")).unwrap(), "fine");
    }

    #[test]
    fn absolute_member_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("abs.gz");
        crafted(&archive, &[Member::File("/tmp/evil", b"x")]);
        let err = extract(&archive, &dir.path().join("dest")).unwrap_err();
        assert!(matches!(err, FoamError::PathTraversal { .. }));
    }

    #[test]
    fn allow_list_limits_packed_entries() {
        let dir = tempfile::tempdir().unwrap();
        let time = dir.path().join("0.5");
        fs::create_dir_all(time.join("uniform")).unwrap();
        fs::write(time.join("U"), "u").unwrap();
        fs::write(time.join("p"), "p").unwrap();
        fs::write(time.join("vorticity"), "w").unwrap();
        fs::write(time.join("uniform/time"), "t").unwrap();

        let allow: Vec<String> = ["U", "p", "k", "uniform"].iter().map(|s| s.to_string()).collect();
        let gz = compress_dir(&time, Some(&allow)).unwrap();
        assert_eq!(gz, dir.path().join("0.5.gz"));

        let dest = dir.path().join("restored");
        extract(&gz, &dest).unwrap();
        assert_eq!(fs::read_to_string(dest.join("0.5/U")).unwrap(), "u");
        assert_eq!(fs::read_to_string(dest.join("0.5/uniform/time")).unwrap(), "t");
        assert!(!dest.join("0.5/vorticity").exists());
        assert!(!dest.join("0.5/k").exists());
    }
}
