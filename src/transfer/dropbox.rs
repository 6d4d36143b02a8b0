//! Dropbox HTTP API v2 store rooted at one remote folder.

use crate::error::FoamResult;
use crate::transfer::{RemoteEntry, RemoteStore, checked};

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const API: &str = "https://api.dropboxapi.com/2";
const CONTENT: &str = "https://content.dropboxapi.com/2";

/// Upload session chunk size.
pub const CHUNK_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Deserialize)]
struct ListFolder {
    entries: Vec<ListEntry>,
    cursor: String,
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    #[serde(rename = ".tag")]
    tag: String,
    name: String,
    #[serde(default)]
    size: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SessionStart {
    session_id: String,
}

#[derive(Debug)]
pub struct DropboxStore {
    client: Client,
    token: String,
    root: String,
}

impl DropboxStore {
    /// `root` is the remote folder, e.g. `/OpenFOAM/solvedCases/<case>`.
    pub fn new(token: &str, root: &str) -> Self {
        Self {
            client: Client::new(),
            token: token.to_string(),
            root: root.trim_end_matches('/').to_string(),
        }
    }

    fn remote_path(&self, name: &str) -> String {
        format!("{}/{}", self.root, name)
    }

    fn rpc(&self, endpoint: &str, body: serde_json::Value) -> reqwest::Result<Response> {
        self.client
            .post(format!("{}/{}", API, endpoint))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
    }

    fn content(
        &self,
        endpoint: &str,
        arg: serde_json::Value,
        body: Vec<u8>,
    ) -> FoamResult<Response> {
        let resp = self
            .client
            .post(format!("{}/{}", CONTENT, endpoint))
            .bearer_auth(&self.token)
            .header("Dropbox-API-Arg", arg.to_string())
            .header("Content-Type", "application/octet-stream")
            .body(body)
            .send()?;
        checked(resp, endpoint)
    }
}

impl RemoteStore for DropboxStore {
    fn list(&self) -> FoamResult<Vec<RemoteEntry>> {
        let resp = self.rpc("files/list_folder", json!({ "path": self.root }))?;
        // A folder that does not exist yet holds nothing.
        if resp.status() == StatusCode::CONFLICT {
            tracing::debug!(root = %self.root, "remote folder not found; treating as empty");
            return Ok(Vec::new());
        }
        let mut page: ListFolder = checked(resp, "files/list_folder")?.json()?;

        let mut out = Vec::new();
        loop {
            out.extend(page.entries.into_iter().filter(|e| e.tag == "file").map(|e| RemoteEntry {
                name: e.name,
                size: e.size.unwrap_or(0),
            }));
            if !page.has_more {
                break;
            }
            let resp = self.rpc("files/list_folder/continue", json!({ "cursor": page.cursor }))?;
            page = checked(resp, "files/list_folder/continue")?.json()?;
        }
        Ok(out)
    }

    fn fetch(&self, name: &str, dest: &Path) -> FoamResult<()> {
        let mut resp = self.content(
            "files/download",
            json!({ "path": self.remote_path(name) }),
            Vec::new(),
        )?;
        let mut out = File::create(dest)?;
        resp.copy_to(&mut out)?;
        Ok(())
    }

    fn store(&self, local: &Path, name: &str) -> FoamResult<()> {
        let start: SessionStart = self
            .content("files/upload_session/start", json!({ "close": false }), Vec::new())?
            .json()?;

        let mut file = File::open(local)?;
        let mut offset: u64 = 0;
        let mut buf = vec![0u8; CHUNK_BYTES];
        loop {
            let n = read_chunk(&mut file, &mut buf)?;
            if n == 0 {
                break;
            }
            self.content(
                "files/upload_session/append_v2",
                json!({
                    "cursor": { "session_id": start.session_id, "offset": offset },
                    "close": false,
                }),
                buf[..n].to_vec(),
            )?;
            offset += n as u64;
            tracing::debug!(name, offset, "chunk uploaded");
        }

        self.content(
            "files/upload_session/finish",
            json!({
                "cursor": { "session_id": start.session_id, "offset": offset },
                "commit": { "path": self.remote_path(name), "mode": "overwrite" },
            }),
            Vec::new(),
        )?;
        Ok(())
    }
}

/// Fill `buf` as far as the reader allows; returns bytes read.
fn read_chunk(r: &mut impl Read, buf: &mut [u8]) -> FoamResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = r.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
