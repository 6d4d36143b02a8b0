//! Figshare API v2 store: the files of one article.
//!
//! Uploads follow the v2 multipart flow: register the file on the article,
//! ask the upload service for its parts, PUT each byte range, then mark the
//! file complete. Without a token only public article data can be read.

use crate::error::{FoamError, FoamResult};
use crate::transfer::{RemoteEntry, RemoteStore, checked};

use reqwest::blocking::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

const API: &str = "https://api.figshare.com/v2";
const DOWNLOADER: &str = "https://ndownloader.figshare.com/files";

#[derive(Debug, Deserialize)]
struct Article {
    files: Vec<ArticleFile>,
}

#[derive(Debug, Clone, Deserialize)]
struct ArticleFile {
    id: u64,
    name: String,
    #[serde(default)]
    size: u64,
}

#[derive(Debug, Deserialize)]
struct Location {
    location: String,
}

#[derive(Debug, Deserialize)]
struct FileInfo {
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct UploadParts {
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct Part {
    #[serde(rename = "partNo")]
    part_no: u64,
    #[serde(rename = "startOffset")]
    start: u64,
    #[serde(rename = "endOffset")]
    end: u64,
}

impl Part {
    /// Offsets are inclusive.
    fn len(&self) -> FoamResult<u64> {
        self.end
            .checked_sub(self.start)
            .map(|span| span + 1)
            .ok_or_else(|| {
                FoamError::TransferFailure(format!(
                    "part {} ends at {} before it starts at {}",
                    self.part_no, self.end, self.start
                ))
            })
    }
}

#[derive(Debug)]
pub struct FigshareStore {
    client: Client,
    token: Option<String>,
    article: String,
    publish: bool,
}

impl FigshareStore {
    pub fn new(article: &str, token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            token,
            article: article.to_string(),
            publish: false,
        }
    }

    /// Publish the article after every successful upload.
    pub fn publish_after_upload(mut self, publish: bool) -> Self {
        self.publish = publish;
        self
    }

    fn authed(&self, rb: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(t) => rb.header("Authorization", format!("token {}", t)),
            None => rb,
        }
    }

    fn token(&self) -> FoamResult<&str> {
        self.token.as_deref().ok_or_else(|| {
            FoamError::TransferFailure("figshare upload needs a personal token".to_string())
        })
    }

    fn article_files(&self) -> FoamResult<Vec<ArticleFile>> {
        let url = if self.token.is_some() {
            format!("{}/account/articles/{}", API, self.article)
        } else {
            format!("{}/articles/{}", API, self.article)
        };
        let resp = self.authed(self.client.get(url)).send()?;
        let article: Article = checked(resp, "article details")?.json()?;
        Ok(article.files)
    }

    fn publish(&self) -> FoamResult<()> {
        let url = format!("{}/account/articles/{}/publish", API, self.article);
        checked(self.authed(self.client.post(url)).send()?, "publish")?;
        tracing::info!(article = %self.article, "article published");
        Ok(())
    }
}

/// File id from the `location` URL returned when a file is registered.
fn file_id(location: &str) -> FoamResult<&str> {
    location
        .rsplit_once('/')
        .map(|(_, id)| id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| {
            FoamError::TransferFailure(format!("unexpected file location {:?}", location))
        })
}

impl RemoteStore for FigshareStore {
    fn list(&self) -> FoamResult<Vec<RemoteEntry>> {
        Ok(self
            .article_files()?
            .into_iter()
            .map(|f| RemoteEntry {
                name: f.name,
                size: f.size,
            })
            .collect())
    }

    fn fetch(&self, name: &str, dest: &Path) -> FoamResult<()> {
        let files = self.article_files()?;
        let file = files.iter().find(|f| f.name == name).ok_or_else(|| {
            FoamError::TransferFailure(format!("{} is not in article {}", name, self.article))
        })?;
        let resp = self.client.get(format!("{}/{}", DOWNLOADER, file.id)).send()?;
        let mut resp = checked(resp, "download")?;
        let mut out = File::create(dest)?;
        resp.copy_to(&mut out)?;
        Ok(())
    }

    fn store(&self, local: &Path, name: &str) -> FoamResult<()> {
        self.token()?;
        let size = fs::metadata(local)?.len();

        let files_url = format!("{}/account/articles/{}/files", API, self.article);
        let resp = self
            .authed(self.client.post(&files_url))
            .json(&json!({ "name": name, "size": size }))
            .send()?;
        let loc: Location = checked(resp, "register file")?.json()?;
        let file_url = format!("{}/{}", files_url, file_id(&loc.location)?);

        let resp = self.authed(self.client.get(&file_url)).send()?;
        let info: FileInfo = checked(resp, "file info")?.json()?;
        let resp = self.client.get(&info.upload_url).send()?;
        let parts: UploadParts = checked(resp, "upload parts")?.json()?;

        let mut file = File::open(local)?;
        for part in &parts.parts {
            let mut buf = vec![0u8; part.len()? as usize];
            file.seek(SeekFrom::Start(part.start))?;
            file.read_exact(&mut buf)?;
            let url = format!("{}/{}", info.upload_url, part.part_no);
            checked(self.client.put(url).body(buf).send()?, "upload part")?;
            tracing::debug!(name, part = part.part_no, "part uploaded");
        }

        checked(self.authed(self.client.post(&file_url)).send()?, "complete upload")?;
        if self.publish {
            self.publish()?;
        }
        Ok(())
    }
}
