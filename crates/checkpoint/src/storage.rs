//! Off-chain collaborators: the stores validators publish signed checkpoints
//! to, and a factory resolving an announced storage location into a handle
//! that can be queried.

use std::{
    fmt,
    io,
    path::PathBuf,
    str::FromStr,
};

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::StatusCode;
use tracing::*;

use crate::errors::{StorageError, StorageLocationError};

/// Object holding the index of the most recent checkpoint a validator signed.
pub const LATEST_INDEX_KEY: &str = "checkpoint_latest_index.json";

const S3_SCHEME: &str = "s3://";
const GCS_SCHEME: &str = "gs://";
const FILE_SCHEME: &str = "file://";

/// A parsed validator storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    /// `s3://<bucket>/<region>[/<folder>]`
    S3 {
        bucket: String,
        region: String,
        folder: Option<String>,
    },

    /// `gs://<bucket>[/<folder>]`
    Gcs {
        bucket: String,
        folder: Option<String>,
    },

    /// `file://<path>`
    Local { path: PathBuf },
}

impl StorageLocation {
    /// Returns the URL an object with the given key is served at.
    pub fn object_url(&self, key: &str) -> String {
        match self {
            StorageLocation::S3 {
                bucket,
                region,
                folder,
            } => format!(
                "https://{bucket}.s3.{region}.amazonaws.com/{}{key}",
                folder_prefix(folder)
            ),
            StorageLocation::Gcs { bucket, folder } => format!(
                "https://storage.googleapis.com/{bucket}/{}{key}",
                folder_prefix(folder)
            ),
            StorageLocation::Local { path } => format!("{FILE_SCHEME}{}", path.join(key).display()),
        }
    }

    /// Returns the URL an object is served at by a path-style endpoint, such
    /// as an S3-compatible gateway: `<endpoint>/<bucket>/[<folder>/]<key>`.
    /// Local locations ignore the endpoint.
    pub fn path_style_url(&self, endpoint: &str, key: &str) -> String {
        let endpoint = endpoint.trim_end_matches('/');
        match self {
            StorageLocation::S3 { bucket, folder, .. } | StorageLocation::Gcs { bucket, folder } => {
                format!("{endpoint}/{bucket}/{}{key}", folder_prefix(folder))
            }
            StorageLocation::Local { .. } => self.object_url(key),
        }
    }
}

fn folder_prefix(folder: &Option<String>) -> String {
    folder
        .as_ref()
        .map(|f| format!("{f}/"))
        .unwrap_or_default()
}

fn non_empty(part: Option<&str>) -> Option<String> {
    part.map(|p| p.trim_matches('/'))
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
}

impl FromStr for StorageLocation {
    type Err = StorageLocationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        if let Some(rest) = s.strip_prefix(S3_SCHEME) {
            let mut parts = rest.splitn(3, '/');
            let bucket = non_empty(parts.next())
                .ok_or_else(|| StorageLocationError::MissingBucket(s.to_owned()))?;
            let region = non_empty(parts.next())
                .ok_or_else(|| StorageLocationError::MissingRegion(s.to_owned()))?;
            let folder = non_empty(parts.next());
            return Ok(StorageLocation::S3 {
                bucket,
                region,
                folder,
            });
        }

        if let Some(rest) = s.strip_prefix(GCS_SCHEME) {
            let mut parts = rest.splitn(2, '/');
            let bucket = non_empty(parts.next())
                .ok_or_else(|| StorageLocationError::MissingBucket(s.to_owned()))?;
            let folder = non_empty(parts.next());
            return Ok(StorageLocation::Gcs { bucket, folder });
        }

        if let Some(path) = s.strip_prefix(FILE_SCHEME) {
            if path.is_empty() {
                return Err(StorageLocationError::MissingPath(s.to_owned()));
            }
            return Ok(StorageLocation::Local {
                path: PathBuf::from(path),
            });
        }

        Err(StorageLocationError::UnsupportedScheme(s.to_owned()))
    }
}

impl fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageLocation::S3 {
                bucket,
                region,
                folder,
            } => {
                write!(f, "{S3_SCHEME}{bucket}/{region}")?;
                if let Some(folder) = folder {
                    write!(f, "/{folder}")?;
                }
                Ok(())
            }
            StorageLocation::Gcs { bucket, folder } => {
                write!(f, "{GCS_SCHEME}{bucket}")?;
                if let Some(folder) = folder {
                    write!(f, "/{folder}")?;
                }
                Ok(())
            }
            StorageLocation::Local { path } => write!(f, "{FILE_SCHEME}{}", path.display()),
        }
    }
}

/// Read access to the checkpoints one validator publishes.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CheckpointValidator: Send + Sync {
    /// Fetches the index of the latest checkpoint the validator signed.
    async fn latest_checkpoint_index(&self) -> Result<u32, StorageError>;

    /// URL of the object [`Self::latest_checkpoint_index`] reads.
    fn latest_checkpoint_url(&self) -> String;
}

/// Resolves storage locations into validator handles.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ValidatorFactory: Send + Sync {
    /// Builds a handle for the location. Fails if the location is malformed
    /// or unreachable.
    async fn from_storage_location(
        &self,
        location: &str,
    ) -> Result<Box<dyn CheckpointValidator>, StorageError>;
}

/// Validator whose checkpoints are served over HTTP from an S3 or GCS bucket.
#[derive(Debug, Clone)]
pub struct HttpValidator {
    url: String,
    client: reqwest::Client,
}

impl HttpValidator {
    fn new(url: String, client: reqwest::Client) -> Self {
        Self { url, client }
    }

    /// Makes one request for the latest index object. Transport failures and
    /// 403 mean the bucket cannot be read. Any other answer, including 404
    /// before the first checkpoint is published, means it can.
    async fn check_reachable(&self) -> Result<(), StorageError> {
        match self.client.get(&self.url).send().await {
            Ok(resp) if resp.status() == StatusCode::FORBIDDEN => {
                debug!(url = %self.url, "checkpoint store denied access");
                Err(StorageError::Unreachable(self.url.clone()))
            }
            Ok(_) => Ok(()),
            Err(err) => {
                debug!(url = %self.url, %err, "checkpoint store not reachable");
                Err(StorageError::Unreachable(self.url.clone()))
            }
        }
    }
}

#[async_trait]
impl CheckpointValidator for HttpValidator {
    async fn latest_checkpoint_index(&self) -> Result<u32, StorageError> {
        let url = self.url.clone();
        let resp = self.client.get(&url).send().await?;

        match resp.status() {
            StatusCode::NOT_FOUND => return Err(StorageError::NoCheckpoint(url)),
            status if !status.is_success() => {
                return Err(StorageError::Status {
                    status: status.as_u16(),
                    url,
                })
            }
            _ => {}
        }

        let body = resp.bytes().await?;
        let index = serde_json::from_slice(&body)?;
        trace!(%url, %index, "fetched latest validator checkpoint index");
        Ok(index)
    }

    fn latest_checkpoint_url(&self) -> String {
        self.url.clone()
    }
}

/// Validator whose checkpoints are written to a local directory.
#[derive(Debug, Clone)]
pub struct LocalValidator {
    dir: PathBuf,
}

impl LocalValidator {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl CheckpointValidator for LocalValidator {
    async fn latest_checkpoint_index(&self) -> Result<u32, StorageError> {
        let path = self.dir.join(LATEST_INDEX_KEY);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StorageError::NoCheckpoint(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(serde_json::from_slice(&body)?)
    }

    fn latest_checkpoint_url(&self) -> String {
        format!("{FILE_SCHEME}{}", self.dir.join(LATEST_INDEX_KEY).display())
    }
}

/// Factory for the storage backends validators announce.
#[derive(Debug, Clone, Default)]
pub struct StorageValidatorFactory {
    client: reqwest::Client,
    endpoint: Option<String>,
}

impl StorageValidatorFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given client for every HTTP-backed validator built.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Reads S3 and GCS buckets through a path-style endpoint instead of the
    /// providers' public hosts.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    fn http_validator(&self, location: &StorageLocation) -> HttpValidator {
        let url = match &self.endpoint {
            Some(endpoint) => location.path_style_url(endpoint, LATEST_INDEX_KEY),
            None => location.object_url(LATEST_INDEX_KEY),
        };
        HttpValidator::new(url, self.client.clone())
    }
}

#[async_trait]
impl ValidatorFactory for StorageValidatorFactory {
    async fn from_storage_location(
        &self,
        location: &str,
    ) -> Result<Box<dyn CheckpointValidator>, StorageError> {
        let location: StorageLocation = location.parse()?;

        match location {
            StorageLocation::Local { path } => {
                let is_dir = tokio::fs::metadata(&path)
                    .await
                    .map(|m| m.is_dir())
                    .unwrap_or(false);
                if !is_dir {
                    return Err(StorageError::Unreachable(path.display().to_string()));
                }
                Ok(Box::new(LocalValidator::new(path)))
            }
            remote => {
                let validator = self.http_validator(&remote);
                validator.check_reachable().await?;
                Ok(Box::new(validator))
            }
        }
    }
}
