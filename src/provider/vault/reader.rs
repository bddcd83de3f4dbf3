//! # KV Reader
//!
//! Reads one item from a KV secrets engine mount, handling both engine versions:
//!
//! - version 1: `GET {mount}/{item}`, fields are the response `data`
//! - version 2: `GET {mount}/data/{item}`, fields are the nested `data.data`
//! - auto: probe the version 1 path first; a versioned-engine warning in the
//!   response switches to the version 2 read
//!
//! Only the warning switches versions. Transport and permission errors are
//! reported as they are.

use serde_json::{Map, Value};
use tracing::debug;

use crate::constants::KV_VERSIONED_WARNING;
use crate::provider::vault::errors::VaultError;
use crate::provider::VaultTransport;

/// Fields of one KV item
pub type FieldMap = Map<String, Value>;

/// KV engine version requested by a secret entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KvVersion {
    Auto,
    V1,
    V2,
}

impl TryFrom<i64> for KvVersion {
    type Error = VaultError;

    fn try_from(version: i64) -> Result<Self, Self::Error> {
        match version {
            0 => Ok(Self::Auto),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            other => Err(VaultError::UnknownVersion(other)),
        }
    }
}

/// Outcome of probing a version 1 path
#[derive(Debug)]
pub enum KvProbe {
    Success(FieldMap),
    /// The mount is a version 2 engine
    NeedsOtherVersion { warning: String },
    Failure(VaultError),
}

/// Version aware reader over an authenticated transport
#[derive(Debug)]
pub struct KvReader<'a, T> {
    transport: &'a T,
}

impl<'a, T: VaultTransport> KvReader<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self { transport }
    }

    /// Read the fields of `item` under `mount`
    pub async fn read(
        &self,
        mount: &str,
        item: &str,
        version: KvVersion,
    ) -> Result<FieldMap, VaultError> {
        match version {
            KvVersion::V2 => self.read_v2(mount, item).await,
            KvVersion::V1 => match self.probe_v1(mount, item).await {
                KvProbe::Success(fields) => Ok(fields),
                KvProbe::NeedsOtherVersion { warning } => Err(VaultError::VersionMismatch {
                    path: join_path(&[mount, item]),
                    warning,
                }),
                KvProbe::Failure(err) => Err(err),
            },
            KvVersion::Auto => match self.probe_v1(mount, item).await {
                KvProbe::Success(fields) => Ok(fields),
                KvProbe::NeedsOtherVersion { .. } => {
                    debug!(kv_path = mount, path = item, "vault.kv.detected_version_2");
                    self.read_v2(mount, item).await
                }
                KvProbe::Failure(err) => Err(err),
            },
        }
    }

    /// Read the version 1 path and classify the answer
    pub async fn probe_v1(&self, mount: &str, item: &str) -> KvProbe {
        let path = join_path(&[mount, item]);
        let response = match self.transport.read(&path).await {
            Ok(Some(response)) => response,
            Ok(None) => return KvProbe::Failure(VaultError::PathNotFound(path)),
            Err(err) => return KvProbe::Failure(err),
        };

        if let Some(warning) = response.warning_containing(KV_VERSIONED_WARNING) {
            return KvProbe::NeedsOtherVersion {
                warning: warning.to_string(),
            };
        }

        match response.data {
            Some(fields) => KvProbe::Success(fields),
            None => KvProbe::Failure(VaultError::PathNotFound(path)),
        }
    }

    async fn read_v2(&self, mount: &str, item: &str) -> Result<FieldMap, VaultError> {
        let path = join_path(&[mount, "data", item]);
        let mut data = self
            .transport
            .read(&path)
            .await?
            .and_then(|response| response.data)
            .ok_or_else(|| VaultError::PathNotFound(path.clone()))?;

        // Deleted or destroyed versions keep their metadata but have null data
        match data.remove("data") {
            Some(Value::Object(fields)) => Ok(fields),
            Some(Value::Null) | None => Err(VaultError::PathNotFound(path)),
            Some(other) => Err(VaultError::UnexpectedShape {
                path,
                reason: format!("expected an object under data, got {other}"),
            }),
        }
    }
}

/// Join path segments with single slashes, skipping empty segments
pub fn join_path(segments: &[&str]) -> String {
    segments
        .iter()
        .flat_map(|segment| segment.split('/'))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
