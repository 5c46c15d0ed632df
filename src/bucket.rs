//! Bucket metadata as returned by the Cloud Storage JSON API.
//!
//! Every field defaults when absent or `null`, so any JSON object decodes, and a
//! `null` body is the zero value. Nothing here is interpreted by the sync
//! pipeline beyond logging: a successful decode is the existence check.

use std::io;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Decodes the first JSON value in `body`. `null` yields the zero value; any
/// other non-object value is an error. Bytes after the first value are ignored.
pub fn decode_metadata(body: &[u8]) -> Result<BucketMetadata, serde_json::Error> {
    let first = serde_json::Deserializer::from_slice(body)
        .into_iter::<Option<Map<String, Value>>>()
        .next();
    match first {
        None => Err(serde_json::Error::io(io::Error::from(
            io::ErrorKind::UnexpectedEof,
        ))),
        Some(Err(e)) => Err(e),
        Some(Ok(None)) => Ok(BucketMetadata::default()),
        Some(Ok(Some(object))) => serde_json::from_value(Value::Object(object)),
    }
}

/// A `null` field decodes like a missing one.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Read-only snapshot of a bucket's attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BucketMetadata {
    #[serde(deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(deserialize_with = "null_as_default")]
    pub self_link: String,
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub project_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub metageneration: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location: String,
    #[serde(deserialize_with = "null_as_default")]
    pub location_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub storage_class: String,
    #[serde(deserialize_with = "null_as_default")]
    pub etag: String,
    /// RFC 3339 timestamp, kept verbatim.
    #[serde(deserialize_with = "null_as_default")]
    pub time_created: String,
    #[serde(deserialize_with = "null_as_default", rename = "updated")]
    pub update_time: String,
    #[serde(deserialize_with = "null_as_default")]
    pub iam_configuration: IamConfiguration,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub rpo: String,
    #[serde(deserialize_with = "null_as_default")]
    pub default_event_based_hold: bool,
    #[serde(deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub cors: Vec<CorsRule>,
    #[serde(deserialize_with = "null_as_default")]
    pub lifecycle: Lifecycle,
    #[serde(deserialize_with = "null_as_default", rename = "satisfiesPZS")]
    pub satisfies_pzs: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub versioning: Versioning,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IamConfiguration {
    #[serde(deserialize_with = "null_as_default")]
    pub bucket_policy_only: Toggle,
    #[serde(deserialize_with = "null_as_default")]
    pub uniform_bucket_level_access: Toggle,
    #[serde(deserialize_with = "null_as_default")]
    pub public_access_prevention: String,
}

/// `{"enabled": bool}` blocks used by several bucket settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Toggle {
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CorsRule {
    #[serde(deserialize_with = "null_as_default")]
    pub origin: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub method: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub response_header: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub max_age_seconds: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Lifecycle {
    #[serde(deserialize_with = "null_as_default")]
    pub rule: Vec<LifecycleRule>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleRule {
    #[serde(deserialize_with = "null_as_default")]
    pub action: LifecycleAction,
    #[serde(deserialize_with = "null_as_default")]
    pub condition: LifecycleCondition,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleAction {
    #[serde(deserialize_with = "null_as_default", rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleCondition {
    #[serde(deserialize_with = "null_as_default")]
    pub age: i64,
}

pub type Versioning = Toggle;
