//! # Resources and the Merge Policy
//!
//! A [`Resource`] is one addressable record: an identity, an opaque JSON payload, and
//! the two timestamps the store maintains.
//!
//! ## Timestamps
//!
//! Resources built by callers carry no timestamps. `created_on` and `modified_on` are
//! stamped by the store when the resource is saved; [`Resource::merge`] only refreshes
//! `modified_on`.
//!
//! ## Merge Policy
//!
//! One rule is used everywhere data meets existing data (explicit merges and saves
//! over an existing record):
//!
//! - **Deep merge** when both values are objects, or both are arrays. Incoming keys
//!   overwrite recursively; keys only present in the current value survive. Arrays
//!   merge index by index, so a shorter incoming array leaves the tail intact.
//! - **Replace** in every other case (kind mismatch, scalars, `null`).
//!
//! ## On-Disk Shape
//!
//! ```json
//! {
//!   "collection": "/users",
//!   "name": "/jdoe",
//!   "data": { "name": "J" },
//!   "createdOn": "2024-01-01T10:00:00.000Z",
//!   "modifiedOn": "2024-01-01T10:00:00.000Z"
//! }
//! ```
//!
//! Deserialization re-validates the identity, so malformed records are rejected.

use crate::error::{Result, StoreError};
use crate::identity::ResourceIdentity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ResourceRecord", try_from = "ResourceRecord")]
pub struct Resource {
    identity: ResourceIdentity,
    pub data: Value,
    pub(crate) created_on: Option<DateTime<Utc>>,
    pub(crate) modified_on: Option<DateTime<Utc>>,
}

/// Flat wire form of a [`Resource`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRecord {
    collection: String,
    name: String,
    #[serde(default)]
    data: Value,
    #[serde(default)]
    created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    modified_on: Option<DateTime<Utc>>,
}

impl From<Resource> for ResourceRecord {
    fn from(resource: Resource) -> Self {
        Self {
            collection: resource.identity.collection().to_string(),
            name: resource.identity.name().to_string(),
            data: resource.data,
            created_on: resource.created_on,
            modified_on: resource.modified_on,
        }
    }
}

impl TryFrom<ResourceRecord> for Resource {
    type Error = StoreError;

    fn try_from(record: ResourceRecord) -> Result<Self> {
        Ok(Self {
            identity: ResourceIdentity::new(record.collection, record.name)?,
            data: record.data,
            created_on: record.created_on,
            modified_on: record.modified_on,
        })
    }
}

/// Result of [`Resource::parse`], shaped like its input.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Parsed {
    Many(Vec<Resource>),
    One(Resource),
}

impl Default for Resource {
    fn default() -> Self {
        Self::from_identity(ResourceIdentity::default(), Value::Null)
    }
}

impl Resource {
    /// A resource at `path` with no data.
    pub fn new(path: impl fmt::Display) -> Self {
        Self::with_data(path, Value::Null)
    }

    pub fn with_data(path: impl fmt::Display, data: impl Into<Value>) -> Self {
        Self::from_identity(ResourceIdentity::from_path(path), data.into())
    }

    /// A resource from explicit `collection` and `name` parts.
    pub fn in_collection(
        collection: impl fmt::Display,
        name: impl fmt::Display,
        data: impl Into<Value>,
    ) -> Result<Self> {
        Ok(Self::from_identity(
            ResourceIdentity::new(collection, name)?,
            data.into(),
        ))
    }

    pub fn from_identity(identity: ResourceIdentity, data: Value) -> Self {
        Self {
            identity,
            data,
            created_on: None,
            modified_on: None,
        }
    }

    pub fn identity(&self) -> &ResourceIdentity {
        &self.identity
    }

    pub fn collection(&self) -> &str {
        self.identity.collection()
    }

    pub fn name(&self) -> &str {
        self.identity.name()
    }

    pub fn created_on(&self) -> Option<DateTime<Utc>> {
        self.created_on
    }

    pub fn modified_on(&self) -> Option<DateTime<Utc>> {
        self.modified_on
    }

    pub(crate) fn set_identity(&mut self, identity: ResourceIdentity) {
        self.identity = identity;
    }

    /// Merge `incoming` into this resource's data and refresh `modified_on`.
    pub fn merge(&mut self, incoming: Value) {
        merge_value(&mut self.data, incoming);
        self.modified_on = Some(Utc::now());
    }

    /// Merge another resource's data; its identity and timestamps are ignored.
    pub fn merge_resource(&mut self, other: &Resource) {
        self.merge(other.data.clone());
    }

    /// Parse a JSON document holding one resource or an array of them.
    pub fn parse(json: &str) -> Result<Parsed> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a JSON array of resources.
    pub fn parse_list(json: &str) -> Result<Vec<Resource>> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.identity.fmt(f)
    }
}

/// Apply `incoming` onto `current` using the merge policy described above.
pub fn merge_value(current: &mut Value, incoming: Value) {
    match (current, incoming) {
        (Value::Object(current), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match current.get_mut(&key) {
                    Some(existing) if same_container(existing, &value) => {
                        merge_value(existing, value)
                    }
                    _ => {
                        current.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(current), Value::Array(incoming)) => {
            for (idx, value) in incoming.into_iter().enumerate() {
                match current.get_mut(idx) {
                    Some(existing) if same_container(existing, &value) => {
                        merge_value(existing, value)
                    }
                    Some(existing) => *existing = value,
                    None => current.push(value),
                }
            }
        }
        (current, incoming) => *current = incoming,
    }
}

fn same_container(a: &Value, b: &Value) -> bool {
    matches!(
        (a, b),
        (Value::Object(_), Value::Object(_)) | (Value::Array(_), Value::Array(_))
    )
}
