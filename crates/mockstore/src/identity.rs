//! # Resource Addressing
//!
//! Every stored record is addressed by a [`ResourceIdentity`]: a `(collection, name)`
//! pair derived from a request path.
//!
//! ## Shape
//!
//! ```text
//! /users/jdoe/orders/1234
//! └─────────┬───────┘└─┬─┘
//!       collection    name
//! ```
//!
//! - `collection` is either `""` (the root) or starts with `/` and never ends with `/`.
//! - `name` always starts with `/`. It may end with `/`, which marks the resource as
//!   collection-like (`/users/jdoe/`). It never contains a slash in between.
//!
//! When only a full path is given, it is split at the last `/` that is not the final
//! character. So `/users/jdoe/` splits into `/users` + `/jdoe/`.
//!
//! ## Comparison
//!
//! Identities are compared through [`MatchOptions`], which mirror the host router's
//! routing settings:
//!
//! | Option           | `false` (default)                  | `true`                       |
//! |------------------|------------------------------------|------------------------------|
//! | `case_sensitive` | paths are lower-cased before compare | paths compared as-is       |
//! | `strict`         | one trailing slash is ignored      | trailing slash must match    |
//!
//! Collection membership uses the same rules applied to the `collection` segment only.

use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Case-sensitivity and trailing-slash strictness used for every identity comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOptions {
    pub case_sensitive: bool,
    pub strict: bool,
}

impl MatchOptions {
    pub fn new(case_sensitive: bool, strict: bool) -> Self {
        Self {
            case_sensitive,
            strict,
        }
    }

    /// Reduce a path to the form used for comparisons.
    pub fn normalize<'a>(&self, path: &'a str) -> Cow<'a, str> {
        let mut path = Cow::Borrowed(path);
        if !self.case_sensitive {
            path = Cow::Owned(path.to_lowercase());
        }
        if !self.strict && path.ends_with('/') {
            let trimmed = &path[..path.len() - 1];
            path = Cow::Owned(trimmed.to_string());
        }
        path
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    collection: String,
    name: String,
}

impl Default for ResourceIdentity {
    /// The root resource: empty collection, name `/`.
    fn default() -> Self {
        Self {
            collection: String::new(),
            name: "/".to_string(),
        }
    }
}

impl ResourceIdentity {
    /// Split a full path into collection and name. Never fails: a split name can't
    /// carry an embedded slash.
    pub fn from_path(path: impl fmt::Display) -> Self {
        let path = path.to_string();

        // Ignore the final character so a trailing slash stays with the name
        let head = match path.char_indices().last() {
            Some((idx, _)) => &path[..idx],
            None => "",
        };

        match head.rfind('/') {
            None => Self {
                collection: String::new(),
                name: tidy_name(&path),
            },
            Some(idx) => Self {
                collection: normalize_collection(&path[..idx]),
                name: tidy_name(&path[idx..]),
            },
        }
    }

    /// Build an identity from explicit parts.
    ///
    /// Fails with [`StoreError::InvalidArgument`] if `name` has a slash anywhere but
    /// its start or end.
    pub fn new(collection: impl fmt::Display, name: impl fmt::Display) -> Result<Self> {
        let name = tidy_name(&name.to_string());
        let inner = name.strip_prefix('/').unwrap_or(&name);
        let inner = inner.strip_suffix('/').unwrap_or(inner);
        if inner.contains('/') {
            return Err(StoreError::InvalidArgument(format!(
                "Resource names cannot contain slashes: {}",
                name
            )));
        }

        Ok(Self {
            collection: normalize_collection(collection),
            name,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `collection + name`
    pub fn path(&self) -> String {
        format!("{}{}", self.collection, self.name)
    }

    /// True when the name carries a trailing slash (`/users/jdoe/`).
    pub fn is_collection_like(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Normalized full path, as compared by [`ResourceIdentity::matches`].
    pub fn key(&self, options: MatchOptions) -> String {
        options.normalize(&self.path()).into_owned()
    }

    /// Normalized collection segment, as compared by [`ResourceIdentity::same_collection`].
    pub fn collection_key(&self, options: MatchOptions) -> String {
        options.normalize(&self.collection).into_owned()
    }

    pub fn matches(&self, other: &ResourceIdentity, options: MatchOptions) -> bool {
        self.key(options) == other.key(options)
    }

    pub fn same_collection(&self, other: &ResourceIdentity, options: MatchOptions) -> bool {
        self.collection_key(options) == other.collection_key(options)
    }

    /// Collection membership test against a raw collection path.
    pub fn in_collection(&self, collection: &str, options: MatchOptions) -> bool {
        let collection = normalize_collection(collection);
        self.collection_key(options) == options.normalize(&collection)
    }

    /// Same name, moved under `collection`.
    pub(crate) fn with_collection(&self, collection: &str) -> Self {
        Self {
            collection: normalize_collection(collection),
            name: self.name.clone(),
        }
    }
}

impl fmt::Display for ResourceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.collection, self.name)
    }
}

impl From<&str> for ResourceIdentity {
    fn from(path: &str) -> Self {
        Self::from_path(path)
    }
}

impl From<String> for ResourceIdentity {
    fn from(path: String) -> Self {
        Self::from_path(path)
    }
}

/// Canonical form of a collection path: `""` for the root, otherwise a leading
/// slash and no trailing slash.
pub fn normalize_collection(collection: impl fmt::Display) -> String {
    let collection = collection.to_string();
    let trimmed = collection.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn tidy_name(name: &str) -> String {
    if name.is_empty() {
        return "/".to_string();
    }
    if name.starts_with('/') {
        name.to_string()
    } else {
        format!("/{}", name)
    }
}
