//! # Mockstore Architecture
//!
//! Mockstore is the persistence core of a REST API mocking server. The mock-serving
//! layer (routing, request parsing, response headers) lives elsewhere; it hands this
//! crate a path and a payload and gets back a resource or a list of resources.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Mock-serving layer (not in this crate)                     │
//! │  - Turns each request into one DataStore call               │
//! │  - Maps results onto status codes, headers and bodies       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (store/resource_store.rs)                           │
//! │  - save / get / delete, for one resource or a collection    │
//! │  - Identity matching, merging, timestamps                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Backends (store/)                                          │
//! │  - StorageBackend trait: open + commit                      │
//! │  - FsBackend (JSON files), MemBackend (process memory)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Addressing
//!
//! A request path such as `/users/jdoe` becomes a [`identity::ResourceIdentity`]
//! with collection `/users` and name `/jdoe`. A *collection* is not stored anywhere;
//! it is simply every resource whose collection segment matches.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mockstore::resource::Resource;
//! use mockstore::store::DataStore;
//! use mockstore::store::mem_backend::MemBackend;
//! use mockstore::store::resource_store::ResourceStore;
//! use serde_json::json;
//!
//! # async fn demo() -> mockstore::error::Result<()> {
//! let store = ResourceStore::with_backend(MemBackend::new());
//! store.save_resource(Resource::with_data("/users/jdoe", json!({"name": "J"}))).await?;
//! let users = store.get_collection("/users").await?;
//! assert_eq!(users.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`identity`]: Path splitting and comparison rules
//! - [`resource`]: The stored record and the merge policy
//! - [`store`]: Engine, backends and the serializing wrapper
//! - [`config`]: Configuration loading
//! - [`error`]: Error types

pub mod config;
pub mod error;
pub mod identity;
pub mod resource;
pub mod store;
