//! `ProxDB` Core
//!
//! This crate provides the storage primitives every other `ProxDB` crate is
//! built on: object identifiers and their allocation, typed values, transfer
//! bundles, and per-attribute relations.
//!
//! # Modules
//!
//! - [`types`] - Identifiers, values, type descriptors and feature vectors
//! - [`registry`] - Identifier allocation and reclamation
//! - [`bundle`] - Column-oriented transfer containers for insertion
//! - [`relation`] - Per-attribute column stores keyed by identifier
//! - [`error`] - Error types

#![deny(clippy::unwrap_used)]

pub mod bundle;
pub mod error;
pub mod registry;
pub mod relation;
pub mod types;

pub use bundle::{BundleMeta, ObjectBundle, SingleObjectBundle};
pub use error::CoreError;
pub use registry::IdRegistry;
pub use relation::{relation_for, AnyRelation, Relation, RelationValue};
pub use types::{
    ClassLabel, DbId, ExternalId, NumberVector, ObjectMetadata, TypeInformation, Value, ValueKind,
};
