//! Core data types for `ProxDB`.
//!
//! This module defines object identifiers, the values that can be stored in
//! relations, and the type descriptors used to match values to relations.

mod id;
mod metadata;
mod value;
mod vector;

pub use id::DbId;
pub use metadata::{ClassLabel, ExternalId, ObjectMetadata};
pub use value::{TypeInformation, Value, ValueKind};
pub use vector::NumberVector;
