//! Shared foundational types used across the hdrdep workspace.
//!
//! This crate provides content hashing (file fingerprints and composite
//! digests) and the internal error type.

#![warn(missing_docs)]

pub mod hash;
pub mod result;

pub use hash::{ContentHash, ContentHasher};
pub use result::InternalError;
