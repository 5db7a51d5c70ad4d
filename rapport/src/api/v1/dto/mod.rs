//! v1 API Data Transfer Objects.
//!
//! Wire types for the v1 REST API, kept apart from the domain models in
//! `src/models/`.

pub mod common;
pub mod relationships;

pub use common::*;
pub use relationships::*;
