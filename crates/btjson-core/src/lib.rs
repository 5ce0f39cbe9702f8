//! Core types for the BtJson engine.
//!
//! This crate provides the foundational types used across all other btjson crates:
//! - The node model for BtJson trees (records, lists, primitives, absent)
//! - Canonical selector keys used to look up rewrite rules
//! - Markup escaping helpers
//! - Error types

pub mod errors;
pub mod escape;
pub mod node;
pub mod selector;

pub use errors::*;
pub use escape::{escape_attr, escape_text};
pub use node::*;
pub use selector::{SelectorKey, VariantSelector};
