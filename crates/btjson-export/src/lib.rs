//! Serialization of expanded BtJson trees.

pub mod html;

pub use btjson_core::{escape_attr, escape_text};
pub use html::render;
