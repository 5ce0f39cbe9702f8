//! Localized strings for BtJson rules.
//!
//! A [`Keysets`] store is usually placed in the engine library under
//! [`LIBRARY_NAME`] and read by transforms that need translated text.

mod keysets;

pub use btjson_core::LookupError;
pub use keysets::{KeyValue, Keysets, DEFAULT_LANGUAGE};

/// Name the store is conventionally registered under in the engine library.
pub const LIBRARY_NAME: &str = "i18n";
