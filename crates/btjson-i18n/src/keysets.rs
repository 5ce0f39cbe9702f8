use std::borrow::Cow;
use std::fmt;

use btjson_core::LookupError;
use indexmap::IndexMap;
use serde_json::Value;

/// Language a new store starts with.
pub const DEFAULT_LANGUAGE: &str = "ru";

/// One entry of a keyset.
pub enum KeyValue {
    Text(String),
    /// Formatted from the options passed to [`Keysets::lookup_with`].
    Computed(Box<dyn Fn(&Value) -> String>),
}

impl KeyValue {
    /// Computed entry from a formatting closure.
    pub fn computed<F>(format: F) -> Self
    where
        F: Fn(&Value) -> String + 'static,
    {
        KeyValue::Computed(Box::new(format))
    }

    fn resolve(&self, options: &Value) -> Cow<'_, str> {
        match self {
            KeyValue::Text(text) => Cow::Borrowed(text),
            KeyValue::Computed(format) => Cow::Owned(format(options)),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(text: &str) -> Self {
        KeyValue::Text(text.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(text: String) -> Self {
        KeyValue::Text(text)
    }
}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Text(text) => f.debug_tuple("Text").field(text).finish(),
            KeyValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Named keysets of localized strings plus the current language.
#[derive(Debug)]
pub struct Keysets {
    keysets: IndexMap<String, IndexMap<String, KeyValue>>,
    language: String,
}

impl Default for Keysets {
    fn default() -> Self {
        Self {
            keysets: IndexMap::new(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Keysets {
    /// Create an empty store using the default language.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a keyset, replacing any keyset of the same name.
    pub fn add<I, K, V>(&mut self, keyset: impl Into<String>, entries: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<KeyValue>,
    {
        let entries = entries
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        self.keysets.insert(keyset.into(), entries);
        self
    }

    /// Add a computed key to `keyset`, creating the keyset if needed.
    pub fn add_computed<F>(&mut self, keyset: impl Into<String>, key: impl Into<String>, format: F) -> &mut Self
    where
        F: Fn(&Value) -> String + 'static,
    {
        self.keysets
            .entry(keyset.into())
            .or_default()
            .insert(key.into(), KeyValue::computed(format));
        self
    }

    /// Set the current language.
    pub fn set_language(&mut self, language: impl Into<String>) -> &mut Self {
        self.language = language.into();
        self
    }

    /// The current language.
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Whether a keyset of this name was added.
    pub fn contains_keyset(&self, keyset: &str) -> bool {
        self.keysets.contains_key(keyset)
    }

    /// Look up a key. Computed entries are formatted with `null` options.
    pub fn lookup(&self, keyset: &str, key: &str) -> Result<Cow<'_, str>, LookupError> {
        self.lookup_with(keyset, key, &Value::Null)
    }

    /// Look up a key, formatting computed entries with `options`.
    pub fn lookup_with(&self, keyset: &str, key: &str, options: &Value) -> Result<Cow<'_, str>, LookupError> {
        let entries = self
            .keysets
            .get(keyset)
            .ok_or_else(|| LookupError::KeysetNotFound {
                keyset: keyset.to_string(),
            })?;
        let value = entries.get(key).ok_or_else(|| LookupError::KeyNotFound {
            keyset: keyset.to_string(),
            key: key.to_string(),
        })?;
        Ok(value.resolve(options))
    }
}
