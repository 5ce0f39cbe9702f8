//! Shared namespace for helpers used by rules.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

/// An open, name-keyed store of typed values (URL builders, localized
/// strings, global settings). The engine neither populates nor validates it.
#[derive(Default)]
pub struct Library {
    entries: IndexMap<String, Box<dyn Any>>,
}

impl Library {
    /// Create an empty library.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value under `name`, returning the previous entry if any.
    pub fn insert<T: Any>(&mut self, name: impl Into<String>, value: T) -> Option<Box<dyn Any>> {
        self.entries.insert(name.into(), Box::new(value))
    }

    /// Get a value by name, if present and of type `T`.
    pub fn get<T: Any>(&self, name: &str) -> Option<&T> {
        self.entries.get(name).and_then(|value| value.downcast_ref())
    }

    /// Mutable access to a value by name, if present and of type `T`.
    pub fn get_mut<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.entries.get_mut(name).and_then(|value| value.downcast_mut())
    }

    /// Whether a value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Remove and return the value stored under `name`.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Any>> {
        self.entries.shift_remove(name)
    }

    /// Names of the stored values, in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the library is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Library {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Library")
            .field("names", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_entries() {
        let mut library = Library::new();
        library.insert("lang", "ru".to_string());
        library.insert("retries", 3u32);

        assert_eq!(library.get::<String>("lang").map(String::as_str), Some("ru"));
        assert_eq!(library.get::<u32>("retries"), Some(&3));
        assert!(library.get::<u32>("lang").is_none());
        assert!(library.get::<u32>("missing").is_none());
    }

    #[test]
    fn test_mutate_and_remove() {
        let mut library = Library::new();
        library.insert("hosts", vec!["//clck.yandex.ru".to_string()]);
        if let Some(hosts) = library.get_mut::<Vec<String>>("hosts") {
            hosts.push("//pass.yandex.ru".to_string());
        }
        assert_eq!(library.get::<Vec<String>>("hosts").map(Vec::len), Some(2));
        assert_eq!(library.names().collect::<Vec<_>>(), vec!["hosts"]);

        assert!(library.remove("hosts").is_some());
        assert!(library.is_empty());
    }
}
