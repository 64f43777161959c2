//! Header bag: the single header representation used past the process boundary.
//!
//! Header sources arrive in several shapes (a `HeaderMap` from the HTTP
//! stack, iterables of name/value pairs, name → value(s) maps). Each is
//! converted once into a [`HeaderBag`], so no component below branches on
//! representation. Names or values that are not valid HTTP are skipped;
//! a source with nothing usable becomes an empty bag.

use std::collections::{BTreeMap, HashMap};

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::HeaderMap;

/// Case-insensitive, multi-valued header collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderBag(HeaderMap);

impl HeaderBag {
    pub fn new() -> Self {
        Self(HeaderMap::new())
    }

    /// Append a value, silently skipping invalid names or values.
    pub fn append(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.trim().as_bytes()),
            HeaderValue::from_str(value.trim()),
        ) {
            self.0.append(name, value);
        }
    }

    /// Drop every value for each of `names` (case-insensitive).
    pub fn without(mut self, names: &[&str]) -> Self {
        for name in names {
            if let Ok(name) = HeaderName::from_bytes(name.as_bytes()) {
                self.0.remove(name);
            }
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HeaderMap {
        &self.0
    }

    pub fn into_inner(self) -> HeaderMap {
        self.0
    }
}

impl From<HeaderMap> for HeaderBag {
    fn from(map: HeaderMap) -> Self {
        Self(map)
    }
}

impl From<&HeaderMap> for HeaderBag {
    fn from(map: &HeaderMap) -> Self {
        Self(map.clone())
    }
}

/// Iterable name/value pairs; repeated names accumulate.
impl<K, V> FromIterator<(K, V)> for HeaderBag
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = HeaderBag::new();
        for (name, value) in iter {
            bag.append(name.as_ref(), value.as_ref());
        }
        bag
    }
}

/// Name → list of values.
impl From<HashMap<String, Vec<String>>> for HeaderBag {
    fn from(map: HashMap<String, Vec<String>>) -> Self {
        map.iter()
            .flat_map(|(name, values)| values.iter().map(move |v| (name, v)))
            .collect()
    }
}

/// Name → single value.
impl From<HashMap<String, String>> for HeaderBag {
    fn from(map: HashMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}

/// Name → single value, ordered.
impl From<BTreeMap<String, String>> for HeaderBag {
    fn from(map: BTreeMap<String, String>) -> Self {
        map.into_iter().collect()
    }
}
