//! Placeholder identifiers and the registry that describes them

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;

/// Opaque token naming an image slot inside one generated document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlaceholderId(String);

impl PlaceholderId {
    /// Wrap a raw identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as written in `image:<id>` references
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlaceholderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for PlaceholderId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlaceholderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlaceholderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Mapping from placeholder id to its human-readable description
///
/// The registry is produced together with a document body and is never
/// mutated afterwards; a new generation replaces it wholesale. Entries keep
/// the order the service returned them in, which is only used for display.
///
/// The description doubles as alt-text and, for markdown bodies, as the
/// literal text matched during substitution. Two placeholders sharing a
/// description make markdown substitution ambiguous.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderRegistry {
    entries: Vec<(PlaceholderId, String)>,
}

impl PlaceholderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `(id, description)` pairs
    ///
    /// A repeated id keeps its first position and takes the last description,
    /// matching how a JSON object with duplicate keys is read.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<PlaceholderId>,
        V: Into<String>,
    {
        let mut registry = Self::new();
        for (id, description) in pairs {
            registry.insert(id.into(), description.into());
        }
        registry
    }

    fn insert(&mut self, id: PlaceholderId, description: String) {
        match self.entries.iter_mut().find(|(existing, _)| *existing == id) {
            Some(entry) => entry.1 = description,
            None => self.entries.push((id, description)),
        }
    }

    /// Look up the description for an id
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(existing, _)| existing.as_str() == id)
            .map(|(_, description)| description.as_str())
    }

    /// Whether the id belongs to this registry
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Iterate over `(id, description)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&PlaceholderId, &str)> {
        self.entries
            .iter()
            .map(|(id, description)| (id, description.as_str()))
    }

    /// All ids in insertion order
    pub fn ids(&self) -> impl Iterator<Item = &PlaceholderId> {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Number of placeholders
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no placeholders
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<PlaceholderId>, V: Into<String>> FromIterator<(K, V)> for PlaceholderRegistry {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

impl Serialize for PlaceholderRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, description) in &self.entries {
            map.serialize_entry(id, description)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for PlaceholderRegistry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RegistryVisitor;

        impl<'de> Visitor<'de> for RegistryVisitor {
            type Value = PlaceholderRegistry;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of placeholder ids to descriptions")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut registry = PlaceholderRegistry::new();
                while let Some((id, description)) = access.next_entry::<String, String>()? {
                    registry.insert(PlaceholderId::new(id), description);
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(RegistryVisitor)
    }
}
