//! Resource identifiers and ordered amount maps.
//!
//! Resources are open-ended: any producer may name a resource the engine
//! has never seen, and the [`Ledger`](crate::ledger::Ledger) creates its
//! record on first reference. Names are interned as [`ResourceName`]
//! (a shared `Arc<str>`) so the per-tick maps clone cheaply, while the
//! ledger itself addresses records through dense [`ResourceId`] slots.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Stable string key of a resource (e.g. `"power"`, `"water"`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceName(Arc<str>);

impl ResourceName {
    /// Create a resource name.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// The name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", &*self.0)
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl AsRef<str> for ResourceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for ResourceName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ResourceName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from(name))
    }
}

/// Dense slot handle of a resource inside a ledger.
///
/// Handles are assigned in creation order and are only meaningful for the
/// ledger that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceId(pub u32);

impl ResourceId {
    /// Slot index of this handle.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Insertion-ordered map from resource name to an integer amount.
///
/// Used for needs maps, production maps and coverage reports. Enumeration
/// order is the order keys were first inserted, which the admission phase
/// relies on. Maps are small (a handful of entries per producer), so lookups
/// are linear.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAmounts {
    entries: Vec<(ResourceName, i64)>,
}

impl ResourceAmounts {
    /// Create an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Set the amount for a resource, keeping its original position if it
    /// was already present.
    pub fn insert(&mut self, name: impl Into<ResourceName>, amount: i64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = amount,
            None => self.entries.push((name, amount)),
        }
    }

    /// Fold an amount into the running total for a resource.
    pub fn add(&mut self, name: impl Into<ResourceName>, amount: i64) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = existing.saturating_add(amount),
            None => self.entries.push((name, amount)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, name: impl Into<ResourceName>, amount: i64) -> Self {
        self.insert(name, amount);
        self
    }

    /// Amount recorded for a resource.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(n, _)| n.as_str() == name)
            .map(|(_, amount)| *amount)
    }

    /// Check whether a resource has an entry.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterate entries in enumeration order.
    pub fn iter(&self) -> impl Iterator<Item = (&ResourceName, i64)> {
        self.entries.iter().map(|(n, a)| (n, *a))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<ResourceName>> FromIterator<(N, i64)> for ResourceAmounts {
    fn from_iter<I: IntoIterator<Item = (N, i64)>>(iter: I) -> Self {
        let mut amounts = Self::new();
        for (name, amount) in iter {
            amounts.insert(name, amount);
        }
        amounts
    }
}

// Serialized as a map so scenario and protocol files read `{"power": 7}`.
// Deserialization keeps document order.
impl Serialize for ResourceAmounts {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, amount) in &self.entries {
            map.serialize_entry(name.as_str(), amount)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResourceAmounts {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct AmountsVisitor;

        impl<'de> serde::de::Visitor<'de> for AmountsVisitor {
            type Value = ResourceAmounts;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of resource names to integer amounts")
            }

            fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut amounts = ResourceAmounts::new();
                while let Some((name, amount)) = access.next_entry::<String, i64>()? {
                    amounts.insert(name, amount);
                }
                Ok(amounts)
            }
        }

        deserializer.deserialize_map(AmountsVisitor)
    }
}

impl<'a> IntoIterator for &'a ResourceAmounts {
    type Item = (&'a ResourceName, i64);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (ResourceName, i64)>,
        fn(&'a (ResourceName, i64)) -> (&'a ResourceName, i64),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(entry_pair as fn(_) -> _)
    }
}

fn entry_pair((name, amount): &(ResourceName, i64)) -> (&ResourceName, i64) {
    (name, *amount)
}
