//! Concurrent keyed fetcher.
//!
//! A [`PendingSet`] names a number of outstanding lookups. [`resolve_all`]
//! drives them all at once and flattens the results into one mapping:
//!
//! - a [`Pending::Direct`] lookup lands under its own name
//! - a [`Pending::Projected`] lookup resolves to a mapping, and each listed
//!   field (dotted paths allowed) is copied out under the field name, or null
//!   when the mapping has no such field
//!
//! The join is all-or-nothing: the first failing lookup fails the whole call
//! and no partial mapping is returned. Field names are expected to be unique
//! across the set; on a collision the later entry wins.

use futures::future::{try_join_all, BoxFuture, FutureExt};
use serde_json::Value;
use std::collections::BTreeMap;
use std::future::Future;

use crate::{MonitorError, Result};

/// Boxed lookup future
pub type Lookup<'a, T> = BoxFuture<'a, Result<T>>;

/// One outstanding lookup
pub enum Pending<'a, T> {
    /// Resolved value is stored under the entry's name
    Direct(Lookup<'a, T>),
    /// Resolved value is destructured into the listed fields
    Projected {
        lookup: Lookup<'a, T>,
        fields: Vec<String>,
    },
}

impl<'a, T> Pending<'a, T> {
    pub fn direct<F>(lookup: F) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'a,
    {
        Pending::Direct(lookup.boxed())
    }

    pub fn projected<F, I, S>(lookup: F, fields: I) -> Self
    where
        F: Future<Output = Result<T>> + Send + 'a,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Pending::Projected {
            lookup: lookup.boxed(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl<T> std::fmt::Debug for Pending<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Pending::Direct(_) => f.write_str("Direct"),
            Pending::Projected { fields, .. } => {
                f.debug_struct("Projected").field("fields", fields).finish()
            }
        }
    }
}

/// Named lookups in insertion order
pub struct PendingSet<'a, T> {
    entries: Vec<(String, Pending<'a, T>)>,
}

impl<'a, T> Default for PendingSet<'a, T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<'a, T> PendingSet<'a, T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a lookup; re-using a name replaces the earlier lookup in place
    pub fn insert(&mut self, name: impl Into<String>, pending: Pending<'a, T>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = pending,
            None => self.entries.push((name, pending)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

/// Values a projected lookup can be destructured from
pub trait Project: Clone {
    /// Value at `path`, `None` when absent
    fn project(&self, path: &str) -> Option<&Self>;

    /// Stand-in for a missing field
    fn null() -> Self;
}

impl Project for Value {
    fn project(&self, path: &str) -> Option<&Value> {
        // a literal key wins over a nested path
        if let Some(value) = self.as_object().and_then(|map| map.get(path)) {
            return Some(value);
        }
        path.split('.').try_fold(self, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }

    fn null() -> Self {
        Value::Null
    }
}

enum Shape {
    Direct(String),
    Projected(Vec<String>),
}

/// Resolve every lookup concurrently and flatten the results
pub async fn resolve_all<T>(set: PendingSet<'_, T>) -> Result<BTreeMap<String, T>>
where
    T: Project + Send,
{
    let mut shapes = Vec::with_capacity(set.entries.len());
    let mut lookups = Vec::with_capacity(set.entries.len());
    for (name, pending) in set.entries {
        let (shape, lookup) = match pending {
            Pending::Direct(lookup) => (Shape::Direct(name.clone()), lookup),
            Pending::Projected { lookup, fields } => (Shape::Projected(fields), lookup),
        };
        shapes.push(shape);
        lookups.push(lookup.map(move |result| {
            result.map_err(|source| MonitorError::Lookup {
                key: name,
                source: Box::new(source),
            })
        }));
    }

    let values = try_join_all(lookups).await?;

    let mut resolved = BTreeMap::new();
    for (shape, value) in shapes.into_iter().zip(values) {
        match shape {
            Shape::Direct(name) => {
                resolved.insert(name, value);
            }
            Shape::Projected(fields) => {
                for field in fields {
                    let projected = value.project(&field).cloned().unwrap_or_else(T::null);
                    resolved.insert(field, projected);
                }
            }
        }
    }
    Ok(resolved)
}
