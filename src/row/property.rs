use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use crate::row::{ColumnType, Row, RowError, column_key};
use crate::value::Value;

/// A synthetic, read-only column of a dynamic row: the member that stands in
/// for `row.get::<T>(name)` after normalization.
///
/// Equality and hashing are structural over (case-insensitive name, column
/// type). Within one [`PropertyRegistry`] structurally equal properties are
/// also the same allocation, which callers can check with [`Arc::ptr_eq`].
#[derive(Debug)]
pub struct RowProperty {
    ordinal: u64,
    name: String,
    column_type: ColumnType,
}

impl RowProperty {
    /// Column name, in the spelling first registered
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    /// Registry-unique creation ordinal
    pub fn ordinal(&self) -> u64 {
        self.ordinal
    }

    /// Reads the column's raw value from `row`.
    pub fn get_value(&self, row: &Row) -> Result<Value, RowError> {
        row.value(&self.name)
            .cloned()
            .ok_or_else(|| RowError::MissingColumn {
                column: self.name.clone(),
            })
    }

    /// Always fails: row properties are read-only.
    pub fn set_value(&self, _row: &mut Row, _value: Value) -> Result<(), RowError> {
        Err(RowError::ReadOnlyProperty {
            property: self.to_string(),
        })
    }
}

impl PartialEq for RowProperty {
    fn eq(&self, other: &Self) -> bool {
        self.column_type == other.column_type && column_key(&self.name) == column_key(&other.name)
    }
}

impl Eq for RowProperty {}

impl Hash for RowProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        column_key(&self.name).hash(state);
        self.column_type.hash(state);
    }
}

impl fmt::Display for RowProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row.get<{}>(\"{}\")", self.column_type, self.name)
    }
}

type PropertyKey = (ColumnType, String);

/// Interns [`RowProperty`] instances so each (column type, case-insensitive
/// name) pair maps to exactly one shared property.
///
/// Entries are never evicted; the key space is bounded by the distinct
/// column reads that appear in predicate code.
#[derive(Debug, Default)]
pub struct PropertyRegistry {
    cache: RwLock<HashMap<PropertyKey, Arc<RowProperty>>>,
    last_ordinal: AtomicU64,
}

static GLOBAL_REGISTRY: OnceLock<PropertyRegistry> = OnceLock::new();

impl PropertyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry, created on first use and kept for the
    /// life of the process.
    pub fn global() -> &'static PropertyRegistry {
        GLOBAL_REGISTRY.get_or_init(PropertyRegistry::new)
    }

    /// Returns the property for (`name`, `column_type`), creating it on
    /// first request.
    ///
    /// Concurrent first requests all get the one stored property. Ordinals
    /// are handed out under the write lock, so they are dense and follow
    /// creation order.
    pub fn property(&self, name: &str, column_type: ColumnType) -> Arc<RowProperty> {
        let key = (column_type, column_key(name));
        if let Some(cached) = self.cache.read().get(&key) {
            return Arc::clone(cached);
        }

        let mut cache = self.cache.write();
        let property = cache.entry(key).or_insert_with(|| {
            let ordinal = self.last_ordinal.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::trace!(column = name, %column_type, ordinal, "registered row property");
            Arc::new(RowProperty {
                ordinal,
                name: name.to_string(),
                column_type,
            })
        });
        Arc::clone(property)
    }

    /// Number of distinct properties registered so far
    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}
