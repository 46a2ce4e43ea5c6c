//! Run-scoped build parameters.
//!
//! [`ParameterStore`] is the single writer; [`Parameters`] is an immutable
//! snapshot handed to readers. Writes copy the map only while a snapshot is
//! still alive, so a step can keep iterating an older view while adding
//! parameters for later steps.

use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::error::{Result, VanillaError};

/// Ordered parameter map.
pub type ParameterMap = IndexMap<String, String>;

/// Read-only view of the parameters at the moment it was taken.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parameters(Arc<ParameterMap>);

impl Parameters {
    /// Parameters as a plain map, for use as process environment.
    pub fn to_env(&self) -> HashMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Deref for Parameters {
    type Target = ParameterMap;

    fn deref(&self) -> &ParameterMap {
        &self.0
    }
}

impl Serialize for Parameters {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

/// Append-and-override parameter storage owned by one build run.
#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    map: Arc<ParameterMap>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from initial values, validating every name.
    pub fn seeded<I, K, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = Self::new();
        for (name, value) in values {
            store.insert(name, value)?;
        }
        Ok(store)
    }

    /// Insert or overwrite a parameter. A new name is appended; an existing
    /// name keeps its position and takes the new value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `name` is empty or only whitespace.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(VanillaError::InvalidArgument {
                message: "parameter name must not be empty".to_string(),
            });
        }
        Arc::make_mut(&mut self.map).insert(name, value.into());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.map.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Take a snapshot view of the current parameters.
    pub fn snapshot(&self) -> Parameters {
        Parameters(Arc::clone(&self.map))
    }
}
