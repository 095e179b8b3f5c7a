//! Type registration.
//!
//! A [`SchemaRegistry`] compiles each registered type's descriptor at
//! most once and hands out the same shared [`CompiledSchema`] for the
//! registry's lifetime. It is an explicit value, not process state:
//! callers decide its scope and share it where they need one.

use std::any::TypeId;
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;

use tantex_schema::{CompiledSchema, TypeDescriptor};

use crate::error::{Error, Result};

/// A domain type that can live in an index.
///
/// The descriptor is pure data describing how instances map to engine
/// fields; serialization provides the instance tree those mappings read.
pub trait Indexed: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn descriptor() -> TypeDescriptor;
}

#[derive(Default)]
pub struct SchemaRegistry {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    by_type: AHashMap<TypeId, Arc<CompiledSchema>>,
    by_name: AHashMap<String, TypeId>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiled schema for `T`, compiling on first use.
    ///
    /// Every call for the same `T` returns the same `Arc`. Two distinct
    /// types claiming the same descriptor name is an error.
    pub fn schema_of<T: Indexed>(&self) -> Result<Arc<CompiledSchema>> {
        let key = TypeId::of::<T>();
        if let Some(cs) = self.inner.read().by_type.get(&key) {
            return Ok(Arc::clone(cs));
        }

        let compiled = Arc::new(CompiledSchema::compile(&T::descriptor())?);
        let mut inner = self.inner.write();
        if let Some(cs) = inner.by_type.get(&key) {
            // lost the race; keep the first compilation
            return Ok(Arc::clone(cs));
        }
        if let Some(owner) = inner.by_name.get(compiled.type_name()) {
            if *owner != key {
                return Err(Error::TypeMismatch {
                    type_name: compiled.type_name().to_string(),
                });
            }
        }
        tracing::debug!(
            type_name = compiled.type_name(),
            fields = compiled.len(),
            "compiled schema"
        );
        inner.by_name.insert(compiled.type_name().to_string(), key);
        inner.by_type.insert(key, Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.inner.read().by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
