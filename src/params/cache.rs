use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::ParameterSource;

/// Parameter names of one record shape, shared by every set built from it.
pub type ShapeNames = Arc<[Arc<str>]>;

/// Cache of parameter names per [`ParameterSource`] type.
///
/// Build one per process (the executor owns one by default) and share it through `Arc`.
/// Entries are only ever added: a type's fields cannot change while the process runs.
/// Two tasks racing on the first lookup of the same type both compute the names and the
/// first insert wins.
#[derive(Debug, Default)]
pub struct ParameterShapeCache {
    shapes: RwLock<HashMap<TypeId, ShapeNames>>,
}

impl ParameterShapeCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameter names for `S`, resolving them on first use.
    pub fn names_for<S: ParameterSource>(&self) -> ShapeNames {
        let key = TypeId::of::<S>();
        {
            let shapes = match self.shapes.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(names) = shapes.get(&key) {
                return Arc::clone(names);
            }
        }

        let resolved: ShapeNames = S::field_names()
            .iter()
            .map(|name| Arc::<str>::from(*name))
            .collect();

        let mut shapes = match self.shapes.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(shapes.entry(key).or_insert(resolved))
    }

    /// Whether the names of `S` have already been resolved.
    #[must_use]
    pub fn contains<S: ParameterSource>(&self) -> bool {
        let shapes = match self.shapes.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        shapes.contains_key(&TypeId::of::<S>())
    }

    /// Number of distinct shapes resolved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.shapes.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
