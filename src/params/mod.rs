//! Parameter normalization.
//!
//! Every supported input shape (name/value pairs, records implementing
//! [`ParameterSource`], serializable objects) ends up as one ordered [`Parameters`]
//! collection whose values are never "missing": absent values become [`DbValue::Null`].

mod cache;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{DacError, messages};
use crate::types::DbValue;

pub use cache::{ParameterShapeCache, ShapeNames};

/// A named command parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: Arc<str>,
    value: DbValue,
}

impl Parameter {
    pub fn new(name: impl Into<Arc<str>>, value: impl Into<DbValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn value(&self) -> &DbValue {
        &self.value
    }

    #[must_use]
    pub fn into_parts(self) -> (Arc<str>, DbValue) {
        (self.name, self.value)
    }
}

/// Ordered collection of command parameters.
///
/// Insertion order is kept and duplicate names are passed to the driver as-is.
/// ```rust
/// use dac_middleware::prelude::*;
///
/// let params = Parameters::new()
///     .add("id", 7)
///     .add("nickname", None::<String>);
/// assert_eq!(params.len(), 2);
/// assert!(params.get("nickname").is_some_and(DbValue::is_null));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    items: Vec<Parameter>,
}

impl Parameters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Append a parameter; `None` values become [`DbValue::Null`].
    #[must_use]
    pub fn add(mut self, name: impl Into<Arc<str>>, value: impl Into<DbValue>) -> Self {
        self.push(name, value);
        self
    }

    /// Append an already built parameter.
    #[must_use]
    pub fn add_parameter(mut self, parameter: Parameter) -> Self {
        self.items.push(parameter);
        self
    }

    pub fn push(&mut self, name: impl Into<Arc<str>>, value: impl Into<DbValue>) {
        self.items.push(Parameter::new(name, value));
    }

    /// Append every name/value pair, in order.
    #[must_use]
    pub fn extend_pairs<I, N, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<Arc<str>>,
        V: Into<DbValue>,
    {
        for (name, value) in pairs {
            self.push(name, value);
        }
        self
    }

    /// Build a set from the fields of a record, using `cache` for the field names.
    pub fn from_source<S: ParameterSource>(source: &S, cache: &ParameterShapeCache) -> Self {
        let names = cache.names_for::<S>();
        let values = source.field_values();
        debug_assert_eq!(names.len(), values.len(), "field names and values disagree");

        let mut params = Parameters::with_capacity(names.len());
        for (name, value) in names.iter().zip(values) {
            params.items.push(Parameter {
                name: Arc::clone(name),
                value,
            });
        }
        params
    }

    /// Build a set from the top-level fields of a serializable object, in field order.
    ///
    /// Anything that does not serialize to an object yields an empty set.
    ///
    /// # Errors
    /// Returns `serde_json::Error` if the value cannot be serialized.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::from_json(serde_json::to_value(value)?))
    }

    /// Build a set from a JSON object, in key order. Non-objects yield an empty set.
    #[must_use]
    pub fn from_json(value: JsonValue) -> Self {
        match value {
            JsonValue::Object(map) => {
                let mut params = Parameters::with_capacity(map.len());
                for (name, value) in map {
                    params.push(name, DbValue::from_json(value));
                }
                params
            }
            _ => Parameters::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First value bound under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DbValue> {
        self.items
            .iter()
            .find(|p| p.name() == name)
            .map(Parameter::value)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Parameter> {
        self.items.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Parameter] {
        &self.items
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Parameter> {
        self.items.clone()
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = &'a Parameter;
    type IntoIter = std::slice::Iter<'a, Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for Parameters {
    type Item = Parameter;
    type IntoIter = std::vec::IntoIter<Parameter>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<N, V> FromIterator<(N, V)> for Parameters
where
    N: Into<Arc<str>>,
    V: Into<DbValue>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Parameters::new().extend_pairs(iter)
    }
}

impl Extend<Parameter> for Parameters {
    fn extend<I: IntoIterator<Item = Parameter>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

/// A record whose fields can be turned into command parameters.
///
/// Implement it with [`parameter_source!`](crate::parameter_source) rather than by hand;
/// `field_names` and `field_values` must agree in length and order.
pub trait ParameterSource: 'static {
    /// Parameter names, one per field.
    fn field_names() -> &'static [&'static str];

    /// Current field values, in the order of [`field_names`](Self::field_names).
    fn field_values(&self) -> Vec<DbValue>;
}

/// Implement [`ParameterSource`] for a struct by listing the fields to expose.
///
/// ```rust
/// use dac_middleware::prelude::*;
///
/// struct NewUser {
///     name: String,
///     email: Option<String>,
/// }
///
/// dac_middleware::parameter_source!(NewUser { name, email });
///
/// let cache = ParameterShapeCache::new();
/// let user = NewUser { name: "ada".into(), email: None };
/// let params = Parameters::from_source(&user, &cache);
/// assert_eq!(params.get("email"), Some(&DbValue::Null));
/// ```
#[macro_export]
macro_rules! parameter_source {
    ($ty:ty { $($field:ident),* $(,)? }) => {
        impl $crate::params::ParameterSource for $ty {
            fn field_names() -> &'static [&'static str] {
                &[$(stringify!($field)),*]
            }

            fn field_values(&self) -> Vec<$crate::types::DbValue> {
                vec![$($crate::types::DbValue::from(::std::clone::Clone::clone(&self.$field))),*]
            }
        }
    };
}

/// Any input shape accepted where a command expects parameters.
pub trait IntoParameters {
    /// Normalize into a parameter set; `cache` resolves record shapes.
    ///
    /// # Errors
    /// Returns `DacError::Generic` when the input cannot be converted (e.g. serialization fails).
    fn into_parameters(self, cache: &ParameterShapeCache) -> Result<Parameters, DacError>;
}

impl IntoParameters for Parameters {
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(self)
    }
}

impl IntoParameters for () {
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(Parameters::new())
    }
}

impl<P: IntoParameters> IntoParameters for Option<P> {
    fn into_parameters(self, cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        match self {
            Some(params) => params.into_parameters(cache),
            None => Ok(Parameters::new()),
        }
    }
}

impl<N, V> IntoParameters for Vec<(N, V)>
where
    N: Into<Arc<str>>,
    V: Into<DbValue>,
{
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(self.into_iter().collect())
    }
}

impl<N, V, const LEN: usize> IntoParameters for [(N, V); LEN]
where
    N: Into<Arc<str>>,
    V: Into<DbValue>,
{
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(self.into_iter().collect())
    }
}

impl<N, V> IntoParameters for &[(N, V)]
where
    N: Into<Arc<str>> + Clone,
    V: Into<DbValue> + Clone,
{
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(self.iter().cloned().collect())
    }
}

impl IntoParameters for JsonValue {
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(Parameters::from_json(self))
    }
}

/// Adapter feeding a [`ParameterSource`] record through the shape cache.
pub struct Record<'a, S>(pub &'a S);

impl<S: ParameterSource> IntoParameters for Record<'_, S> {
    fn into_parameters(self, cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Ok(Parameters::from_source(self.0, cache))
    }
}

/// Adapter for any serializable object; fields are read on every call, uncached.
pub struct Dynamic<'a, T: ?Sized>(pub &'a T);

impl<T: Serialize + ?Sized> IntoParameters for Dynamic<'_, T> {
    fn into_parameters(self, _cache: &ParameterShapeCache) -> Result<Parameters, DacError> {
        Parameters::from_serialize(self.0).map_err(|e| {
            DacError::generic(messages::PARAMETER_BUILD_EXCEPTION, Some(Box::new(e)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Filter<'a> {
        status: &'a str,
        owner: Option<i64>,
        limit: i64,
    }

    struct Account {
        id: i64,
        label: Option<String>,
        active: bool,
    }

    crate::parameter_source!(Account { id, label, active });

    #[test]
    fn pairs_keep_order_count_and_null_marker() {
        let pairs: Vec<(&str, Option<i64>)> =
            vec![("c", Some(3)), ("a", None), ("b", Some(1)), ("a", Some(9))];
        let params = pairs
            .clone()
            .into_parameters(&ParameterShapeCache::new())
            .expect("pairs convert");

        assert_eq!(params.len(), pairs.len());
        let names: Vec<&str> = params.iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["c", "a", "b", "a"]);
        assert_eq!(params.as_slice()[1].value(), &DbValue::Null);
        // duplicates are passed through; lookup returns the first
        assert_eq!(params.get("a"), Some(&DbValue::Null));
    }

    #[test]
    fn empty_and_absent_inputs_are_empty_sets() {
        let cache = ParameterShapeCache::new();
        assert!(().into_parameters(&cache).expect("unit").is_empty());
        assert!(
            None::<Parameters>
                .into_parameters(&cache)
                .expect("none")
                .is_empty()
        );
        assert!(
            Vec::<(&str, i64)>::new()
                .into_parameters(&cache)
                .expect("empty vec")
                .is_empty()
        );
        assert!(
            JsonValue::Null
                .into_parameters(&cache)
                .expect("json null")
                .is_empty()
        );
    }

    #[test]
    fn records_use_the_shape_cache() {
        let cache = ParameterShapeCache::new();
        let account = Account {
            id: 5,
            label: None,
            active: true,
        };

        let params = Record(&account).into_parameters(&cache).expect("record");
        assert!(cache.contains::<Account>());
        let collected: Vec<(&str, &DbValue)> =
            params.iter().map(|p| (p.name(), p.value())).collect();
        assert_eq!(
            collected,
            vec![
                ("id", &DbValue::Int(5)),
                ("label", &DbValue::Null),
                ("active", &DbValue::Bool(true)),
            ]
        );
    }

    #[test]
    fn dynamic_objects_keep_field_order() {
        let filter = Filter {
            status: "open",
            owner: None,
            limit: 10,
        };
        let params = Dynamic(&filter)
            .into_parameters(&ParameterShapeCache::new())
            .expect("serializable");
        let names: Vec<&str> = params.iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["status", "owner", "limit"]);
        assert_eq!(params.get("owner"), Some(&DbValue::Null));

        let from_json = json!({ "z": 1, "y": null });
        let params = Parameters::from_json(from_json);
        let names: Vec<&str> = params.iter().map(Parameter::name).collect();
        assert_eq!(names, vec!["z", "y"]);
    }
}
