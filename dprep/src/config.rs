use indexmap::IndexMap;
use serde::Deserialize;

use crate::field::FieldMetadata;

/// Derived variables to compute, by output name, in the order they're declared
pub type DerivedVariables = IndexMap<String, DerivedVariable>;

/// Chunk size by dimension name
pub type ChunkingOverride = IndexMap<String, usize>;

/// Configuration of one derived variable.
///
/// ```yaml
/// toa_radiation:
///   function: calculate_toa_radiation
///   kwargs:
///     time: time
///     lat: lat
///     lon: lon
///   attributes:
///     units: W*m**-2
///     long_name: TOA radiation
/// ```
///
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DerivedVariable {
    /// Name of the function that computes the variable, either bare for a built-in function or
    /// prefixed by the namespace of a registered module
    pub function: String,

    /// Maps the name of a variable or coordinate in the input dataset to the name of the
    /// function parameter it is passed as. The names `lat` and `lon` always refer to the
    /// dataset's latitude and longitude.
    pub kwargs: IndexMap<String, String>,

    /// Fallback `units` and `long_name` for outputs that don't set them
    #[serde(default)]
    pub attributes: IndexMap<String, String>,
}

impl DerivedVariable {
    pub fn new<S: Into<String>>(function: S) -> Self {
        Self {
            function: function.into(),
            kwargs: IndexMap::new(),
            attributes: IndexMap::new(),
        }
    }

    /// Pass the dataset's `source` as the function's `parameter`.
    pub fn with_kwarg<S: Into<String>, P: Into<String>>(mut self, source: S, parameter: P) -> Self {
        self.kwargs.insert(source.into(), parameter.into());
        self
    }

    pub fn with_attribute<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn metadata(&self) -> FieldMetadata {
        FieldMetadata::from_attributes(&self.attributes)
    }
}
