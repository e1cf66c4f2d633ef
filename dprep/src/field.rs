use indexmap::IndexMap;
use log::warn;

use crate::{
    data::{DType, Data},
    errors::{Error, Result},
};

pub const UNITS: &str = "units";
pub const LONG_NAME: &str = "long_name";

/// A named, labelled array. The unit of data stored in a `Dataset`.
///
#[derive(Clone, Debug)]
pub struct Field {
    /// Name of the field, e.g. "toa_radiation"
    pub name: String,

    pub data: Data,

    pub metadata: FieldMetadata,
}

impl Field {
    pub fn new<S: Into<String>>(name: S, data: Data) -> Self {
        Self {
            name: name.into(),
            data,
            metadata: FieldMetadata::default(),
        }
    }

    pub fn with_metadata(self, metadata: FieldMetadata) -> Self {
        Self { metadata, ..self }
    }

    pub fn dims(&self) -> &[String] {
        self.data.dims()
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }
}

/// The metadata every derived field must carry
///
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldMetadata {
    pub units: Option<String>,
    pub long_name: Option<String>,
}

/// Record of a configured attribute replacing the one a computation set
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeOverwrite {
    pub field: String,
    pub attribute: &'static str,
    pub old: String,
    pub new: String,
}

impl FieldMetadata {
    pub fn new<U: Into<String>, L: Into<String>>(units: U, long_name: L) -> Self {
        Self {
            units: Some(units.into()),
            long_name: Some(long_name.into()),
        }
    }

    /// Read `units` and `long_name` from a free form attribute mapping, ignoring other keys.
    ///
    pub fn from_attributes(attributes: &IndexMap<String, String>) -> Self {
        Self {
            units: attributes.get(UNITS).cloned(),
            long_name: attributes.get(LONG_NAME).cloned(),
        }
    }

    /// Combine metadata set by a computation with configured fallbacks.
    ///
    /// For each attribute, a configured value takes precedence over a computed one. A computed
    /// value is kept when nothing is configured. It's an error for an attribute to be set by
    /// neither. Every computed value replaced by a configured one is logged and returned.
    ///
    pub fn merge(
        &self,
        configured: &FieldMetadata,
        field: &str,
    ) -> Result<(FieldMetadata, Vec<AttributeOverwrite>)> {
        let mut overwrites = vec![];
        let units = merge_attribute(
            UNITS,
            &self.units,
            &configured.units,
            field,
            &mut overwrites,
        )?;
        let long_name = merge_attribute(
            LONG_NAME,
            &self.long_name,
            &configured.long_name,
            field,
            &mut overwrites,
        )?;

        Ok((FieldMetadata { units, long_name }, overwrites))
    }
}

fn merge_attribute(
    attribute: &'static str,
    computed: &Option<String>,
    configured: &Option<String>,
    field: &str,
    overwrites: &mut Vec<AttributeOverwrite>,
) -> Result<Option<String>> {
    match (computed, configured) {
        (Some(old), Some(new)) => {
            warn!(
                "The attribute '{attribute}' of the derived field {field} is being overwritten \
                 from '{old}' to '{new}' according to the configuration."
            );
            overwrites.push(AttributeOverwrite {
                field: field.to_string(),
                attribute,
                old: old.clone(),
                new: new.clone(),
            });
            Ok(Some(new.clone()))
        }
        (Some(value), None) | (None, Some(value)) => Ok(Some(value.clone())),
        (None, None) => Err(Error::MissingAttribute {
            attribute: attribute.to_string(),
            field: field.to_string(),
        }),
    }
}
