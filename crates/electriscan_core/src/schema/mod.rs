//! Property schema shared by every household document.
//!
//! # Responsibility
//! - Declare, per entity type, the ordered wire fields with their JSON type
//!   and accessor.
//! - Validate raw documents before converters touch them.
//! - Provide typed field readers used while building entities.
//!
//! # Invariants
//! - Field names are the on-disk contract and never change.
//! - A structurally wrong value is an error; an unparseable enum string is
//!   not (readers fall back to the documented default).
//!
//! # See also
//! - crate::convert

mod error;
mod fields;
mod read;

pub use error::SchemaError;
pub use fields::*;
pub use read::{read_bool, read_enum, read_f64, read_text, read_u32, read_u64};

use crate::model::change::EntityKind;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// One JSON object as stored on disk.
pub type Document = serde_json::Map<String, Value>;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// Non-negative integer that fits into `u32`.
    Integer,
    Number,
    Text,
    Boolean,
    /// Nested list of child documents.
    Array,
}

impl FieldType {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Integer => value
                .as_u64()
                .is_some_and(|number| u32::try_from(number).is_ok()),
            Self::Number => value.is_number(),
            Self::Text => value.is_string(),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Array => "array",
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named field with its type predicate and value accessor.
pub struct PropertyDescriptor<E> {
    pub name: &'static str,
    pub field_type: FieldType,
    pub accessor: fn(&E) -> Value,
}

/// Entity type with a fixed property table.
pub trait EntitySchema: Sized + 'static {
    const KIND: EntityKind;

    /// Scalar properties in wire order. Nested arrays are not listed.
    fn properties() -> &'static [PropertyDescriptor<Self>];
}

/// Returns `true` when every declared field of `E` is present.
pub fn has_all_fields<E: EntitySchema>(doc: &Document) -> bool {
    E::properties()
        .iter()
        .all(|property| doc.contains_key(property.name))
}

/// Returns `true` when every present declared field has the declared type.
pub fn fields_have_valid_types<E: EntitySchema>(doc: &Document) -> bool {
    E::properties().iter().all(|property| {
        doc.get(property.name)
            .map_or(true, |value| property.field_type.accepts(value))
    })
}

/// Checks presence, then types, reporting the first offending field.
pub fn validate<E: EntitySchema>(doc: &Document) -> Result<(), SchemaError> {
    for property in E::properties() {
        match doc.get(property.name) {
            None => {
                return Err(SchemaError::MissingField {
                    entity: E::KIND,
                    field: property.name,
                })
            }
            Some(value) if !property.field_type.accepts(value) => {
                return Err(SchemaError::InvalidType {
                    entity: E::KIND,
                    field: property.name,
                    expected: property.field_type,
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}

/// Overwrites every scalar field of `doc` from `entity`.
pub fn write_fields<E: EntitySchema>(entity: &E, doc: &mut Document) {
    for property in E::properties() {
        doc.insert(property.name.to_string(), (property.accessor)(entity));
    }
}

/// Borrows `value` as a document or reports it as the wrong shape.
pub fn as_document(value: &Value, entity: EntityKind) -> Result<&Document, SchemaError> {
    value
        .as_object()
        .ok_or(SchemaError::NotAnObject { entity })
}

#[cfg(test)]
mod tests {
    use super::{fields_have_valid_types, has_all_fields, validate, Document, FieldType};
    use crate::model::household::Household;
    use crate::schema::{SchemaError, HOUSEHOLD_NAME, NUMBER_OF_RESIDENTS, POSTAL_CODE};
    use serde_json::json;

    fn household_doc() -> Document {
        json!({
            HOUSEHOLD_NAME: "Home",
            NUMBER_OF_RESIDENTS: 3,
            POSTAL_CODE: 8400,
        })
        .as_object()
        .cloned()
        .unwrap()
    }

    #[test]
    fn integer_rejects_negative_and_fractional_values() {
        assert!(FieldType::Integer.accepts(&json!(7)));
        assert!(!FieldType::Integer.accepts(&json!(-1)));
        assert!(!FieldType::Integer.accepts(&json!(1.5)));
        assert!(!FieldType::Integer.accepts(&json!(u64::MAX)));
        assert!(FieldType::Number.accepts(&json!(1.5)));
    }

    #[test]
    fn validate_reports_missing_before_mistyped() {
        let mut doc = household_doc();
        assert!(validate::<Household>(&doc).is_ok());

        doc.insert(POSTAL_CODE.to_string(), json!("8400"));
        doc.remove(HOUSEHOLD_NAME);
        assert!(!has_all_fields::<Household>(&doc));
        assert!(!fields_have_valid_types::<Household>(&doc));
        assert!(matches!(
            validate::<Household>(&doc),
            Err(SchemaError::MissingField {
                field: HOUSEHOLD_NAME,
                ..
            })
        ));
    }
}
