use crate::model::change::EntityKind;
use crate::schema::FieldType;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Structural problem found in a household document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    NotAnObject {
        entity: EntityKind,
    },
    MissingField {
        entity: EntityKind,
        field: &'static str,
    },
    InvalidType {
        entity: EntityKind,
        field: &'static str,
        expected: FieldType,
    },
    /// Two sibling entries carry the same id in `field`.
    DuplicateId {
        entity: EntityKind,
        field: &'static str,
        id: u32,
    },
    /// Element `index` of the nested array `field` is malformed.
    Nested {
        entity: EntityKind,
        field: &'static str,
        index: usize,
        source: Box<SchemaError>,
    },
}

impl Display for SchemaError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnObject { entity } => {
                write!(f, "{} document is not a JSON object", entity.as_str())
            }
            Self::MissingField { entity, field } => {
                write!(f, "{} document is missing field `{field}`", entity.as_str())
            }
            Self::InvalidType {
                entity,
                field,
                expected,
            } => write!(
                f,
                "{} field `{field}` must be of type {expected}",
                entity.as_str()
            ),
            Self::DuplicateId { entity, field, id } => write!(
                f,
                "{} id {id} in field `{field}` is used more than once",
                entity.as_str()
            ),
            Self::Nested {
                entity,
                field,
                index,
                ..
            } => write!(
                f,
                "{} field `{field}` has an invalid element at index {index}",
                entity.as_str()
            ),
        }
    }
}

impl Error for SchemaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Nested { source, .. } => Some(source.as_ref()),
            Self::NotAnObject { .. }
            | Self::MissingField { .. }
            | Self::InvalidType { .. }
            | Self::DuplicateId { .. } => None,
        }
    }
}
