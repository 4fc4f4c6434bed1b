//! Typed field readers.
//!
//! Every reader reports an absent field as `MissingField` and a value of the
//! wrong JSON type as `InvalidType`.

use crate::model::change::EntityKind;
use crate::schema::{Document, FieldType, SchemaError};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;

fn field<'a>(
    doc: &'a Document,
    entity: EntityKind,
    name: &'static str,
) -> Result<&'a Value, SchemaError> {
    doc.get(name).ok_or(SchemaError::MissingField {
        entity,
        field: name,
    })
}

fn invalid(entity: EntityKind, name: &'static str, expected: FieldType) -> SchemaError {
    SchemaError::InvalidType {
        entity,
        field: name,
        expected,
    }
}

pub fn read_u32(doc: &Document, entity: EntityKind, name: &'static str) -> Result<u32, SchemaError> {
    field(doc, entity, name)?
        .as_u64()
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| invalid(entity, name, FieldType::Integer))
}

/// Reads a non-negative number, truncating any fraction.
pub fn read_u64(doc: &Document, entity: EntityKind, name: &'static str) -> Result<u64, SchemaError> {
    let value = field(doc, entity, name)?;
    if let Some(number) = value.as_u64() {
        return Ok(number);
    }
    match value.as_f64() {
        Some(number) if number >= 0.0 && number.is_finite() => Ok(number as u64),
        _ => Err(invalid(entity, name, FieldType::Number)),
    }
}

pub fn read_f64(doc: &Document, entity: EntityKind, name: &'static str) -> Result<f64, SchemaError> {
    field(doc, entity, name)?
        .as_f64()
        .ok_or_else(|| invalid(entity, name, FieldType::Number))
}

pub fn read_text<'a>(
    doc: &'a Document,
    entity: EntityKind,
    name: &'static str,
) -> Result<&'a str, SchemaError> {
    field(doc, entity, name)?
        .as_str()
        .ok_or_else(|| invalid(entity, name, FieldType::Text))
}

pub fn read_bool(doc: &Document, entity: EntityKind, name: &'static str) -> Result<bool, SchemaError> {
    field(doc, entity, name)?
        .as_bool()
        .ok_or_else(|| invalid(entity, name, FieldType::Boolean))
}

/// Reads an enumerated text field.
///
/// The wire name is decoded through the type's serde representation; `alias`
/// then gets a chance at display labels. Anything else resolves to
/// `fallback` and is logged. Only a missing or non-text field is an error.
pub fn read_enum<T>(
    doc: &Document,
    entity: EntityKind,
    name: &'static str,
    alias: fn(&str) -> Option<T>,
    fallback: T,
) -> Result<T, SchemaError>
where
    T: DeserializeOwned,
{
    let value = field(doc, entity, name)?;
    let raw = value
        .as_str()
        .ok_or_else(|| invalid(entity, name, FieldType::Text))?;
    let parsed = T::deserialize(value).ok().or_else(|| alias(raw));
    Ok(parsed.unwrap_or_else(|| {
        warn!(
            "event=enum_fallback module=schema status=skip entity={} field={} value={:?}",
            entity.as_str(),
            name,
            raw
        );
        fallback
    }))
}

#[cfg(test)]
mod tests {
    use super::{read_enum, read_u32, read_u64};
    use crate::model::change::EntityKind;
    use crate::model::device::DeviceCategory;
    use crate::model::room::RoomType;
    use crate::model::solar_panel::Orientation;
    use crate::model::units::{EnergyUnit, TimeUnit};
    use crate::schema::{Document, SchemaError};
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn unknown_enum_value_falls_back() {
        let doc = doc(json!({ "ROOM_TYPE": "Ballroom" }));
        let parsed = read_enum(
            &doc,
            EntityKind::Room,
            "ROOM_TYPE",
            RoomType::parse,
            RoomType::Dummy,
        )
        .unwrap();
        assert_eq!(parsed, RoomType::Dummy);
    }

    #[test]
    fn enum_reads_wire_names_and_labels() {
        let doc = doc(json!({ "ROOM_TYPE": "LAUNDRY_ROOM", "LABEL": "Büro" }));
        fn no_alias(_: &str) -> Option<RoomType> {
            None
        }
        let wire = read_enum(&doc, EntityKind::Room, "ROOM_TYPE", no_alias, RoomType::Dummy);
        assert_eq!(wire.unwrap(), RoomType::LaundryRoom);

        let label = read_enum(&doc, EntityKind::Room, "LABEL", RoomType::parse, RoomType::Dummy);
        assert_eq!(label.unwrap(), RoomType::Office);
    }

    #[test]
    fn serde_names_match_the_wire_names() {
        fn check<T>(variants: &[T], as_str: fn(T) -> &'static str)
        where
            T: Copy + PartialEq + std::fmt::Debug + serde::Serialize + serde::de::DeserializeOwned,
        {
            for &variant in variants {
                let name = as_str(variant);
                assert_eq!(serde_json::to_value(variant).unwrap(), json!(name));
                let doc = doc(json!({ "FIELD": name }));
                let read = read_enum(&doc, EntityKind::Device, "FIELD", |_| None, variants[0]);
                assert_eq!(read.unwrap(), variant);
            }
        }

        check(&RoomType::ALL, RoomType::as_str);
        check(&DeviceCategory::ALL, DeviceCategory::as_str);
        check(&Orientation::ALL, Orientation::as_str);
        check(&TimeUnit::ALL, TimeUnit::as_str);
        check(&EnergyUnit::ALL, EnergyUnit::as_str);
    }

    #[test]
    fn non_text_enum_value_is_an_error() {
        let doc = doc(json!({ "ROOM_TYPE": 4 }));
        let result = read_enum(
            &doc,
            EntityKind::Room,
            "ROOM_TYPE",
            RoomType::parse,
            RoomType::Dummy,
        );
        assert!(matches!(result, Err(SchemaError::InvalidType { .. })));
    }

    #[test]
    fn numbers_truncate_and_reject_negatives() {
        let doc = doc(json!({ "USAGE": 12.9, "POWER": -3, "ROOM_ID": 2 }));
        assert_eq!(read_u64(&doc, EntityKind::Device, "USAGE").unwrap(), 12);
        assert!(read_u64(&doc, EntityKind::Device, "POWER").is_err());
        assert_eq!(read_u32(&doc, EntityKind::Room, "ROOM_ID").unwrap(), 2);
        assert!(matches!(
            read_u32(&doc, EntityKind::Room, "ROOM_NAME"),
            Err(SchemaError::MissingField { .. })
        ));
    }
}
