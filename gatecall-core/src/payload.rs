//! # JSON <-> DynamicMessage
//!
//! Converts request bodies into messages of a method's input type and response messages back
//! into JSON, following the canonical Protobuf JSON mapping.
//!
//! Responses are rendered with every field present, so the shape of the JSON does not depend
//! on which fields the server happened to set: scalars, lists and maps carry their default
//! value, unset message fields and proto3 `optional` fields are rendered as `null`. Members of
//! a `oneof` are the exception and only appear when set.
use prost_reflect::{
    DeserializeOptions, DynamicMessage, FieldDescriptor, Kind, MessageDescriptor, ReflectMessage,
    SerializeOptions,
};
use serde_json::{Map, Value};

/// Well-known types have their own JSON representation and are left untouched.
const WELL_KNOWN_PACKAGE: &str = "google.protobuf.";

#[derive(Debug, thiserror::Error)]
#[error("JSON structure does not match Protobuf schema of '{message}': '{source}'")]
pub struct DecodeError {
    pub message: String,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, thiserror::Error)]
#[error("Failed to map '{message}' to JSON: '{source}'")]
pub struct EncodeError {
    pub message: String,
    #[source]
    pub source: serde_json::Error,
}

/// Decodes a JSON document into a message described by `desc`.
///
/// Unknown fields are rejected. An empty (or whitespace only) body yields the default message.
pub fn decode(desc: &MessageDescriptor, json: &[u8]) -> Result<DynamicMessage, DecodeError> {
    if json.iter().all(u8::is_ascii_whitespace) {
        return Ok(DynamicMessage::new(desc.clone()));
    }

    let map_err = |source| DecodeError {
        message: desc.full_name().to_string(),
        source,
    };

    let mut deserializer = serde_json::Deserializer::from_slice(json);
    let msg = DynamicMessage::deserialize_with_options(
        desc.clone(),
        &mut deserializer,
        &DeserializeOptions::new(),
    )
    .map_err(map_err)?;
    deserializer.end().map_err(map_err)?;

    Ok(msg)
}

/// Encodes `msg` as JSON, emitting every field of its descriptor.
pub fn encode(msg: &DynamicMessage) -> Result<Vec<u8>, EncodeError> {
    let desc = msg.descriptor();
    let map_err = |source| EncodeError {
        message: desc.full_name().to_string(),
        source,
    };

    let options = SerializeOptions::new().skip_default_fields(false);
    let value = msg
        .serialize_with_options(serde_json::value::Serializer, &options)
        .map_err(map_err)?;

    serde_json::to_vec(&complete(&desc, value)).map_err(map_err)
}

/// Rebuilds a serialized message in field order, adding `null` for every absent field.
fn complete(desc: &MessageDescriptor, value: Value) -> Value {
    let mut present = match value {
        Value::Object(present) => present,
        value => return value,
    };

    let mut fields = Map::new();
    for field in desc.fields() {
        let name = field.json_name();
        match present.remove(name) {
            Some(value) => {
                fields.insert(name.to_string(), complete_field(&field, value));
            }
            None if is_oneof_member(&field) => {}
            None => {
                fields.insert(name.to_string(), Value::Null);
            }
        }
    }
    fields.extend(present);

    Value::Object(fields)
}

fn complete_field(field: &FieldDescriptor, value: Value) -> Value {
    let Kind::Message(desc) = field.kind() else {
        return value;
    };

    if field.is_map() {
        let entry_value = desc.map_entry_value_field();
        return match value {
            Value::Object(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, complete_field(&entry_value, v)))
                    .collect(),
            ),
            value => value,
        };
    }

    if desc.full_name().starts_with(WELL_KNOWN_PACKAGE) {
        return value;
    }

    match value {
        Value::Array(items) if field.is_list() => Value::Array(
            items
                .into_iter()
                .map(|item| complete(&desc, item))
                .collect(),
        ),
        value => complete(&desc, value),
    }
}

/// Proto3 `optional` fields live in a synthetic oneof but are not oneof members.
fn is_oneof_member(field: &FieldDescriptor) -> bool {
    field.containing_oneof().is_some() && !field.field_descriptor_proto().proto3_optional()
}
