//! Value Translator
//!
//! Walks a guest value and rebuilds it in the host value space. Translation is
//! total: tags outside the known set, and guest accessors that fail part way,
//! both come out as `null`.
//!
//! Host objects keep the guest's key order as their property insertion order.

use serde_json::{Map, Value as JsonValue};
use tracing::warn;

use crate::guest::GuestValue;
use crate::types::GuestTag;


/// Translate a guest value into a host value
pub fn translate<V: GuestValue>(value: &V) -> JsonValue {
    match value.tag() {
        GuestTag::Symbol => match value.symbol_name() {
            Some(name) => JsonValue::String(name),
            None => degraded(GuestTag::Symbol),
        },
        GuestTag::False => JsonValue::Bool(false),
        GuestTag::Nil => JsonValue::Null,
        GuestTag::Fixnum => match value.integer() {
            Some(n) => JsonValue::from(n),
            None => degraded(GuestTag::Fixnum),
        },
        GuestTag::String => match value.string_bytes() {
            Some(bytes) => JsonValue::String(decode_string(bytes)),
            None => degraded(GuestTag::String),
        },
        GuestTag::Array => match value.elements() {
            Some(items) => JsonValue::Array(items.iter().map(translate).collect()),
            None => degraded(GuestTag::Array),
        },
        GuestTag::Hash => translate_hash(value),
        GuestTag::Other => JsonValue::Null,
    }
}

fn translate_hash<V: GuestValue>(hash: &V) -> JsonValue {
    let Some(keys) = hash.keys() else {
        return degraded(GuestTag::Hash);
    };

    let mut object = Map::new();
    for key in &keys {
        let name = property_key(&translate(key));
        let entry = match hash.lookup(key) {
            Some(value) => translate(&value),
            None => {
                warn!(key = %name, "guest hash lookup failed, using null");
                JsonValue::Null
            }
        };
        // Re-inserting an existing name keeps its original position
        object.insert(name, entry);
    }

    JsonValue::Object(object)
}

fn degraded(tag: GuestTag) -> JsonValue {
    warn!(%tag, "guest accessor failed during translation, using null");
    JsonValue::Null
}

/// Decode guest string bytes, replacing invalid UTF-8 sequences
fn decode_string(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(e) => {
            warn!("guest string is not valid UTF-8, decoding lossily");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

/// Coerce a translated key into a property name the way JS `ToString` does
pub fn property_key(key: &JsonValue) -> String {
    match key {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::Null => String::new(),
                other => property_key(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => "[object Object]".to_string(),
    }
}
