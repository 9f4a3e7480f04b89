//! Dynamic values inspected by validators.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::types::{CodecError, Type, TypeKind};

/// A dynamically typed value.
///
/// Pointers are transparent: `Null` is the nil pointer and any other variant
/// is the pointee.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    /// Map entries in insertion order; keys may be any value.
    Map(Vec<(Value, Value)>),
    /// Struct fields by name.
    Struct(IndexMap<String, Value>),
}

static NULL: Value = Value::Null;

impl Value {
    /// Builds a struct value from `(name, value)` pairs.
    pub fn structure<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Converts any serializable value through its JSON form.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::from)
    }

    /// Zero check: null, `false`, `0`, `""`, and empty containers.
    /// A struct only counts as empty when it has no fields at all.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(b) => !b,
            Self::Int(i) => *i == 0,
            Self::Uint(u) => *u == 0,
            Self::Float(f) => *f == 0.0,
            Self::String(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Map(entries) => entries.is_empty(),
            Self::Struct(fields) => fields.is_empty(),
        }
    }

    /// Short name of the variant, used in error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Struct(_) => "struct",
        }
    }

    /// The string content, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up a struct field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        match self {
            Self::Struct(fields) => fields.get(field),
            _ => None,
        }
    }

    /// Converts to JSON. Map keys become their text; non-finite floats
    /// become `null`.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Self::Null => Json::Null,
            Self::Bool(b) => Json::Bool(*b),
            Self::Int(i) => Json::from(*i),
            Self::Uint(u) => Json::from(*u),
            Self::Float(f) => serde_json::Number::from_f64(*f).map_or(Json::Null, Json::Number),
            Self::String(s) => Json::String(s.clone()),
            Self::List(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Self::Struct(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Materializes default text as a value of `ty`.
    ///
    /// A text codec on the type wins. Otherwise scalars parse natively
    /// (integers are checked against the bit width), strings are taken
    /// verbatim, and composites parse as JSON.
    pub fn parse_text(text: &str, ty: &Type) -> Result<Self, CodecError> {
        if let Some(codec) = ty.text_codec() {
            return codec.unmarshal_text(text);
        }

        let ty = ty.indirect();
        if let Some(codec) = ty.text_codec() {
            return codec.unmarshal_text(text);
        }

        let invalid = |what: &str| CodecError::new(format!("`{text}` is not a valid {what}"));

        match ty.type_kind() {
            TypeKind::Bool => match text.trim() {
                "true" | "1" => Ok(Self::Bool(true)),
                "false" | "0" => Ok(Self::Bool(false)),
                _ => Err(invalid("bool")),
            },
            TypeKind::Int { bits } => {
                let n: i64 = text.trim().parse().map_err(|_| invalid("integer"))?;
                if crate::validators::int_fits(n, *bits) {
                    Ok(Self::Int(n))
                } else {
                    Err(invalid(&format!("int{bits}")))
                }
            }
            TypeKind::Uint { bits } => {
                let n: u64 = text.trim().parse().map_err(|_| invalid("unsigned integer"))?;
                if crate::validators::uint_fits(n, *bits) {
                    Ok(Self::Uint(n))
                } else {
                    Err(invalid(&format!("uint{bits}")))
                }
            }
            TypeKind::Float { .. } => match text.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(Self::Float(f)),
                _ => Err(invalid("float")),
            },
            TypeKind::String => Ok(Self::String(text.to_owned())),
            TypeKind::Any => Ok(serde_json::from_str::<serde_json::Value>(text)
                .map_or_else(|_| Self::String(text.to_owned()), Self::from)),
            TypeKind::Slice(_) | TypeKind::Array(..) | TypeKind::Map(..) | TypeKind::Struct(_) => {
                serde_json::from_str::<serde_json::Value>(text)
                    .map(Self::from)
                    .map_err(|e| CodecError::new(format!("`{text}` is not valid JSON: {e}")))
            }
            TypeKind::Pointer(_) => Err(invalid("value")),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => b.fmt(f),
            Self::Int(i) => i.fmt(f),
            Self::Uint(u) => u.fmt(f),
            Self::Float(x) => x.fmt(f),
            Self::String(s) => f.write_str(s),
            Self::List(_) | Self::Map(_) | Self::Struct(_) => self.to_json().fmt(f),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        use serde_json::Value as Json;

        match json {
            Json::Null => Self::Null,
            Json::Bool(b) => Self::Bool(b),
            Json::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Self::Uint(u)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Json::String(s) => Self::String(s),
            Json::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Json::Object(fields) => {
                Self::Struct(fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident as $wide:ty),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(<$wide>::from(v))
                }
            }
        )*
    };
}

value_from! {
    bool => Bool as bool,
    i8 => Int as i64,
    i16 => Int as i64,
    i32 => Int as i64,
    i64 => Int as i64,
    u8 => Uint as u64,
    u16 => Uint as u64,
    u32 => Uint as u64,
    u64 => Uint as u64,
    f64 => Float as f64,
    String => String as String,
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Self::Float(v.to_string().parse().unwrap_or(f64::from(v)))
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ============================================================================
// SLOT
// ============================================================================

/// The place a validator is looking at.
///
/// Read-only validation walks `Shared` slots. Validation with default
/// injection walks `Exclusive` slots, and a missing struct field becomes a
/// `Vacant` slot so a default can be inserted without touching anything else.
pub(crate) enum Slot<'a> {
    Shared(&'a Value),
    Exclusive(&'a mut Value),
    Vacant(&'a mut IndexMap<String, Value>, String),
}

impl<'a> Slot<'a> {
    pub(crate) fn value(&self) -> &Value {
        match self {
            Self::Shared(v) => v,
            Self::Exclusive(v) => v,
            Self::Vacant(..) => &NULL,
        }
    }

    /// Writes `value` into the slot. Returns false for read-only slots.
    pub(crate) fn set(&mut self, value: Value) -> bool {
        match self {
            Self::Shared(_) => false,
            Self::Exclusive(v) => {
                **v = value;
                true
            }
            Self::Vacant(fields, name) => {
                fields.insert(std::mem::take(name), value);
                true
            }
        }
    }

    pub(crate) fn reborrow(&mut self) -> Slot<'_> {
        match self {
            Self::Shared(v) => Slot::Shared(v),
            Self::Exclusive(v) => Slot::Exclusive(v),
            Self::Vacant(fields, name) => Slot::Vacant(fields, name.clone()),
        }
    }

    /// The named struct field; missing fields read as `Null`.
    pub(crate) fn field(&mut self, name: &str) -> Slot<'_> {
        match self {
            Self::Shared(v) => Slot::Shared(v.get(name).unwrap_or(&NULL)),
            Self::Exclusive(v) => match &mut **v {
                Value::Struct(fields) => {
                    if fields.contains_key(name) {
                        Slot::Exclusive(fields.entry(name.to_owned()).or_insert(Value::Null))
                    } else {
                        Slot::Vacant(fields, name.to_owned())
                    }
                }
                _ => Slot::Shared(&NULL),
            },
            Self::Vacant(..) => Slot::Shared(&NULL),
        }
    }

    /// The nested struct stored under an embedded field, or this slot itself
    /// when the payload carries the embedded fields inline.
    pub(crate) fn embedded(&mut self, name: &str) -> Slot<'_> {
        let nested = matches!(self.value().get(name), Some(Value::Struct(_)));
        if !nested {
            return self.reborrow();
        }
        self.field(name)
    }

    /// Calls `f` on every list item.
    pub(crate) fn for_each_item(&mut self, mut f: impl FnMut(usize, Slot<'_>)) {
        match self {
            Self::Shared(Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    f(i, Slot::Shared(item));
                }
            }
            Self::Exclusive(v) => {
                if let Value::List(items) = &mut **v {
                    for (i, item) in items.iter_mut().enumerate() {
                        f(i, Slot::Exclusive(item));
                    }
                }
            }
            _ => {}
        }
    }

    /// Calls `f` on every map entry. JSON objects count as maps with string
    /// keys.
    pub(crate) fn for_each_entry(&mut self, mut f: impl FnMut(&Value, Slot<'_>)) {
        match self {
            Self::Shared(Value::Map(entries)) => {
                for (k, v) in entries {
                    f(k, Slot::Shared(v));
                }
            }
            Self::Shared(Value::Struct(fields)) => {
                for (k, v) in fields {
                    f(&Value::String(k.clone()), Slot::Shared(v));
                }
            }
            Self::Exclusive(value) => match &mut **value {
                Value::Map(entries) => {
                    for (k, v) in entries.iter_mut() {
                        f(k, Slot::Exclusive(v));
                    }
                }
                Value::Struct(fields) => {
                    for (k, v) in fields.iter_mut() {
                        f(&Value::String(k.clone()), Slot::Exclusive(v));
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_is_zero() {
        assert!(Value::Null.is_zero());
        assert!(Value::from(0).is_zero());
        assert!(Value::from(0.0).is_zero());
        assert!(Value::from("").is_zero());
        assert!(Value::List(vec![]).is_zero());
        assert!(Value::Struct(IndexMap::new()).is_zero());
        assert!(!Value::structure([("a", Value::from(0))]).is_zero());
        assert!(!Value::from(true).is_zero());
    }

    #[test]
    fn test_json_conversion() {
        let value = Value::from(json!({"a": 1, "b": [true, "x"], "c": 1.5, "d": u64::MAX}));
        assert_eq!(value.get("a"), Some(&Value::Int(1)));
        assert_eq!(value.get("d"), Some(&Value::Uint(u64::MAX)));
        assert_eq!(
            value.get("b"),
            Some(&Value::List(vec![Value::Bool(true), Value::from("x")]))
        );
        assert_eq!(
            value.to_json(),
            json!({"a": 1, "b": [true, "x"], "c": 1.5, "d": u64::MAX})
        );
    }

    #[test]
    fn test_from_serialize() {
        #[derive(serde::Serialize)]
        struct Payload {
            name: &'static str,
            size: u8,
        }

        let value = Value::from_serialize(&Payload { name: "n", size: 3 }).unwrap();
        assert_eq!(
            value,
            Value::structure([("name", Value::from("n")), ("size", Value::Int(3))])
        );
    }

    #[test]
    fn test_parse_text_scalars() {
        assert_eq!(Value::parse_text("12", &Type::int(8)).unwrap(), Value::Int(12));
        assert!(Value::parse_text("300", &Type::int(8)).is_err());
        assert!(Value::parse_text("-1", &Type::uint(64)).is_err());
        assert_eq!(
            Value::parse_text("2.5", &Type::pointer(Type::float(64))).unwrap(),
            Value::Float(2.5)
        );
        assert_eq!(
            Value::parse_text(" a ", &Type::string()).unwrap(),
            Value::from(" a ")
        );
        assert_eq!(Value::parse_text("true", &Type::bool()).unwrap(), Value::Bool(true));
        assert!(Value::parse_text("inf", &Type::float(64)).is_err());
    }

    #[test]
    fn test_parse_text_composites() {
        assert_eq!(
            Value::parse_text("[1,2]", &Type::slice(Type::int(64))).unwrap(),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
        assert!(Value::parse_text("[1,", &Type::slice(Type::int(64))).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from("a").to_string(), "a");
        assert_eq!(Value::List(vec![Value::from(1)]).to_string(), "[1]");
    }

    #[test]
    fn test_vacant_slot_inserts_only_on_set() {
        let mut value = Value::structure([("a", Value::from(1))]);
        {
            let mut root = Slot::Exclusive(&mut value);
            let slot = root.field("b");
            assert_eq!(slot.value(), &Value::Null);
        }
        assert_eq!(value.get("b"), None);

        {
            let mut root = Slot::Exclusive(&mut value);
            let mut slot = root.field("b");
            assert!(slot.set(Value::from(2)));
        }
        assert_eq!(value.get("b"), Some(&Value::Int(2)));
    }

    #[test]
    fn test_exclusive_slot_writes_present_field() {
        let mut value = Value::structure([("a", Value::Null), ("b", Value::from(1))]);
        {
            let mut root = Slot::Exclusive(&mut value);
            let mut slot = root.field("a");
            assert_eq!(slot.value(), &Value::Null);
            assert!(slot.set(Value::from("x")));
        }
        assert_eq!(value.get("a"), Some(&Value::from("x")));
        assert_eq!(value.get("b"), Some(&Value::Int(1)));

        let mut scalar = Value::from(3);
        let mut root = Slot::Exclusive(&mut scalar);
        assert!(!root.field("a").set(Value::from(1)));
    }

    #[test]
    fn test_shared_slot_is_read_only() {
        let value = Value::structure([("a", Value::Null)]);
        let mut root = Slot::Shared(&value);
        assert!(!root.field("a").set(Value::from(1)));
    }

    #[test]
    fn test_embedded_slot_falls_back_to_parent() {
        let nested = Value::structure([("Base", Value::structure([("id", Value::from(1))]))]);
        let mut root = Slot::Shared(&nested);
        assert_eq!(root.embedded("Base").value().get("id"), Some(&Value::Int(1)));

        let flat = Value::structure([("id", Value::from(2))]);
        let mut root = Slot::Shared(&flat);
        assert_eq!(root.embedded("Base").value().get("id"), Some(&Value::Int(2)));
    }
}
