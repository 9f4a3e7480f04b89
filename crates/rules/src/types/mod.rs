//! Type descriptors
//!
//! The engine never inspects Rust types directly. Each target type is
//! described by a [`Type`]: its kind, element/key types, struct fields with
//! their tags, an optional [`TextCodec`], and an optional zero predicate.
//! [`Reflect`] builds descriptors for standard Rust types.

mod codec;
mod reflect;
mod tag;

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

pub use codec::{CodecError, StringCodec, TextCodec};
pub use reflect::Reflect;
pub use tag::{StructTag, TagError};

use crate::value::Value;

// ============================================================================
// KIND
// ============================================================================

/// The shape of a type, without its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Bool,
    Int,
    Uint,
    Float,
    String,
    Slice,
    Array,
    Map,
    Struct,
    Pointer,
    Any,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Slice => "slice",
            Self::Array => "array",
            Self::Map => "map",
            Self::Struct => "struct",
            Self::Pointer => "pointer",
            Self::Any => "any",
        };
        f.write_str(name)
    }
}

/// A type with its parameters.
#[derive(Debug, Clone)]
pub enum TypeKind {
    Bool,
    Int { bits: u8 },
    Uint { bits: u8 },
    Float { bits: u8 },
    String,
    Slice(Type),
    Array(Type, usize),
    Map(Type, Type),
    Struct(Vec<Field>),
    Pointer(Type),
    Any,
}

// ============================================================================
// FIELD
// ============================================================================

/// A struct field.
#[derive(Debug, Clone)]
pub struct Field {
    /// Field name, used as the path segment unless a `name` tag overrides it.
    pub name: String,
    /// Field type.
    pub ty: Type,
    /// Field annotations.
    pub tag: StructTag,
    /// Anonymous embedded field; flattened into the parent when untagged.
    pub embedded: bool,
}

impl Field {
    /// Creates an untagged field.
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            tag: StructTag::new(),
            embedded: false,
        }
    }

    /// Creates an embedded field. Its name is the embedded type's name.
    pub fn embedded(ty: Type) -> Self {
        let name = ty.indirect().short_name().into_owned();
        Self {
            name,
            ty,
            tag: StructTag::new(),
            embedded: true,
        }
    }

    /// Replaces the tag.
    #[must_use]
    pub fn with_tag(mut self, tag: StructTag) -> Self {
        self.tag = tag;
        self
    }

    /// Sets the `validate` tag.
    #[must_use]
    pub fn rule(mut self, rule: impl Into<String>) -> Self {
        self.tag = self.tag.with("validate", rule);
        self
    }
}

// ============================================================================
// TYPE
// ============================================================================

#[derive(Clone)]
struct TypeInner {
    name: Option<String>,
    kind: TypeKind,
    text_codec: Option<Arc<dyn TextCodec>>,
    zero_check: Option<fn(&Value) -> bool>,
}

/// A cheaply clonable type descriptor.
#[derive(Clone)]
pub struct Type(Arc<TypeInner>);

impl Type {
    /// Creates a descriptor from its kind.
    #[must_use]
    pub fn new(kind: TypeKind) -> Self {
        Self(Arc::new(TypeInner {
            name: None,
            kind,
            text_codec: None,
            zero_check: None,
        }))
    }

    #[must_use]
    pub fn bool() -> Self {
        Self::new(TypeKind::Bool)
    }

    #[must_use]
    pub fn int(bits: u8) -> Self {
        Self::new(TypeKind::Int { bits })
    }

    #[must_use]
    pub fn uint(bits: u8) -> Self {
        Self::new(TypeKind::Uint { bits })
    }

    #[must_use]
    pub fn float(bits: u8) -> Self {
        Self::new(TypeKind::Float { bits })
    }

    #[must_use]
    pub fn string() -> Self {
        Self::new(TypeKind::String)
    }

    #[must_use]
    pub fn slice(elem: Type) -> Self {
        Self::new(TypeKind::Slice(elem))
    }

    #[must_use]
    pub fn array(elem: Type, len: usize) -> Self {
        Self::new(TypeKind::Array(elem, len))
    }

    #[must_use]
    pub fn map(key: Type, elem: Type) -> Self {
        Self::new(TypeKind::Map(key, elem))
    }

    #[must_use]
    pub fn pointer(elem: Type) -> Self {
        Self::new(TypeKind::Pointer(elem))
    }

    #[must_use]
    pub fn any() -> Self {
        Self::new(TypeKind::Any)
    }

    /// A named struct type.
    pub fn structure(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self::new(TypeKind::Struct(fields)).named(name)
    }

    /// Sets the canonical name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.0).name = Some(name.into());
        self
    }

    /// Attaches a text codec.
    #[must_use]
    pub fn with_text_codec(mut self, codec: Arc<dyn TextCodec>) -> Self {
        Arc::make_mut(&mut self.0).text_codec = Some(codec);
        self
    }

    /// Replaces the emptiness check.
    #[must_use]
    pub fn with_zero_check(mut self, check: fn(&Value) -> bool) -> Self {
        Arc::make_mut(&mut self.0).zero_check = Some(check);
        self
    }

    /// The fieldless kind.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match &self.0.kind {
            TypeKind::Bool => Kind::Bool,
            TypeKind::Int { .. } => Kind::Int,
            TypeKind::Uint { .. } => Kind::Uint,
            TypeKind::Float { .. } => Kind::Float,
            TypeKind::String => Kind::String,
            TypeKind::Slice(_) => Kind::Slice,
            TypeKind::Array(..) => Kind::Array,
            TypeKind::Map(..) => Kind::Map,
            TypeKind::Struct(_) => Kind::Struct,
            TypeKind::Pointer(_) => Kind::Pointer,
            TypeKind::Any => Kind::Any,
        }
    }

    /// The kind with its parameters.
    #[must_use]
    pub fn type_kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Element type of slices, arrays, maps and pointers.
    #[must_use]
    pub fn elem(&self) -> Option<&Type> {
        match &self.0.kind {
            TypeKind::Slice(elem)
            | TypeKind::Array(elem, _)
            | TypeKind::Map(_, elem)
            | TypeKind::Pointer(elem) => Some(elem),
            _ => None,
        }
    }

    /// Key type of maps.
    #[must_use]
    pub fn key(&self) -> Option<&Type> {
        match &self.0.kind {
            TypeKind::Map(key, _) => Some(key),
            _ => None,
        }
    }

    /// Static length of arrays.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        match &self.0.kind {
            TypeKind::Array(_, len) => Some(*len),
            _ => None,
        }
    }

    /// Struct fields; empty for every other kind.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        match &self.0.kind {
            TypeKind::Struct(fields) => fields,
            _ => &[],
        }
    }

    /// Bit width of numeric types.
    #[must_use]
    pub fn bits(&self) -> Option<u8> {
        match &self.0.kind {
            TypeKind::Int { bits } | TypeKind::Uint { bits } | TypeKind::Float { bits } => {
                Some(*bits)
            }
            _ => None,
        }
    }

    /// The text codec, if any.
    #[must_use]
    pub fn text_codec(&self) -> Option<&Arc<dyn TextCodec>> {
        self.0.text_codec.as_ref()
    }

    /// The type-provided emptiness check, if any.
    #[must_use]
    pub fn zero_check(&self) -> Option<fn(&Value) -> bool> {
        self.0.zero_check
    }

    /// Strips every pointer layer.
    #[must_use]
    pub fn indirect(&self) -> Type {
        let mut ty = self;
        while let TypeKind::Pointer(elem) = &ty.0.kind {
            ty = elem;
        }
        ty.clone()
    }

    /// Emptiness under this type: the zero predicate if set, otherwise
    /// [`Value::is_zero`].
    #[must_use]
    pub fn is_zero(&self, value: &Value) -> bool {
        match self.0.zero_check {
            Some(check) => check(value),
            None => value.is_zero(),
        }
    }

    /// Canonical type name, e.g. `int64`, `[]string`, `map[string]*User`.
    #[must_use]
    pub fn name(&self) -> Cow<'_, str> {
        if let Some(name) = &self.0.name {
            return Cow::Borrowed(name);
        }
        match &self.0.kind {
            TypeKind::Bool => Cow::Borrowed("bool"),
            TypeKind::Int { bits } => Cow::Owned(format!("int{bits}")),
            TypeKind::Uint { bits } => Cow::Owned(format!("uint{bits}")),
            TypeKind::Float { bits } => Cow::Owned(format!("float{bits}")),
            TypeKind::String => Cow::Borrowed("string"),
            TypeKind::Slice(elem) => Cow::Owned(format!("[]{}", elem.name())),
            TypeKind::Array(elem, len) => Cow::Owned(format!("[{len}]{}", elem.name())),
            TypeKind::Map(key, elem) => Cow::Owned(format!("map[{}]{}", key.name(), elem.name())),
            TypeKind::Pointer(elem) => Cow::Owned(format!("*{}", elem.name())),
            TypeKind::Any => Cow::Borrowed("any"),
            TypeKind::Struct(fields) => {
                let fields: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} {}", f.name, f.ty.name()))
                    .collect();
                Cow::Owned(format!("struct {{ {} }}", fields.join("; ")))
            }
        }
    }

    /// Last `::` segment of the name, used for embedded field names.
    #[must_use]
    pub fn short_name(&self) -> Cow<'_, str> {
        match self.name() {
            Cow::Borrowed(name) => Cow::Borrowed(name.rsplit("::").next().unwrap_or(name)),
            Cow::Owned(name) => Cow::Owned(name.rsplit("::").next().unwrap_or(name.as_str()).to_owned()),
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Type")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("text_codec", &self.0.text_codec.is_some())
            .finish()
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
