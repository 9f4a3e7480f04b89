//! Static type table for Rust types.

use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use indexmap::IndexMap;

use super::Type;
use crate::value::Value;

/// A Rust type that can describe itself and lower its values into [`Value`].
///
/// Implemented for the standard scalar and container types. Application
/// structs implement it by hand:
///
/// ```
/// use nebula_rules::prelude::*;
///
/// struct User {
///     name: String,
///     tags: Vec<String>,
/// }
///
/// impl Reflect for User {
///     fn type_of() -> Type {
///         Type::structure(
///             "User",
///             vec![
///                 Field::new("name", String::type_of()).rule("@string[1,32]"),
///                 Field::new("tags", Vec::<String>::type_of()).rule("@slice<@string[1,]>[,8]"),
///             ],
///         )
///     }
///
///     fn to_value(&self) -> Value {
///         Value::structure([
///             ("name", self.name.to_value()),
///             ("tags", self.tags.to_value()),
///         ])
///     }
/// }
///
/// let factory = Factory::builtin();
/// let user = User { name: String::new(), tags: vec!["a".into()] };
/// assert!(factory.validate(&user).is_err());
/// ```
pub trait Reflect {
    /// Describes the type.
    fn type_of() -> Type;

    /// Lowers a value.
    fn to_value(&self) -> Value;
}

macro_rules! reflect_int {
    ($($ty:ty => $ctor:ident, $variant:ident, $wide:ty);* $(;)?) => {
        $(
            impl Reflect for $ty {
                // BITS is at most 64 here.
                #[allow(clippy::cast_possible_truncation)]
                fn type_of() -> Type {
                    Type::$ctor(<$ty>::BITS as u8)
                }

                fn to_value(&self) -> Value {
                    Value::$variant(<$wide>::from(*self))
                }
            }
        )*
    };
}

reflect_int! {
    i8 => int, Int, i64;
    i16 => int, Int, i64;
    i32 => int, Int, i64;
    i64 => int, Int, i64;
    u8 => uint, Uint, u64;
    u16 => uint, Uint, u64;
    u32 => uint, Uint, u64;
    u64 => uint, Uint, u64;
}

impl Reflect for isize {
    fn type_of() -> Type {
        Type::int(64).named("int")
    }

    fn to_value(&self) -> Value {
        Value::Int(*self as i64)
    }
}

impl Reflect for usize {
    fn type_of() -> Type {
        Type::uint(64).named("uint")
    }

    fn to_value(&self) -> Value {
        Value::Uint(*self as u64)
    }
}

impl Reflect for bool {
    fn type_of() -> Type {
        Type::bool()
    }

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }
}

impl Reflect for f32 {
    fn type_of() -> Type {
        Type::float(32)
    }

    // Goes through the shortest decimal text so `1.1f32` becomes `1.1`,
    // not `1.100000023841858`.
    fn to_value(&self) -> Value {
        let widened = self.to_string().parse().unwrap_or(f64::from(*self));
        Value::Float(widened)
    }
}

impl Reflect for f64 {
    fn type_of() -> Type {
        Type::float(64)
    }

    fn to_value(&self) -> Value {
        Value::Float(*self)
    }
}

impl Reflect for String {
    fn type_of() -> Type {
        Type::string()
    }

    fn to_value(&self) -> Value {
        Value::String(self.clone())
    }
}

impl<T: Reflect> Reflect for Vec<T> {
    fn type_of() -> Type {
        Type::slice(T::type_of())
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Reflect::to_value).collect())
    }
}

impl<T: Reflect, const N: usize> Reflect for [T; N] {
    fn type_of() -> Type {
        Type::array(T::type_of(), N)
    }

    fn to_value(&self) -> Value {
        Value::List(self.iter().map(Reflect::to_value).collect())
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn type_of() -> Type {
        Type::pointer(T::type_of())
    }

    fn to_value(&self) -> Value {
        self.as_ref().map_or(Value::Null, Reflect::to_value)
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn type_of() -> Type {
        Type::pointer(T::type_of())
    }

    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<K: Reflect, V: Reflect, S: BuildHasher> Reflect for HashMap<K, V, S> {
    fn type_of() -> Type {
        Type::map(K::type_of(), V::type_of())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

impl<K: Reflect, V: Reflect> Reflect for BTreeMap<K, V> {
    fn type_of() -> Type {
        Type::map(K::type_of(), V::type_of())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

impl<K: Reflect, V: Reflect, S: BuildHasher> Reflect for IndexMap<K, V, S> {
    fn type_of() -> Type {
        Type::map(K::type_of(), V::type_of())
    }

    fn to_value(&self) -> Value {
        Value::Map(self.iter().map(|(k, v)| (k.to_value(), v.to_value())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_scalar_types() {
        assert_eq!(i8::type_of().name(), "int8");
        assert_eq!(u64::type_of().name(), "uint64");
        assert_eq!(usize::type_of().name(), "uint");
        assert_eq!(f32::type_of().name(), "float32");
        assert_eq!(String::type_of().kind(), Kind::String);
    }

    #[test]
    fn test_container_types() {
        assert_eq!(Vec::<i32>::type_of().name(), "[]int32");
        assert_eq!(<[u8; 4]>::type_of().name(), "[4]uint8");
        assert_eq!(Option::<String>::type_of().name(), "*string");
        assert_eq!(
            BTreeMap::<String, Vec<f64>>::type_of().name(),
            "map[string][]float64"
        );
    }

    #[test]
    fn test_f32_goes_through_text() {
        assert_eq!(1.1f32.to_value(), Value::Float(1.1));
    }

    #[test]
    fn test_values() {
        assert_eq!(Some(3u8).to_value(), Value::Uint(3));
        assert_eq!(Option::<u8>::None.to_value(), Value::Null);
        assert_eq!(
            vec![-1i16, 2].to_value(),
            Value::List(vec![Value::Int(-1), Value::Int(2)])
        );
        let map: BTreeMap<String, bool> = [("a".to_owned(), true)].into_iter().collect();
        assert_eq!(
            map.to_value(),
            Value::Map(vec![(Value::from("a"), Value::Bool(true))])
        );
    }
}
