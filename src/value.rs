//! Setting values and typed access
//!
//! Values stored in the cache are a closed set of variants. Reads go through
//! [`SettingKind`], which defines exactly which stored variants can satisfy a
//! requested Rust type.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// A single setting value
///
/// Serializes untagged, so `{"volume": 0.8, "muted": false}` is the natural
/// encoding in every codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<SettingValue>),
    Map(BTreeMap<String, SettingValue>),
}

impl SettingValue {
    /// Short lowercase name of the variant, used in type mismatch errors
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            SettingValue::Bool(_) => "bool",
            SettingValue::Int(_) => "int",
            SettingValue::Float(_) => "float",
            SettingValue::String(_) => "string",
            SettingValue::List(_) => "list",
            SettingValue::Map(_) => "map",
        }
    }

    /// Reject values that cannot be persisted losslessly.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidValue` if any float (at any depth) is NaN or infinite.
    pub fn validate(&self, key: &str) -> Result<()> {
        match self {
            SettingValue::Float(f) if !f.is_finite() => Err(Error::InvalidValue {
                key: key.to_string(),
                reason: format!("float {f} is not finite"),
            }),
            SettingValue::List(items) => items.iter().try_for_each(|v| v.validate(key)),
            SettingValue::Map(map) => map.values().try_for_each(|v| v.validate(key)),
            _ => Ok(()),
        }
    }

    /// Convert from a JSON value.
    ///
    /// Returns `None` for `null`. Nulls nested inside lists and maps are dropped.
    #[must_use]
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::Bool(b) => Some(SettingValue::Bool(b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(SettingValue::Int(i)),
                None => n.as_f64().map(SettingValue::Float),
            },
            Value::String(s) => Some(SettingValue::String(s)),
            Value::Array(items) => Some(SettingValue::List(
                items.into_iter().filter_map(SettingValue::from_json).collect(),
            )),
            Value::Object(map) => Some(SettingValue::Map(
                map.into_iter()
                    .filter_map(|(k, v)| SettingValue::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }

    /// Convert from a JSON value that must be stored exactly as given.
    ///
    /// Unlike [`from_json`](Self::from_json), nothing is dropped or rounded: a
    /// null at any depth, or an integer above `i64::MAX`, is refused with the
    /// reason.
    pub(crate) fn from_json_exact(value: Value) -> std::result::Result<Self, String> {
        match value {
            Value::Null => Err("null cannot be stored".into()),
            Value::Number(n) if n.is_u64() && !n.is_i64() => Err(format!(
                "integer {n} exceeds the largest storable integer {}",
                i64::MAX
            )),
            Value::Array(items) => items
                .into_iter()
                .map(Self::from_json_exact)
                .collect::<std::result::Result<_, _>>()
                .map(SettingValue::List),
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| Self::from_json_exact(v).map(|v| (k, v)))
                .collect::<std::result::Result<_, _>>()
                .map(SettingValue::Map),
            scalar => Self::from_json(scalar).ok_or_else(|| "null cannot be stored".into()),
        }
    }

    /// Convert into a JSON value.
    ///
    /// Non-finite floats (which `validate` keeps out of the cache) become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Int(i) => Value::from(*i),
            SettingValue::Float(f) => serde_json::Number::from_f64(*f)
                .map_or(Value::Null, Value::Number),
            SettingValue::String(s) => Value::String(s.clone()),
            SettingValue::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            SettingValue::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    fn as_integral(&self) -> Option<i64> {
        match self {
            SettingValue::Int(i) => Some(*i),
            // i64::MAX as f64 rounds up to 2^63, so the upper bound is exclusive
            SettingValue::Float(f)
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64 =>
            {
                Some(*f as i64)
            }
            _ => None,
        }
    }
}

macro_rules! impl_from_for_setting_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SettingValue {
                fn from(value: $ty) -> Self {
                    SettingValue::$variant(value.into())
                }
            }
        )*
    };
}

impl_from_for_setting_value! {
    bool => Bool,
    i32 => Int,
    i64 => Int,
    u32 => Int,
    f32 => Float,
    f64 => Float,
    String => String,
    &str => String,
    BTreeMap<String, SettingValue> => Map,
    Vec<SettingValue> => List,
}

// =============================================================================
// Typed Access
// =============================================================================

/// Types that can be written to the cache
pub trait IntoSetting {
    /// Convert this value for storage
    ///
    /// # Errors
    ///
    /// Returns the reason when the value would not read back unchanged
    /// (a `u64` above `i64::MAX`, at any depth).
    fn into_setting(self) -> std::result::Result<SettingValue, String>;
}

/// Rust types that can be read from the cache
///
/// `from_setting` returns `None` when the stored variant cannot satisfy the
/// type; the cache turns that into `Error::TypeMismatch`.
///
/// | stored  | accepted by |
/// |---------|-------------|
/// | `Bool`  | `bool` |
/// | `Int`   | integers (range checked), floats |
/// | `Float` | floats, integers when integral and in range |
/// | `String`| `String` |
/// | `List`  | `Vec<T>` when every element converts |
/// | `Map`   | `BTreeMap<String, T>` / `HashMap<String, T>` when every value converts |
pub trait SettingKind: IntoSetting + Sized {
    /// Name reported as `expected` in type mismatch errors
    const NAME: &'static str;

    /// Coerce a stored value into this type
    fn from_setting(value: &SettingValue) -> Option<Self>;
}

impl IntoSetting for SettingValue {
    fn into_setting(self) -> std::result::Result<SettingValue, String> {
        Ok(self)
    }
}

impl SettingKind for SettingValue {
    const NAME: &'static str = "any";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        Some(value.clone())
    }
}

macro_rules! impl_into_setting_via_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoSetting for $ty {
                fn into_setting(self) -> std::result::Result<SettingValue, String> {
                    Ok(SettingValue::from(self))
                }
            }
        )*
    };
}

impl_into_setting_via_from!(bool, i32, i64, u32, f32, f64, String, &str);

impl SettingKind for bool {
    const NAME: &'static str = "bool";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

macro_rules! impl_setting_kind_for_int {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl SettingKind for $ty {
                const NAME: &'static str = $name;

                fn from_setting(value: &SettingValue) -> Option<Self> {
                    value.as_integral().and_then(|i| <$ty>::try_from(i).ok())
                }
            }
        )*
    };
}

impl_setting_kind_for_int! {
    i32 => "i32",
    i64 => "i64",
    u32 => "u32",
    u64 => "u64",
}

impl IntoSetting for u64 {
    fn into_setting(self) -> std::result::Result<SettingValue, String> {
        i64::try_from(self)
            .map(SettingValue::Int)
            .map_err(|_| format!("u64 {self} exceeds the largest storable integer {}", i64::MAX))
    }
}

impl SettingKind for f64 {
    const NAME: &'static str = "f64";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Float(f) => Some(*f),
            SettingValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl SettingKind for f32 {
    const NAME: &'static str = "f32";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        f64::from_setting(value)
            .map(|f| f as f32)
            .filter(|f| f.is_finite())
    }
}

impl SettingKind for String {
    const NAME: &'static str = "string";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: IntoSetting> IntoSetting for Vec<T> {
    fn into_setting(self) -> std::result::Result<SettingValue, String> {
        self.into_iter()
            .map(T::into_setting)
            .collect::<std::result::Result<_, _>>()
            .map(SettingValue::List)
    }
}

impl<T: SettingKind> SettingKind for Vec<T> {
    const NAME: &'static str = "list";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::List(items) => items.iter().map(T::from_setting).collect(),
            _ => None,
        }
    }
}

impl<T: IntoSetting> IntoSetting for BTreeMap<String, T> {
    fn into_setting(self) -> std::result::Result<SettingValue, String> {
        self.into_iter()
            .map(|(k, v)| v.into_setting().map(|v| (k, v)))
            .collect::<std::result::Result<_, _>>()
            .map(SettingValue::Map)
    }
}

impl<T: SettingKind> SettingKind for BTreeMap<String, T> {
    const NAME: &'static str = "map";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Map(map) => map
                .iter()
                .map(|(k, v)| T::from_setting(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => None,
        }
    }
}

impl<T: IntoSetting> IntoSetting for HashMap<String, T> {
    fn into_setting(self) -> std::result::Result<SettingValue, String> {
        self.into_iter()
            .map(|(k, v)| v.into_setting().map(|v| (k, v)))
            .collect::<std::result::Result<_, _>>()
            .map(SettingValue::Map)
    }
}

impl<T: SettingKind> SettingKind for HashMap<String, T> {
    const NAME: &'static str = "map";

    fn from_setting(value: &SettingValue) -> Option<Self> {
        match value {
            SettingValue::Map(map) => map
                .iter()
                .map(|(k, v)| T::from_setting(v).map(|v| (k.clone(), v)))
                .collect(),
            _ => None,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
