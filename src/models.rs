// src/models.rs

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::constants::{LONG_PREFIX, SHORT_PREFIX};

// --- VALUE MODEL ---

/// The semantic type of an option. Converters are registered per value type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Text,
    Bool,
    Integer,
    Float,
    Path,
    /// A comma-separated list of text items.
    List,
    /// A user-defined type tag, resolved by a converter registered under the same name.
    Custom(String),
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Bool => f.write_str("bool"),
            Self::Integer => f.write_str("integer"),
            Self::Float => f.write_str("float"),
            Self::Path => f.write_str("path"),
            Self::List => f.write_str("list"),
            Self::Custom(name) => f.write_str(name),
        }
    }
}

/// A typed option value, produced by a converter or read back from an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Bool(bool),
    Integer(i64),
    Float(f64),
    Path(PathBuf),
    List(Vec<String>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(x) => write!(f, "{}", x),
            Self::Path(p) => write!(f, "{}", p.display()),
            Self::List(items) => f.write_str(&items.join(",")),
        }
    }
}

/// Raised when a typed value cannot be produced from raw text or from another value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    #[error("'{raw}' is not a valid {expected}")]
    Invalid { raw: String, expected: ValueType },
    #[error("expected a {expected} value, found {found}")]
    Mismatch { expected: ValueType, found: String },
    #[error("a {0} value is required here")]
    Missing(ValueType),
    #[error("no converter registered for value type '{0}'")]
    NoConverter(ValueType),
    #[error("integer {0} does not fit the target type")]
    OutOfRange(i64),
    #[error("integer {0} does not fit a 64-bit signed value")]
    TooLarge(String),
}

fn mismatch(expected: ValueType, found: &Value) -> ConversionError {
    ConversionError::Mismatch {
        expected,
        found: format!("{:?}", found),
    }
}

/// Maps a Rust type onto the value model so it can be bound as an option.
///
/// `to_value` returns `None` for "no value" (an unset `Option<T>`), and
/// `from_value(None)` restores that state where the type allows it. A value the
/// model cannot represent is an error rather than "no value".
pub trait OptionValue: Sized + 'static {
    fn value_type() -> ValueType;
    fn to_value(&self) -> Result<Option<Value>, ConversionError>;
    fn from_value(value: Option<Value>) -> Result<Self, ConversionError>;
}

impl OptionValue for String {
    fn value_type() -> ValueType {
        ValueType::Text
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Text(self.clone())))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::Text(s)) => Ok(s),
            Some(other) => Ok(other.to_string()),
            None => Err(ConversionError::Missing(ValueType::Text)),
        }
    }
}

impl OptionValue for bool {
    fn value_type() -> ValueType {
        ValueType::Bool
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Bool(*self)))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::Bool(b)) => Ok(b),
            Some(other) => Err(mismatch(ValueType::Bool, &other)),
            None => Err(ConversionError::Missing(ValueType::Bool)),
        }
    }
}

impl OptionValue for i64 {
    fn value_type() -> ValueType {
        ValueType::Integer
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Integer(*self)))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::Integer(i)) => Ok(i),
            Some(other) => Err(mismatch(ValueType::Integer, &other)),
            None => Err(ConversionError::Missing(ValueType::Integer)),
        }
    }
}

macro_rules! narrow_integer_value {
    ($($ty:ty),*) => {
        $(
            impl OptionValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::Integer
                }

                fn to_value(&self) -> Result<Option<Value>, ConversionError> {
                    i64::try_from(*self)
                        .map(|wide| Some(Value::Integer(wide)))
                        .map_err(|_| ConversionError::TooLarge(self.to_string()))
                }

                fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ConversionError::OutOfRange(wide))
                }
            }
        )*
    };
}

narrow_integer_value!(i32, u32, u64, usize);

impl OptionValue for f64 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Float(*self)))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::Float(x)) => Ok(x),
            #[allow(clippy::cast_precision_loss)]
            Some(Value::Integer(i)) => Ok(i as f64),
            Some(other) => Err(mismatch(ValueType::Float, &other)),
            None => Err(ConversionError::Missing(ValueType::Float)),
        }
    }
}

impl OptionValue for f32 {
    fn value_type() -> ValueType {
        ValueType::Float
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Float(f64::from(*self))))
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|x| x as f32)
    }
}

impl OptionValue for PathBuf {
    fn value_type() -> ValueType {
        ValueType::Path
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::Path(self.clone())))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::Path(p)) => Ok(p),
            Some(Value::Text(s)) => Ok(Self::from(s)),
            Some(other) => Err(mismatch(ValueType::Path, &other)),
            None => Err(ConversionError::Missing(ValueType::Path)),
        }
    }
}

impl OptionValue for Vec<String> {
    fn value_type() -> ValueType {
        ValueType::List
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        Ok(Some(Value::List(self.clone())))
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(Value::List(items)) => Ok(items),
            Some(Value::Text(s)) => Ok(vec![s]),
            Some(other) => Err(mismatch(ValueType::List, &other)),
            None => Err(ConversionError::Missing(ValueType::List)),
        }
    }
}

impl<T: OptionValue> OptionValue for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn to_value(&self) -> Result<Option<Value>, ConversionError> {
        self.as_ref().map(T::to_value).transpose().map(Option::flatten)
    }

    fn from_value(value: Option<Value>) -> Result<Self, ConversionError> {
        match value {
            Some(v) => T::from_value(Some(v)).map(Some),
            None => Ok(None),
        }
    }
}

// --- OPTION DESCRIPTOR ---

/// Immutable metadata for one bindable option of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionDescriptor {
    pub name: String,
    pub alias: Option<char>,
    /// Zero-based positional slot. `None` for named options.
    pub index: Option<usize>,
    pub required: bool,
    pub value_type: ValueType,
    /// The value restored by a reset. Captured when the option is first described.
    pub default_value: Option<Value>,
}

impl OptionDescriptor {
    /// A named option of type text, not required, without alias or default.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
            index: None,
            required: false,
            value_type: ValueType::Text,
            default_value: None,
        }
    }

    /// A positional option occupying slot `index`.
    pub fn positional(name: impl Into<String>, index: usize) -> Self {
        Self {
            index: Some(index),
            ..Self::named(name)
        }
    }

    pub fn is_positional(&self) -> bool {
        self.index.is_some()
    }
}

impl fmt::Display for OptionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.index, self.alias) {
            (Some(index), _) => write!(f, "<{}> (position {})", self.name, index),
            (None, Some(alias)) => {
                write!(f, "{}{}|{}{}", LONG_PREFIX, self.name, SHORT_PREFIX, alias)
            }
            (None, None) => write!(f, "{}{}", LONG_PREFIX, self.name),
        }
    }
}

// --- ACTION MARKERS ---

/// Declarative flags an action attaches to itself at registration time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionMarkers {
    /// Invoked when no explicit target is given.
    pub default: bool,
    /// Hidden from the command line, reachable only through `ActionRegistry::lookup`.
    pub internal: bool,
    /// Name of the strategy that must disassemble this action.
    pub strategy: Option<String>,
}

impl ActionMarkers {
    pub fn default_action() -> Self {
        Self {
            default: true,
            ..Self::default()
        }
    }

    pub fn internal() -> Self {
        Self {
            internal: true,
            ..Self::default()
        }
    }

    pub fn with_strategy(mut self, name: impl Into<String>) -> Self {
        self.strategy = Some(name.into());
        self
    }
}
