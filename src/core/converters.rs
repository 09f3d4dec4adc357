// src/core/converters.rs

use crate::models::{ConversionError, Value, ValueType};
use std::{
    collections::HashMap,
    fmt,
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

/// Turns raw command-line text into a typed value.
pub trait Converter: Send + Sync {
    fn convert(&self, raw: &str) -> Result<Value, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(&str) -> Result<Value, ConversionError> + Send + Sync,
{
    fn convert(&self, raw: &str) -> Result<Value, ConversionError> {
        self(raw)
    }
}

/// Thread-safe table of converters, keyed by value type.
///
/// A new registry comes with converters for every built-in value type.
/// Registering under an existing type replaces the previous converter.
pub struct ConverterRegistry {
    converters: RwLock<HashMap<ValueType, Arc<dyn Converter>>>,
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let converters = self.converters.read().unwrap_or_else(PoisonError::into_inner);
        let mut types: Vec<String> = converters.keys().map(ToString::to_string).collect();
        types.sort();
        f.debug_struct("ConverterRegistry").field("types", &types).finish()
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        let registry = Self::empty();
        registry.register(ValueType::Text, convert_text);
        registry.register(ValueType::Bool, convert_bool);
        registry.register(ValueType::Integer, convert_integer);
        registry.register(ValueType::Float, convert_float);
        registry.register(ValueType::Path, convert_path);
        registry.register(ValueType::List, convert_list);
        registry
    }
}

impl ConverterRegistry {
    /// A registry with no converters at all.
    pub fn empty() -> Self {
        Self {
            converters: RwLock::new(HashMap::new()),
        }
    }

    pub fn register<C: Converter + 'static>(&self, value_type: ValueType, converter: C) {
        log::debug!("Registering converter for value type '{}'", value_type);
        self.converters
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(value_type, Arc::new(converter));
    }

    pub fn contains(&self, value_type: &ValueType) -> bool {
        self.converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(value_type)
    }

    /// Converts `raw` with the converter registered for `value_type`.
    pub fn convert(&self, value_type: &ValueType, raw: &str) -> Result<Value, ConversionError> {
        // Clone the handle so user converters run without the lock held.
        let converter = self
            .converters
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(value_type)
            .cloned()
            .ok_or_else(|| ConversionError::NoConverter(value_type.clone()))?;
        converter.convert(raw)
    }
}

fn invalid(raw: &str, expected: ValueType) -> ConversionError {
    ConversionError::Invalid {
        raw: raw.to_string(),
        expected,
    }
}

fn convert_text(raw: &str) -> Result<Value, ConversionError> {
    Ok(Value::Text(raw.to_string()))
}

fn convert_integer(raw: &str) -> Result<Value, ConversionError> {
    raw.trim()
        .parse::<i64>()
        .map(Value::Integer)
        .map_err(|_| invalid(raw, ValueType::Integer))
}

fn convert_float(raw: &str) -> Result<Value, ConversionError> {
    raw.trim()
        .parse::<f64>()
        .map(Value::Float)
        .map_err(|_| invalid(raw, ValueType::Float))
}

fn convert_path(raw: &str) -> Result<Value, ConversionError> {
    Ok(Value::Path(PathBuf::from(raw)))
}

fn convert_bool(raw: &str) -> Result<Value, ConversionError> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
        "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
        _ => Err(invalid(raw, ValueType::Bool)),
    }
}

fn convert_list(raw: &str) -> Result<Value, ConversionError> {
    let items = raw
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Value::List(items))
}
