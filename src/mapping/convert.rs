//! Pluggable value conversion between row values and declared property
//! types.

use crate::error::SqlConduitError;
use crate::value::{SqlType, SqlValue};

/// One conversion rule. Returning `None` means the rule does not apply;
/// the service then tries the next registered converter.
pub trait Converter: Send + Sync {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue>;
}

/// Ordered, first-match conversion chain.
///
/// NULL passes through and an exact type match short-circuits; otherwise
/// converters are consulted in registration order. No applicable converter
/// for a non-null value is a mapping failure, never a silent null.
pub struct ConversionService {
    converters: Vec<Box<dyn Converter>>,
}

impl ConversionService {
    /// A service with no converters; only exact matches and NULL succeed.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
        }
    }

    /// The standard chain: int↔bool, int→float, text→timestamp,
    /// timestamp→text, json↔text.
    #[must_use]
    pub fn standard() -> Self {
        let mut service = Self::empty();
        service.register(IntToBool);
        service.register(BoolToInt);
        service.register(IntToFloat);
        service.register(TextToTimestamp);
        service.register(TimestampToText);
        service.register(JsonToText);
        service.register(TextToJson);
        service
    }

    /// Append a converter; earlier registrations win on overlap.
    pub fn register(&mut self, converter: impl Converter + 'static) {
        self.converters.push(Box::new(converter));
    }

    /// Convert a value to the target type.
    ///
    /// # Errors
    /// [`SqlConduitError::Mapping`] when no registered converter applies to
    /// a non-null value.
    pub fn convert(&self, value: SqlValue, target: SqlType) -> Result<SqlValue, SqlConduitError> {
        if value.is_null() {
            return Ok(SqlValue::Null);
        }
        if value.sql_type() == Some(target) {
            return Ok(value);
        }
        for converter in &self.converters {
            if let Some(converted) = converter.convert(&value, target) {
                return Ok(converted);
            }
        }
        Err(SqlConduitError::mapping(format!(
            "no converter from {:?} to {target:?}",
            value.sql_type()
        )))
    }
}

struct IntToBool;

impl Converter for IntToBool {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Bool {
            return None;
        }
        match value.as_int() {
            Some(&0) => Some(SqlValue::Bool(false)),
            Some(&1) => Some(SqlValue::Bool(true)),
            _ => None,
        }
    }
}

struct BoolToInt;

impl Converter for BoolToInt {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Int {
            return None;
        }
        match value {
            SqlValue::Bool(b) => Some(SqlValue::Int(i64::from(*b))),
            _ => None,
        }
    }
}

struct IntToFloat;

impl Converter for IntToFloat {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Float {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        value.as_int().map(|i| SqlValue::Float(*i as f64))
    }
}

struct TextToTimestamp;

impl Converter for TextToTimestamp {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Timestamp || value.as_text().is_none() {
            return None;
        }
        value.as_timestamp().map(SqlValue::Timestamp)
    }
}

struct TimestampToText;

impl Converter for TimestampToText {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Text {
            return None;
        }
        match value {
            SqlValue::Timestamp(ts) => Some(SqlValue::Text(
                ts.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            )),
            _ => None,
        }
    }
}

struct JsonToText;

impl Converter for JsonToText {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Text {
            return None;
        }
        value.as_json().map(|json| SqlValue::Text(json.to_string()))
    }
}

struct TextToJson;

impl Converter for TextToJson {
    fn convert(&self, value: &SqlValue, target: SqlType) -> Option<SqlValue> {
        if target != SqlType::Json {
            return None;
        }
        value
            .as_text()
            .and_then(|text| serde_json::from_str(text).ok())
            .map(SqlValue::Json)
    }
}
