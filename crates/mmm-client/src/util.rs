use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

pub fn default_http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().gzip(true).brotli(true).build()
}

/// Normalise a collection response.
///
/// The backend answers either with a bare array or with `{ "data": [...] }`.
/// Anything else is treated as an empty collection. Entries that do not fit
/// `T` at all are skipped; record types default their missing fields, so in
/// practice only non-object entries are dropped.
pub fn normalize_collection<T: DeserializeOwned>(body: Value) -> Vec<T> {
    let entries = match body {
        Value::Array(entries) => entries,
        Value::Object(mut object) => match object.remove("data") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(error = %e, "skipping collection entry");
                None
            }
        })
        .collect()
}

/// `deserialize_with` adapter applying [`normalize_collection`] to a field.
pub fn collection<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(normalize_collection).unwrap_or_default())
}

/// Read a number that may arrive as a JSON number or a numeric string.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// `deserialize_with` adapter for amounts: missing or unreadable values become 0.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value).unwrap_or(0.0))
}

/// `deserialize_with` adapter for counts: missing, negative or unreadable values become 0.
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|number| number.is_finite() && *number >= 0.0)
        .map(|number| number.round().min(u32::MAX as f64) as u32)
        .unwrap_or(0))
}

/// `deserialize_with` adapter for optional numbers.
pub fn lenient_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_from_value))
}

/// Read text that may arrive as a string or a number.
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// `deserialize_with` adapter for optional text: unreadable values become `None`.
pub fn lenient_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_from_value))
}

/// `deserialize_with` adapter for text: missing or unreadable values become empty.
pub fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_opt_string(deserializer)?.unwrap_or_default())
}

fn whole_number_in(value: &Value, max: f64) -> Option<f64> {
    number_from_value(value).filter(|number| number.fract() == 0.0 && (0.0..=max).contains(number))
}

/// `deserialize_with` adapter for small optional codes; out-of-range values become `None`.
pub fn lenient_opt_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|value| whole_number_in(value, u8::MAX as f64))
        .map(|number| number as u8))
}

/// `deserialize_with` adapter for optional counts; out-of-range values become `None`.
pub fn lenient_opt_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(|value| whole_number_in(value, u32::MAX as f64))
        .map(|number| number as u32))
}

/// `deserialize_with` adapter for optional nested values: anything that does
/// not fit `T` becomes `None` instead of failing the enclosing record.
pub fn lenient_opt<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}
