use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Accepts a string, number or bool cell and keeps it as display text.
///
/// Documents written by the recommendation engine come from a dataframe, so
/// ratings and durations arrive as numbers while hand-entered profile fields
/// arrive as strings.
pub fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected text or number, got {}",
            other
        ))),
    }
}
