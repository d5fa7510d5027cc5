pub mod coincheck;

pub use coincheck::{
    CancelResponse, CoincheckClient, NonceSource, OpenOrdersResponse, OrderAck, DEFAULT_BASE_URL,
};

use serde::{Deserialize, Deserializer};

// The exchange is loose about numeric typing: rates come back as numbers,
// amounts as strings. Accept either shape.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(f64),
    Text(String),
}

impl NumOrText {
    fn into_f64<E: serde::de::Error>(self) -> Result<f64, E> {
        match self {
            NumOrText::Num(v) => Ok(v),
            NumOrText::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// Deserialize a required numeric field that may arrive as a JSON string.
pub fn de_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    NumOrText::deserialize(deserializer)?.into_f64()
}

/// Deserialize a nullable numeric field that may arrive as a JSON string.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(raw) => raw.into_f64().map(Some),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::de_opt_f64")]
        value: Option<f64>,
    }

    #[test]
    fn test_accepts_number_string_and_null() {
        let p: Probe = serde_json::from_str(r#"{"value": 1.5}"#).unwrap();
        assert_eq!(p.value, Some(1.5));

        let p: Probe = serde_json::from_str(r#"{"value": "2.25"}"#).unwrap();
        assert_eq!(p.value, Some(2.25));

        let p: Probe = serde_json::from_str(r#"{"value": null}"#).unwrap();
        assert_eq!(p.value, None);
    }

    #[test]
    fn test_rejects_garbage_text() {
        let result: Result<Probe, _> = serde_json::from_str(r#"{"value": "not-a-number"}"#);
        assert!(result.is_err());
    }
}
