//! Deserialization helpers for hand-written YAML catalogs
//!
//! Catalog authors write ids like `1.1` and values like `600` or `false`
//! unquoted, and leave lists empty (`checks:`). These helpers accept what
//! YAML produces in those cases.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Str(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

/// Read any scalar (or null) as a string
pub fn scalar_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?
        .map(Scalar::into_string)
        .unwrap_or_default())
}

/// Treat an explicit null like a missing value
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "scalar_string")]
        id: String,
        #[serde(default, deserialize_with = "null_as_default")]
        items: Vec<String>,
    }

    #[test]
    fn test_scalar_string_accepts_numbers_and_bools() {
        let s: Sample = serde_yaml::from_str("id: 1.1").unwrap();
        assert_eq!(s.id, "1.1");
        let s: Sample = serde_yaml::from_str("id: 4").unwrap();
        assert_eq!(s.id, "4");
        let s: Sample = serde_yaml::from_str("id: false").unwrap();
        assert_eq!(s.id, "false");
        let s: Sample = serde_yaml::from_str("id: \"1.2.3\"").unwrap();
        assert_eq!(s.id, "1.2.3");
        let s: Sample = serde_yaml::from_str("id:").unwrap();
        assert_eq!(s.id, "");
    }

    #[test]
    fn test_null_list_is_empty() {
        let s: Sample = serde_yaml::from_str("items:").unwrap();
        assert!(s.items.is_empty());
        let s: Sample = serde_yaml::from_str("items: [a, b]").unwrap();
        assert_eq!(s.items, vec!["a", "b"]);
    }
}
