use std::collections::HashMap;

use serde::de::Error;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// API key to role label.
    ///
    /// Either a TOML table or a JSON object in one string, so that
    /// `SQLGATE_AUTH__API_KEYS='{"Key": "role"}'` keeps the keys' case.
    #[serde(
        default = "AuthConfig::default_api_keys",
        deserialize_with = "api_keys_from_table_or_json"
    )]
    pub api_keys: HashMap<String, String>,
}

fn api_keys_from_table_or_json<'de, D>(deserializer: D) -> Result<HashMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum ApiKeys {
        Table(HashMap<String, String>),
        Json(String),
    }

    match ApiKeys::deserialize(deserializer)? {
        ApiKeys::Table(keys) => Ok(keys),
        ApiKeys::Json(raw) => serde_json::from_str(&raw).map_err(|e| {
            D::Error::custom(format!("api_keys must be a JSON object of key to role: {e}"))
        }),
    }
}

impl AuthConfig {
    fn default_api_keys() -> HashMap<String, String> {
        HashMap::from([("default_key".to_string(), "read-only".to_string())])
    }

    pub fn role_for(&self, key: &str) -> Option<&str> {
        self.api_keys.get(key).map(String::as_str)
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            api_keys: Self::default_api_keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_key_role() {
        let auth = AuthConfig::default();
        assert_eq!(auth.role_for("default_key"), Some("read-only"));
        assert_eq!(auth.role_for("nope"), None);
    }

    #[test]
    fn test_api_keys_from_json_string() {
        let auth: AuthConfig = serde_json::from_value(serde_json::json!({
            "api_keys": r#"{"Sk_LIVE_AbC123": "analyst"}"#
        }))
        .unwrap();
        assert_eq!(auth.role_for("Sk_LIVE_AbC123"), Some("analyst"));
        assert_eq!(auth.role_for("sk_live_abc123"), None);
    }

    #[test]
    fn test_api_keys_rejects_non_object_json() {
        let parsed = serde_json::from_value::<AuthConfig>(serde_json::json!({
            "api_keys": "[1, 2]"
        }));
        assert!(parsed.is_err());
    }
}
