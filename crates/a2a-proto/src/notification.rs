//! Push-notification configuration for webhook-based async delivery.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Webhook configuration attached to a task for out-of-band updates.
///
/// The server POSTs the task snapshot to `url`, authenticated with a signed
/// token in the `Authorization` header; the receiver verifies the header
/// against the body before acting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PushNotificationConfig {
    /// Webhook URL the server delivers to.
    pub url: String,

    /// Opaque token echoed back to the receiver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Authentication the receiver expects.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<AuthenticationInfo>,
}

impl PushNotificationConfig {
    /// Config delivering to the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
            authentication: None,
        }
    }
}

/// Authentication requirements for a push-notification endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationInfo {
    /// Accepted scheme names (e.g. "bearer").
    pub schemes: Vec<String>,

    /// Optional static credentials.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trip() {
        let config = PushNotificationConfig {
            url: "http://127.0.0.1:9100/notify".into(),
            token: Some("abc".into()),
            authentication: Some(AuthenticationInfo {
                schemes: vec!["bearer".into()],
                credentials: None,
            }),
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed: PushNotificationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
