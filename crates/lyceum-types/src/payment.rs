//! Payment provider types.

use serde::{Deserialize, Serialize};

/// Line item sent when creating a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub product_name: String,
    pub product_description: String,
    pub price_in_cents: u64,
    pub currency: String,
    pub quantity: u64,
}

/// Hosted checkout session returned by the payment provider.
///
/// The backend returns this as a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Externally verified status of a checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StripeSessionStatus {
    Completed {
        response: String,
        #[serde(
            default,
            rename = "userPrincipal",
            skip_serializing_if = "Option::is_none"
        )]
        user_principal: Option<String>,
    },
    Failed {
        error: String,
    },
}

impl StripeSessionStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, StripeSessionStatus::Completed { .. })
    }
}

/// Payment provider configuration set by an administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StripeConfiguration {
    pub secret_key: String,
    pub allowed_countries: Vec<String>,
}

impl StripeConfiguration {
    /// Build from a comma-separated country list (`"US, CA,GB"`).
    pub fn from_country_list(secret_key: impl Into<String>, countries: &str) -> Self {
        Self {
            secret_key: secret_key.into(),
            allowed_countries: countries
                .split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_status_wire_format() {
        let status: StripeSessionStatus = serde_json::from_value(serde_json::json!({
            "completed": { "response": "paid", "userPrincipal": "user-1" }
        }))
        .unwrap();
        assert!(status.is_completed());

        let status: StripeSessionStatus =
            serde_json::from_value(serde_json::json!({ "failed": { "error": "declined" } }))
                .unwrap();
        assert_eq!(
            status,
            StripeSessionStatus::Failed {
                error: "declined".into()
            }
        );
    }

    #[test]
    fn test_country_list_parsing() {
        let cfg = StripeConfiguration::from_country_list("sk_test", "US, CA,,GB ");
        assert_eq!(cfg.allowed_countries, vec!["US", "CA", "GB"]);
    }
}
