//! High-level inventory collection API

use tracing::{info, instrument};

use crate::error::InventoryError;
use crate::state::StateDocument;
use crate::terraform::TerraformClient;
use crate::transform::{DEFAULT_PROVIDER_PREFIX, Transformer};
use crate::types::InventoryDocument;

/// Inventory collector
///
/// Fetches state through terraform and turns it into an inventory document.
pub struct InventoryCollector {
    client: TerraformClient,
    provider_prefix: String,
}

impl InventoryCollector {
    /// Create a new inventory collector
    pub fn new(client: TerraformClient) -> Self {
        Self {
            client,
            provider_prefix: DEFAULT_PROVIDER_PREFIX.to_string(),
        }
    }

    /// Set the provider prefix of inventory resources
    #[must_use]
    pub fn with_provider_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.provider_prefix = prefix.into();
        self
    }

    /// Fetch state and build the inventory
    ///
    /// # Errors
    /// Returns the first fetch, parse or transformation error; nothing is
    /// produced on failure.
    #[instrument(skip(self), fields(workspace = %self.client.workspace()))]
    pub async fn collect(&self) -> Result<InventoryDocument, InventoryError> {
        info!("fetching terraform state");
        let state = self.client.fetch_state().await?;
        build_inventory(&state, &self.provider_prefix)
    }
}

/// Build an inventory document from raw state text
///
/// # Errors
/// Returns an error if the state cannot be parsed or transformed.
pub fn build_inventory(
    state_text: &str,
    provider_prefix: &str,
) -> Result<InventoryDocument, InventoryError> {
    let state = StateDocument::parse(state_text)?;
    info!(shape = %state.shape(), "parsed terraform state");

    let mut transformer = Transformer::with_prefix(provider_prefix);
    transformer.apply_state(&state)?;
    Ok(transformer.finish())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_build_inventory_current_state() {
        let state = json!({
            "version": 4,
            "terraform_version": "1.6.0",
            "resources": [
                {"mode": "managed", "type": "aws_instance", "name": "web", "instances": [
                    {"attributes": {"id": "i-123", "private_ip": "10.0.0.5"}}
                ]},
                {"mode": "managed", "type": "ansible_host", "name": "web", "instances": [
                    {"attributes": {
                        "id": "web1",
                        "inventory_hostname": "web1",
                        "groups": ["webservers"],
                        "vars": {"ansible_host": "10.0.0.5"}
                    }}
                ]},
                {"mode": "managed", "type": "ansible_group", "name": "prod", "instances": [
                    {"attributes": {
                        "inventory_group_name": "prod",
                        "children": ["webservers"],
                        "vars": {"env": "prod"}
                    }}
                ]}
            ]
        });

        let document = build_inventory(&state.to_string(), DEFAULT_PROVIDER_PREFIX).unwrap();
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(
            value,
            json!({
                "_meta": {"hostvars": {"web1": {"ansible_host": "10.0.0.5"}}},
                "all": {"children": [], "hosts": ["web1"], "vars": {}},
                "webservers": {"children": [], "hosts": ["web1"], "vars": {}},
                "prod": {"children": ["webservers"], "hosts": [], "vars": {"env": "prod"}}
            })
        );
    }

    #[test]
    fn test_build_inventory_empty_state() {
        let document = build_inventory(r#"{"version": 4, "resources": []}"#, "ansible_").unwrap();
        assert_eq!(
            serde_json::to_value(&document).unwrap(),
            json!({"_meta": {"hostvars": {}}})
        );
    }

    #[test]
    fn test_build_inventory_rejects_garbage() {
        assert!(matches!(
            build_inventory("not json", "ansible_"),
            Err(InventoryError::Parse(_))
        ));
    }
}
