//! Dispatch of provider resources onto the inventory model

use serde_json::{Map, Value};
use tracing::{debug, info, instrument, trace};

use crate::error::InventoryError;
use crate::resource::ResourceRecord;
use crate::state::StateDocument;
use crate::types::{Inventory, InventoryDocument};

/// Type prefix of the resources declared by the Terraform Ansible provider
pub const DEFAULT_PROVIDER_PREFIX: &str = "ansible_";

/// Inventory-relevant resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// `<prefix>host`
    Host,
    /// `<prefix>host_var`
    HostVar,
    /// `<prefix>group`
    Group,
    /// `<prefix>group_var`
    GroupVar,
    /// Any other type; never dispatched
    Other,
}

impl ResourceKind {
    /// Classify a resource type under the given provider prefix
    ///
    /// Matching is exact and case-sensitive.
    #[must_use]
    pub fn classify(resource_type: &str, provider_prefix: &str) -> Self {
        match resource_type.strip_prefix(provider_prefix) {
            Some("host") => ResourceKind::Host,
            Some("host_var") => ResourceKind::HostVar,
            Some("group") => ResourceKind::Group,
            Some("group_var") => ResourceKind::GroupVar,
            _ => ResourceKind::Other,
        }
    }
}

/// Folds state resources into an [`Inventory`]
#[derive(Debug, Clone)]
pub struct Transformer {
    provider_prefix: String,
    inventory: Inventory,
}

impl Transformer {
    /// Create a transformer for the default provider prefix
    #[must_use]
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_PROVIDER_PREFIX)
    }

    /// Create a transformer for a custom provider prefix
    pub fn with_prefix(provider_prefix: impl Into<String>) -> Self {
        Self {
            provider_prefix: provider_prefix.into(),
            inventory: Inventory::new(),
        }
    }

    /// Inventory accumulated so far
    #[must_use]
    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Apply one record
    ///
    /// Returns `None` when the record is not from the provider and was
    /// skipped without being inspected, otherwise the kind it was
    /// classified as.
    ///
    /// # Errors
    /// Returns an error if the record has no type or a required attribute
    /// is missing or malformed.
    pub fn apply(
        &mut self,
        record: &ResourceRecord<'_>,
    ) -> Result<Option<ResourceKind>, InventoryError> {
        if !record.is_relevant(&self.provider_prefix)? {
            trace!(record = ?record, "skipping resource from another provider");
            return Ok(None);
        }

        let resource_type = record.resource_type()?;
        let kind = ResourceKind::classify(resource_type, &self.provider_prefix);
        debug!(resource_type, kind = ?kind, "applying resource");

        match kind {
            ResourceKind::Host => {
                let hostname = required_string(record, "inventory_hostname")?;
                let groups = string_list(record, "groups")?;
                let vars = record.read_map("vars")?;
                self.inventory.upsert_host(&hostname, groups, vars);
            }
            ResourceKind::HostVar => {
                let hostname = required_string(record, "inventory_hostname")?;
                let vars = single_var(record)?;
                self.inventory.upsert_host(&hostname, Vec::new(), vars);
            }
            ResourceKind::Group => {
                let name = required_string(record, "inventory_group_name")?;
                let children = string_list(record, "children")?;
                let vars = record.read_map("vars")?;
                self.inventory.upsert_group(&name, children, Vec::new(), vars);
            }
            ResourceKind::GroupVar => {
                let name = required_string(record, "inventory_group_name")?;
                let vars = single_var(record)?;
                self.inventory
                    .upsert_group(&name, Vec::new(), Vec::new(), vars);
            }
            ResourceKind::Other => {
                debug!(resource_type, "ignoring unsupported provider resource");
            }
        }

        Ok(Some(kind))
    }

    /// Apply every record of a state document in order
    ///
    /// # Errors
    /// Stops at and returns the first error.
    #[instrument(skip_all, fields(shape = %state.shape(), prefix = %self.provider_prefix))]
    pub fn apply_state(&mut self, state: &StateDocument) -> Result<(), InventoryError> {
        let mut seen = 0usize;
        let mut applied = 0usize;

        for record in state.resources()? {
            seen += 1;
            if self.apply(&record?)?.is_some() {
                applied += 1;
            }
        }

        info!(
            resources = seen,
            applied,
            hosts = self.inventory.host_count(),
            groups = self.inventory.group_count(),
            "state transformed"
        );

        Ok(())
    }

    /// Hand over the accumulated inventory
    #[must_use]
    pub fn into_inventory(self) -> Inventory {
        self.inventory
    }

    /// Finalize the accumulated inventory into its output document
    #[must_use]
    pub fn finish(self) -> InventoryDocument {
        self.inventory.finalize()
    }
}

impl Default for Transformer {
    fn default() -> Self {
        Self::new()
    }
}

fn required_string(record: &ResourceRecord<'_>, key: &str) -> Result<String, InventoryError> {
    match record.read_scalar(key)? {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(InventoryError::MissingAttribute {
            key: key.to_string(),
        }),
        Some(_) => Err(InventoryError::InvalidAttribute {
            key: key.to_string(),
            expected: "a string",
        }),
    }
}

fn string_list(record: &ResourceRecord<'_>, key: &str) -> Result<Vec<String>, InventoryError> {
    record
        .read_list(key)?
        .unwrap_or_default()
        .into_iter()
        .map(|item| match item {
            Value::String(s) => Ok(s),
            _ => Err(InventoryError::InvalidAttribute {
                key: key.to_string(),
                expected: "a list of strings",
            }),
        })
        .collect()
}

/// `{key: value}` from a `*_var` resource; a missing value becomes `null`
fn single_var(record: &ResourceRecord<'_>) -> Result<Map<String, Value>, InventoryError> {
    let key = required_string(record, "key")?;
    let value = record.read_scalar("value")?.cloned().unwrap_or(Value::Null);

    let mut vars = Map::new();
    vars.insert(key, value);
    Ok(vars)
}
