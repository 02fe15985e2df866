//! tfinv-inventory: Terraform state to Ansible inventory
//!
//! Reads Terraform state in either the pre-0.12 (flattened attributes) or
//! 0.12+ (nested attributes) layout, picks out the resources declared by the
//! Ansible provider and folds them into a host/group inventory.

pub mod collector;
pub mod error;
pub mod resource;
pub mod state;
pub mod terraform;
pub mod transform;
pub mod types;

pub use collector::{InventoryCollector, build_inventory};
pub use error::InventoryError;
pub use resource::ResourceRecord;
pub use state::{StateDocument, StateShape};
pub use terraform::TerraformClient;
pub use transform::{DEFAULT_PROVIDER_PREFIX, ResourceKind, Transformer};
pub use types::{ALL_GROUP, Group, GroupDocument, Host, Inventory, InventoryDocument, Vars};
