//! Resource records and shape-aware attribute access

use serde_json::{Map, Value};

use crate::error::InventoryError;
use crate::state::StateShape;

/// Attribute map as stored in state
pub type Attributes = Map<String, Value>;

/// Reads scalar, list and map attributes out of a resource's attribute map.
///
/// Pre-0.12 state stores every composite value as a set of flattened sibling
/// keys, 0.12+ state nests them. One implementation exists per layout and the
/// document picks one when it is parsed.
pub trait AttributeReader: Send + Sync {
    /// Single-key lookup, identical for both layouts
    fn scalar<'a>(&self, attrs: &'a Attributes, key: &str) -> Option<&'a Value> {
        attrs.get(key)
    }

    /// Read a list attribute; `None` means the attribute is absent
    ///
    /// # Errors
    /// Returns an error if the stored value cannot be read as a list.
    fn list(&self, attrs: &Attributes, key: &str) -> Result<Option<Vec<Value>>, InventoryError>;

    /// Read a map attribute; absent maps read as empty
    ///
    /// # Errors
    /// Returns an error if the stored value cannot be read as a map.
    fn map(&self, attrs: &Attributes, key: &str) -> Result<Attributes, InventoryError>;
}

/// Pre-0.12 layout: `key.#` / `key.0` lists and `key.%` / `key.sub` maps
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatAttributes;

/// Flattened list length marker suffix
const LIST_LENGTH_MARKER: &str = "#";
/// Flattened map length marker suffix
const MAP_LENGTH_MARKER: &str = "%";

impl AttributeReader for FlatAttributes {
    fn list(&self, attrs: &Attributes, key: &str) -> Result<Option<Vec<Value>>, InventoryError> {
        let Some(marker) = attrs.get(&format!("{key}.{LIST_LENGTH_MARKER}")) else {
            return Ok(Some(Vec::new()));
        };

        let length = marker
            .as_str()
            .and_then(|s| s.parse::<usize>().ok())
            .ok_or_else(|| InventoryError::InvalidLength {
                key: key.to_string(),
                value: marker
                    .as_str()
                    .map_or_else(|| marker.to_string(), str::to_string),
            })?;

        (0..length)
            .map(|i| {
                let element_key = format!("{key}.{i}");
                attrs
                    .get(&element_key)
                    .cloned()
                    .ok_or(InventoryError::MissingAttribute { key: element_key })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    fn map(&self, attrs: &Attributes, key: &str) -> Result<Attributes, InventoryError> {
        let prefix = format!("{key}.");

        Ok(attrs
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(&prefix)
                    .filter(|sub| *sub != MAP_LENGTH_MARKER)
                    .map(|sub| (sub.to_string(), v.clone()))
            })
            .collect())
    }
}

/// 0.12+ layout: lists and maps are native JSON values
#[derive(Debug, Clone, Copy, Default)]
pub struct NestedAttributes;

impl AttributeReader for NestedAttributes {
    fn list(&self, attrs: &Attributes, key: &str) -> Result<Option<Vec<Value>>, InventoryError> {
        match attrs.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Array(items)) => Ok(Some(items.clone())),
            Some(_) => Err(InventoryError::InvalidAttribute {
                key: key.to_string(),
                expected: "a list",
            }),
        }
    }

    fn map(&self, attrs: &Attributes, key: &str) -> Result<Attributes, InventoryError> {
        match attrs.get(key) {
            None | Some(Value::Null) => Ok(Map::new()),
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(_) => Err(InventoryError::InvalidAttribute {
                key: key.to_string(),
                expected: "a map",
            }),
        }
    }
}

/// One resource instance borrowed from a [`StateDocument`](crate::StateDocument)
///
/// Records are produced by [`StateDocument::resources`](crate::StateDocument::resources)
/// and only live as long as the document they borrow from.
#[derive(Clone, Copy)]
pub struct ResourceRecord<'a> {
    /// Raw resource object (pre-0.12) or instance object (0.12+)
    source: &'a Value,
    /// Attribute map, if the source has one
    attributes: Option<&'a Attributes>,
    /// Type carried by the enclosing resource block (0.12+ only)
    resource_type: Option<&'a str>,
    shape: StateShape,
}

impl<'a> ResourceRecord<'a> {
    /// Wrap a pre-0.12 resource object (`{"type": .., "primary": {"attributes": ..}}`)
    pub(crate) fn legacy(resource: &'a Value) -> Self {
        Self {
            source: resource,
            attributes: resource
                .get("primary")
                .and_then(|primary| primary.get("attributes"))
                .and_then(Value::as_object),
            resource_type: None,
            shape: StateShape::Legacy,
        }
    }

    /// Wrap a 0.12+ instance object, with the type of its resource block
    pub(crate) fn current(instance: &'a Value, resource_type: Option<&'a str>) -> Self {
        Self {
            source: instance,
            attributes: instance.get("attributes").and_then(Value::as_object),
            resource_type,
            shape: StateShape::Current,
        }
    }

    /// Terraform resource type identifier
    ///
    /// # Errors
    /// Returns [`InventoryError::MissingType`] if neither the resource block
    /// nor the record itself carries a type.
    pub fn resource_type(&self) -> Result<&'a str, InventoryError> {
        self.resource_type
            .or_else(|| self.source.get("type").and_then(Value::as_str))
            .ok_or(InventoryError::MissingType)
    }

    /// Whether the resource type belongs to the given provider prefix
    ///
    /// # Errors
    /// Returns an error if the record has no type.
    pub fn is_relevant(&self, provider_prefix: &str) -> Result<bool, InventoryError> {
        Ok(self.resource_type()?.starts_with(provider_prefix))
    }

    /// Read a single attribute value
    ///
    /// # Errors
    /// Returns an error if the record has no attribute map at all.
    pub fn read_scalar(&self, key: &str) -> Result<Option<&'a Value>, InventoryError> {
        Ok(self.shape.reader().scalar(self.attributes()?, key))
    }

    /// Read a list attribute
    ///
    /// # Errors
    /// Returns an error if the record has no attribute map, a flattened
    /// length marker is invalid, or the value is not a list.
    pub fn read_list(&self, key: &str) -> Result<Option<Vec<Value>>, InventoryError> {
        self.shape.reader().list(self.attributes()?, key)
    }

    /// Read a map attribute
    ///
    /// # Errors
    /// Returns an error if the record has no attribute map or the value is not a map.
    pub fn read_map(&self, key: &str) -> Result<Attributes, InventoryError> {
        self.shape.reader().map(self.attributes()?, key)
    }

    fn attributes(&self) -> Result<&'a Attributes, InventoryError> {
        self.attributes.ok_or_else(|| {
            let path = match self.shape {
                StateShape::Legacy => "primary.attributes",
                StateShape::Current => "attributes",
            };
            InventoryError::MalformedState(format!("resource has no `{path}` object"))
        })
    }
}

impl std::fmt::Debug for ResourceRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRecord")
            .field("type", &self.resource_type().ok())
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}
