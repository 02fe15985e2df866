//! Terraform state document and resource iteration

use std::fmt;
use std::slice;

use serde_json::{Value, map};

use crate::error::InventoryError;
use crate::resource::{AttributeReader, FlatAttributes, NestedAttributes, ResourceRecord};

/// Layout of a Terraform state document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateShape {
    /// Pre-0.12 state: `modules[].resources{}`, flattened attributes
    Legacy,
    /// 0.12+ state: `resources[].instances[]`, nested attributes
    Current,
}

impl StateShape {
    /// Detect the layout from the top-level keys of a parsed document
    #[must_use]
    pub fn detect(raw: &Value) -> Self {
        if raw.get("modules").is_some() {
            StateShape::Legacy
        } else {
            StateShape::Current
        }
    }

    /// Attribute reader for this layout
    pub(crate) fn reader(self) -> &'static dyn AttributeReader {
        match self {
            StateShape::Legacy => &FlatAttributes,
            StateShape::Current => &NestedAttributes,
        }
    }
}

impl fmt::Display for StateShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateShape::Legacy => write!(f, "legacy"),
            StateShape::Current => write!(f, "current"),
        }
    }
}

/// Parsed Terraform state
///
/// The layout is fixed at construction and every record handed out by
/// [`StateDocument::resources`] reads its attributes accordingly.
#[derive(Debug, Clone)]
pub struct StateDocument {
    raw: Value,
    shape: StateShape,
}

impl StateDocument {
    /// Wrap an already parsed document
    ///
    /// # Errors
    /// Returns [`InventoryError::MalformedState`] if the document is not a JSON object.
    pub fn new(raw: Value) -> Result<Self, InventoryError> {
        if !raw.is_object() {
            return Err(InventoryError::MalformedState(
                "state is not a JSON object".to_string(),
            ));
        }

        let shape = StateShape::detect(&raw);
        Ok(Self { raw, shape })
    }

    /// Parse state text as produced by `terraform state pull`
    ///
    /// # Errors
    /// Returns an error if the text is not JSON or not a JSON object.
    pub fn parse(text: &str) -> Result<Self, InventoryError> {
        Self::new(serde_json::from_str(text)?)
    }

    /// Layout detected at construction
    #[must_use]
    pub fn shape(&self) -> StateShape {
        self.shape
    }

    /// Iterate over every resource instance in source order
    ///
    /// The iterator is lazy; structural problems below the top level
    /// surface as `Err` items when they are reached.
    ///
    /// # Errors
    /// Returns [`InventoryError::MalformedState`] if the top-level
    /// `modules` / `resources` list is missing or not a list.
    pub fn resources(&self) -> Result<Resources<'_>, InventoryError> {
        let walk = match self.shape {
            StateShape::Legacy => Walk::Legacy {
                modules: top_level_list(&self.raw, "modules")?.iter(),
                resources: None,
            },
            StateShape::Current => Walk::Current {
                blocks: top_level_list(&self.raw, "resources")?.iter(),
                instances: None,
            },
        };

        Ok(Resources { walk })
    }
}

fn top_level_list<'a>(raw: &'a Value, key: &str) -> Result<&'a Vec<Value>, InventoryError> {
    match raw.get(key) {
        Some(Value::Array(items)) => Ok(items),
        Some(_) => Err(InventoryError::MalformedState(format!(
            "top-level `{key}` is not a list"
        ))),
        None => Err(InventoryError::MalformedState(format!(
            "state has no top-level `{key}`"
        ))),
    }
}

/// Lazy, single-pass iterator over the records of a [`StateDocument`]
pub struct Resources<'a> {
    walk: Walk<'a>,
}

enum Walk<'a> {
    Legacy {
        modules: slice::Iter<'a, Value>,
        resources: Option<map::Values<'a>>,
    },
    Current {
        blocks: slice::Iter<'a, Value>,
        instances: Option<(Option<&'a str>, slice::Iter<'a, Value>)>,
    },
}

impl<'a> Iterator for Resources<'a> {
    type Item = Result<ResourceRecord<'a>, InventoryError>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.walk {
            Walk::Legacy { modules, resources } => loop {
                if let Some(resource) = resources.as_mut().and_then(Iterator::next) {
                    return Some(Ok(ResourceRecord::legacy(resource)));
                }

                let module = modules.next()?;
                match module.get("resources").and_then(Value::as_object) {
                    Some(by_name) => *resources = Some(by_name.values()),
                    None => {
                        *resources = None;
                        return Some(Err(InventoryError::MalformedState(
                            "module has no `resources` map".to_string(),
                        )));
                    }
                }
            },
            Walk::Current { blocks, instances } => loop {
                if let Some((resource_type, iter)) = instances.as_mut()
                    && let Some(instance) = iter.next()
                {
                    return Some(Ok(ResourceRecord::current(instance, *resource_type)));
                }

                let block = blocks.next()?;
                match block.get("instances").and_then(Value::as_array) {
                    Some(list) => {
                        let resource_type = block.get("type").and_then(Value::as_str);
                        *instances = Some((resource_type, list.iter()));
                    }
                    None => {
                        *instances = None;
                        return Some(Err(InventoryError::MalformedState(
                            "resource has no `instances` list".to_string(),
                        )));
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn types(doc: &StateDocument) -> Vec<String> {
        doc.resources()
            .unwrap()
            .map(|r| r.unwrap().resource_type().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_detect_shape() {
        assert_eq!(StateShape::detect(&json!({"modules": []})), StateShape::Legacy);
        assert_eq!(StateShape::detect(&json!({"resources": []})), StateShape::Current);
        assert_eq!(StateShape::detect(&json!({})), StateShape::Current);
    }

    #[test]
    fn test_legacy_iteration_follows_source_order() {
        let doc = StateDocument::parse(
            r#"{
                "version": 3,
                "modules": [
                    {"path": ["root"], "resources": {
                        "ansible_host.web": {"type": "ansible_host", "primary": {"attributes": {}}},
                        "aws_instance.web": {"type": "aws_instance", "primary": {"attributes": {}}}
                    }},
                    {"path": ["root", "db"], "resources": {}},
                    {"path": ["root", "net"], "resources": {
                        "ansible_group.net": {"type": "ansible_group", "primary": {"attributes": {}}}
                    }}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(doc.shape(), StateShape::Legacy);
        assert_eq!(types(&doc), vec!["ansible_host", "aws_instance", "ansible_group"]);
    }

    #[test]
    fn test_current_iteration_carries_block_type() {
        let doc = StateDocument::new(json!({
            "version": 4,
            "resources": [
                {"type": "ansible_host", "name": "web", "instances": [
                    {"attributes": {"inventory_hostname": "web1"}},
                    {"attributes": {"inventory_hostname": "web2"}}
                ]},
                {"type": "aws_vpc", "name": "main", "instances": []},
                {"type": "ansible_group", "name": "all", "instances": [{"attributes": {}}]}
            ]
        }))
        .unwrap();

        assert_eq!(doc.shape(), StateShape::Current);
        assert_eq!(types(&doc), vec!["ansible_host", "ansible_host", "ansible_group"]);

        let second = doc.resources().unwrap().nth(1).unwrap().unwrap();
        assert_eq!(
            second.read_scalar("inventory_hostname").unwrap(),
            Some(&json!("web2"))
        );
    }

    #[test]
    fn test_missing_container_is_malformed() {
        let doc = StateDocument::new(json!({"version": 4})).unwrap();
        assert!(matches!(doc.resources(), Err(InventoryError::MalformedState(_))));

        let doc = StateDocument::new(json!({"modules": {}})).unwrap();
        assert!(matches!(doc.resources(), Err(InventoryError::MalformedState(_))));
    }

    #[test]
    fn test_malformed_nested_entries_surface_as_items() {
        let doc = StateDocument::new(json!({"resources": [{"type": "ansible_host"}]})).unwrap();
        let first = doc.resources().unwrap().next().unwrap();
        assert!(matches!(first, Err(InventoryError::MalformedState(_))));

        let doc = StateDocument::new(json!({"modules": [{"path": ["root"]}]})).unwrap();
        let first = doc.resources().unwrap().next().unwrap();
        assert!(matches!(first, Err(InventoryError::MalformedState(_))));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(matches!(
            StateDocument::parse("[1, 2]"),
            Err(InventoryError::MalformedState(_))
        ));
        assert!(matches!(
            StateDocument::parse("{not json"),
            Err(InventoryError::Parse(_))
        ));
    }
}
