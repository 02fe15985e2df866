//! Inventory model and the serialized document

use std::collections::hash_map::Entry;
use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

/// Group every host belongs to
pub const ALL_GROUP: &str = "all";

/// Key of the metadata section in the output document
const META_KEY: &str = "_meta";

/// Variable name to value
pub type Vars = Map<String, Value>;

// ============================================================================
// Model
// ============================================================================

/// A host being accumulated
#[derive(Debug, Clone, PartialEq)]
pub struct Host {
    /// Inventory hostname
    pub hostname: String,
    /// Group memberships, always including [`ALL_GROUP`]
    pub groups: HashSet<String>,
    /// Host variables
    pub vars: Vars,
}

impl Host {
    /// Create a host that is only a member of [`ALL_GROUP`]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            groups: HashSet::from([ALL_GROUP.to_string()]),
            vars: Map::new(),
        }
    }

    /// Add group memberships, returning the ones that were not already present
    pub fn join<I>(&mut self, groups: I) -> Vec<String>
    where
        I: IntoIterator<Item = String>,
    {
        groups
            .into_iter()
            .filter(|group| self.groups.insert(group.clone()))
            .collect()
    }
}

/// A group being accumulated
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    /// Group name
    pub name: String,
    /// Child group names
    pub children: HashSet<String>,
    /// Member hostnames
    pub hosts: HashSet<String>,
    /// Group variables
    pub vars: Vars,
}

impl Group {
    /// Create an empty group
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Mutable accumulator of hosts and groups
///
/// All updates are unions or per-key overwrites, so applying the same
/// declaration twice is a no-op. Ordering is only imposed by [`Inventory::finalize`].
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    hosts: HashMap<String, Host>,
    groups: HashMap<String, Group>,
}

impl Inventory {
    /// Create an empty inventory
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update a host
    ///
    /// A new host starts as a member of [`ALL_GROUP`]. Every group the host
    /// newly joins is created if needed and gets the host as a member.
    pub fn upsert_host<I>(&mut self, hostname: &str, groups: I, vars: Vars)
    where
        I: IntoIterator<Item = String>,
    {
        let mut joined = Vec::new();
        let host = match self.hosts.entry(hostname.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                joined.push(ALL_GROUP.to_string());
                entry.insert(Host::new(hostname))
            }
        };

        joined.extend(host.join(groups));
        host.vars.extend(vars);

        for group in joined {
            self.group_mut(&group).hosts.insert(hostname.to_string());
        }
    }

    /// Insert or update a group
    ///
    /// Listed member hostnames are recorded as-is; no host entry is created for them.
    pub fn upsert_group<C, H>(&mut self, name: &str, children: C, hosts: H, vars: Vars)
    where
        C: IntoIterator<Item = String>,
        H: IntoIterator<Item = String>,
    {
        let group = self.group_mut(name);
        group.children.extend(children);
        group.hosts.extend(hosts);
        group.vars.extend(vars);
    }

    /// Look up a host
    #[must_use]
    pub fn host(&self, hostname: &str) -> Option<&Host> {
        self.hosts.get(hostname)
    }

    /// Look up a group
    #[must_use]
    pub fn group(&self, name: &str) -> Option<&Group> {
        self.groups.get(name)
    }

    /// Number of hosts
    #[must_use]
    pub fn host_count(&self) -> usize {
        self.hosts.len()
    }

    /// Number of groups
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Sort memberships and produce the output document
    #[must_use]
    pub fn finalize(self) -> InventoryDocument {
        let mut document = InventoryDocument::default();

        for (hostname, host) in self.hosts {
            document
                .host_groups
                .insert(hostname.clone(), sorted(host.groups));
            document.meta.hostvars.insert(hostname, host.vars);
        }

        for (name, group) in self.groups {
            if name == META_KEY {
                warn!(group = %name, "dropping group that collides with the metadata section");
                continue;
            }
            document.groups.insert(
                name,
                GroupDocument {
                    children: sorted(group.children),
                    hosts: sorted(group.hosts),
                    vars: group.vars,
                },
            );
        }

        document
    }

    fn group_mut(&mut self, name: &str) -> &mut Group {
        self.groups
            .entry(name.to_string())
            .or_insert_with(|| Group::new(name))
    }
}

fn sorted(set: HashSet<String>) -> Vec<String> {
    let mut items: Vec<String> = set.into_iter().collect();
    items.sort_unstable();
    items
}

// ============================================================================
// Output document
// ============================================================================

/// Ansible dynamic inventory document
///
/// Serializes as `{"_meta": {"hostvars": ..}, "<group>": {..}, ..}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InventoryDocument {
    /// Per-host variables
    #[serde(rename = "_meta")]
    pub meta: Meta,
    /// Groups keyed by name
    #[serde(flatten)]
    pub groups: BTreeMap<String, GroupDocument>,
    /// Sorted group memberships per host
    #[serde(skip)]
    pub host_groups: BTreeMap<String, Vec<String>>,
}

impl InventoryDocument {
    /// Variables of one host, as answered to `--host`
    #[must_use]
    pub fn host_vars(&self, hostname: &str) -> Option<&Vars> {
        self.meta.hostvars.get(hostname)
    }
}

/// Metadata section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Meta {
    /// Variables keyed by hostname
    pub hostvars: BTreeMap<String, Vars>,
}

/// One group in the output document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupDocument {
    /// Child group names, sorted
    pub children: Vec<String>,
    /// Member hostnames, sorted
    pub hosts: Vec<String>,
    /// Group variables
    pub vars: Vars,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn vars(value: Value) -> Vars {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_new_host_joins_all() {
        let mut inventory = Inventory::new();
        inventory.upsert_host("web1", Vec::new(), Map::new());

        assert!(inventory.host("web1").unwrap().groups.contains(ALL_GROUP));
        assert!(inventory.group(ALL_GROUP).unwrap().hosts.contains("web1"));
    }

    #[test]
    fn test_host_groups_are_created_with_membership() {
        let mut inventory = Inventory::new();
        inventory.upsert_host("web1", strings(&["web", "prod"]), Map::new());
        inventory.upsert_host("web2", strings(&["web"]), Map::new());

        let web = inventory.group("web").unwrap();
        assert_eq!(sorted(web.hosts.clone()), strings(&["web1", "web2"]));
        assert_eq!(inventory.group_count(), 3);
    }

    #[test]
    fn test_host_upsert_is_idempotent() {
        let mut once = Inventory::new();
        once.upsert_host("db1", strings(&["db"]), vars(json!({"port": "5432"})));

        let mut twice = once.clone();
        twice.upsert_host("db1", strings(&["db"]), vars(json!({"port": "5432"})));

        assert_eq!(once.host("db1"), twice.host("db1"));
        assert_eq!(once.clone().finalize(), twice.finalize());
    }

    #[test]
    fn test_vars_merge_last_write_wins() {
        let mut inventory = Inventory::new();
        inventory.upsert_host("db1", Vec::new(), vars(json!({"a": "1", "b": "2"})));
        inventory.upsert_host("db1", Vec::new(), vars(json!({"b": "3"})));

        let host = inventory.host("db1").unwrap();
        assert_eq!(host.vars, vars(json!({"a": "1", "b": "3"})));
    }

    #[test]
    fn test_group_members_do_not_create_hosts() {
        let mut inventory = Inventory::new();
        inventory.upsert_group("db", Vec::new(), strings(&["ghost"]), Map::new());

        let document = inventory.finalize();
        assert_eq!(document.groups["db"].hosts, strings(&["ghost"]));
        assert!(document.host_vars("ghost").is_none());
        assert!(!document.groups.contains_key(ALL_GROUP));
    }

    #[test]
    fn test_finalize_sorts_everything() {
        let mut inventory = Inventory::new();
        inventory.upsert_host("c", strings(&["zeta", "alpha"]), Map::new());
        inventory.upsert_host("a", strings(&["zeta"]), Map::new());
        inventory.upsert_host("b", strings(&["zeta"]), Map::new());
        inventory.upsert_group("zeta", strings(&["z2", "z1"]), Vec::new(), Map::new());

        let document = inventory.finalize();
        assert_eq!(document.groups["zeta"].hosts, strings(&["a", "b", "c"]));
        assert_eq!(document.groups["zeta"].children, strings(&["z1", "z2"]));
        assert_eq!(document.host_groups["c"], strings(&["all", "alpha", "zeta"]));
    }

    #[test]
    fn test_document_shape() {
        let mut inventory = Inventory::new();
        inventory.upsert_host("web1", strings(&["web"]), vars(json!({"role": "frontend"})));
        inventory.upsert_group("web", Vec::new(), Vec::new(), vars(json!({"port": 80})));

        let value = serde_json::to_value(inventory.finalize()).unwrap();
        assert_eq!(
            value,
            json!({
                "_meta": {"hostvars": {"web1": {"role": "frontend"}}},
                "all": {"children": [], "hosts": ["web1"], "vars": {}},
                "web": {"children": [], "hosts": ["web1"], "vars": {"port": 80}}
            })
        );
    }

    #[test]
    fn test_meta_named_group_is_dropped() {
        let mut inventory = Inventory::new();
        inventory.upsert_group(META_KEY, Vec::new(), Vec::new(), Map::new());

        let document = inventory.finalize();
        assert!(document.groups.is_empty());
    }
}
