// Local copy of a database location, kept current from put/patch events
use serde::Deserialize;
use serde_json::{Map, Value};

/// Payload of a Firebase `put` or `patch` event.
#[derive(Debug, Deserialize)]
pub struct PathUpdate {
    pub path: String,
    pub data: Value,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SnapshotTree {
    root: Value,
}

impl SnapshotTree {
    pub fn new() -> Self {
        Self { root: Value::Null }
    }

    /// Current value; `None` when the location holds nothing.
    pub fn snapshot(&self) -> Option<Value> {
        match &self.root {
            Value::Null => None,
            value => Some(value.clone()),
        }
    }

    /// Replace the value at `path`; `null` deletes it.
    pub fn put(&mut self, path: &str, data: Value) {
        let segments = segments(path);
        set(&mut self.root, &segments, data);
    }

    /// Replace each child named in `data` under `path`.
    pub fn patch(&mut self, path: &str, data: Value) {
        let Value::Object(children) = data else {
            self.put(path, data);
            return;
        };
        let base = segments(path);
        for (key, value) in children {
            let mut child_path = base.clone();
            child_path.extend(key.split('/').filter(|s| !s.is_empty()));
            set(&mut self.root, &child_path, value);
        }
    }
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn set(node: &mut Value, path: &[&str], data: Value) {
    let Some((first, rest)) = path.split_first() else {
        *node = data;
        return;
    };

    if data.is_null() {
        let emptied = match node {
            Value::Object(children) => {
                let child_gone = match children.get_mut(*first) {
                    Some(child) => {
                        set(child, rest, data);
                        child.is_null()
                    }
                    None => false,
                };
                if child_gone {
                    children.remove(*first);
                }
                children.is_empty()
            }
            _ => false,
        };
        if emptied {
            *node = Value::Null;
        }
        return;
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(children) = node {
        let child = children.entry(first.to_string()).or_insert(Value::Null);
        set(child, rest, data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_put_root_and_child() {
        let mut tree = SnapshotTree::new();
        assert_eq!(tree.snapshot(), None);

        tree.put("/", json!({"dist": 10, "light": 3}));
        tree.put("/dist", json!(11));
        assert_eq!(tree.snapshot(), Some(json!({"dist": 11, "light": 3})));

        tree.put("/", Value::Null);
        assert_eq!(tree.snapshot(), None);
    }

    #[test]
    fn test_patch_merges_children() {
        let mut tree = SnapshotTree::new();
        tree.put("/", json!({"dist": 10, "light": 3}));
        tree.patch("/", json!({"light": 4, "sound": 50}));
        assert_eq!(
            tree.snapshot(),
            Some(json!({"dist": 10, "light": 4, "sound": 50}))
        );
    }

    #[test]
    fn test_null_deletes_and_prunes() {
        let mut tree = SnapshotTree::new();
        tree.put("/a/b", json!(1));
        assert_eq!(tree.snapshot(), Some(json!({"a": {"b": 1}})));

        tree.patch("/a", json!({"b": null}));
        assert_eq!(tree.snapshot(), None);
    }

    #[test]
    fn test_put_into_scalar_replaces_it() {
        let mut tree = SnapshotTree::new();
        tree.put("/", json!(5));
        tree.put("/light", json!(2));
        assert_eq!(tree.snapshot(), Some(json!({"light": 2})));
    }
}
