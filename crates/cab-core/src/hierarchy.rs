//! Hierarchy builder: raw nested JSON → `ActionTree`.
//!
//! Input is a root object whose children live in a `children` array, nested
//! to any depth. Nodes are inserted in pre-order, so a node's `order` equals
//! its position in the flat pre-order list.

use crate::model::*;
use petgraph::graph::NodeIndex;
use serde::Deserialize;
use serde_json::{Map, Value};

/// A payload that does not have the shape of a hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    #[error("malformed hierarchy at {path}: node is not an object")]
    NotAnObject { path: String },

    #[error("malformed hierarchy at {path}: `children` is not an array")]
    ChildrenNotArray { path: String },

    #[error("malformed hierarchy at {path}: missing string field `{field}`")]
    MissingKind { path: String, field: &'static str },

    #[error("malformed hierarchy at {path}: unknown node kind `{tag}`")]
    UnknownKind { path: String, tag: String },

    #[error("malformed hierarchy at {path}: {message}")]
    InvalidPayload { path: String, message: String },
}

impl HierarchyError {
    /// JSON-pointer-like location of the offending node.
    pub fn path(&self) -> &str {
        match self {
            Self::NotAnObject { path }
            | Self::ChildrenNotArray { path }
            | Self::MissingKind { path, .. }
            | Self::UnknownKind { path, .. }
            | Self::InvalidPayload { path, .. } => path,
        }
    }
}

/// Build a tree from a nested payload.
///
/// Validation is fail-fast: the first malformed node aborts the build and
/// nothing partial is returned.
#[must_use = "building result should be used"]
pub fn build_tree(value: &Value, schema: TreeSchema) -> Result<ActionTree, HierarchyError> {
    let root_obj = as_object(value, "/")?;
    let kind = parse_kind(root_obj, schema, "/")?;
    let mut tree = ActionTree::with_root(kind, schema);
    let root = tree.root;
    insert_children(&mut tree, root, root_obj, schema, "")?;

    log::debug!("built {:?} tree with {} nodes", schema, tree.len());
    Ok(tree)
}

/// Build a tree from a JSON string.
pub fn build_tree_from_str(input: &str, schema: TreeSchema) -> Result<ActionTree, HierarchyError> {
    let value: Value = serde_json::from_str(input).map_err(|e| HierarchyError::InvalidPayload {
        path: "/".to_string(),
        message: e.to_string(),
    })?;
    build_tree(&value, schema)
}

fn insert_children(
    tree: &mut ActionTree,
    parent: NodeIndex,
    obj: &Map<String, Value>,
    schema: TreeSchema,
    path: &str,
) -> Result<(), HierarchyError> {
    let children = match obj.get("children") {
        None | Some(Value::Null) => return Ok(()),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(HierarchyError::ChildrenNotArray {
                path: display_path(path),
            });
        }
    };

    for (i, child) in children.iter().enumerate() {
        let child_path = format!("{path}/children/{i}");
        let child_obj = as_object(child, &child_path)?;
        let kind = parse_kind(child_obj, schema, &child_path)?;
        let idx = tree.add_child(parent, kind);
        insert_children(tree, idx, child_obj, schema, &child_path)?;
    }
    Ok(())
}

fn display_path(path: &str) -> String {
    if path.is_empty() {
        "/".to_string()
    } else {
        path.to_string()
    }
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, HierarchyError> {
    value.as_object().ok_or_else(|| HierarchyError::NotAnObject {
        path: display_path(path),
    })
}

fn parse_kind(
    obj: &Map<String, Value>,
    schema: TreeSchema,
    path: &str,
) -> Result<NodeKind, HierarchyError> {
    let field = schema.discriminator();
    let Some(tag) = obj.get(field).and_then(Value::as_str) else {
        return Err(HierarchyError::MissingKind {
            path: display_path(path),
            field,
        });
    };

    let payload = without_children(obj);

    let kind = match schema {
        TreeSchema::TrainNumber => match tag {
            "trainNumber" => NodeKind::TrainNumber(decode(&payload, path)?),
            "lineSection" => NodeKind::LineSection(decode(&payload, path)?),
            "lineEvent" => NodeKind::LineEvent(decode(&payload, path)?),
            "action" => NodeKind::Action(decode(&payload, path)?),
            other => {
                return Err(HierarchyError::UnknownKind {
                    path: display_path(path),
                    tag: other.to_string(),
                });
            }
        },
        TreeSchema::ComplexAction => {
            let action: ActionRef = decode(&payload, path)?;
            let attributes: CaAttributes = decode(&payload, path)?;
            NodeKind::Complex(ComplexAction::new(tag, action, attributes))
        }
    };
    Ok(kind)
}

/// The node's own fields, leaving the subtree behind.
fn without_children(obj: &Map<String, Value>) -> Value {
    Value::Object(
        obj.iter()
            .filter(|(key, _)| *key != "children")
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    )
}

fn decode<'a, T: Deserialize<'a>>(payload: &'a Value, path: &str) -> Result<T, HierarchyError> {
    T::deserialize(payload).map_err(|e| HierarchyError::InvalidPayload {
        path: display_path(path),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "childType": "trainNumber",
            "trainNumberId": 12,
            "trainNumberShortName": "IC 5",
            "children": [
                {
                    "childType": "lineSection",
                    "lineSectionId": 1,
                    "lineSectionType": 2,
                    "children": [
                        {
                            "childType": "lineEvent",
                            "actionListId": 40,
                            "trigger": "Departure",
                            "children": [
                                { "childType": "action", "actionId": 7, "actionType": "Display" },
                                { "childType": "action", "actionId": 8, "actionType": "CAStatic" }
                            ]
                        }
                    ]
                },
                { "childType": "lineSection", "lineSectionId": 2, "lineSectionType": 1, "children": null }
            ]
        })
    }

    #[test]
    fn orders_form_preorder_permutation() {
        let tree = build_tree(&sample(), TreeSchema::TrainNumber).unwrap();
        let orders: Vec<usize> = tree
            .preorder()
            .iter()
            .map(|&idx| tree.node(idx).order)
            .collect();
        assert_eq!(orders, (0..tree.len()).collect::<Vec<_>>());

        let tags: Vec<KindTag> = tree
            .preorder()
            .iter()
            .map(|&idx| tree.node(idx).kind.tag())
            .collect();
        assert_eq!(
            tags,
            vec![
                KindTag::TrainNumber,
                KindTag::LineSection,
                KindTag::LineEvent,
                KindTag::Action,
                KindTag::Action,
                KindTag::LineSection,
            ]
        );
    }

    #[test]
    fn depth_follows_nesting() {
        let tree = build_tree(&sample(), TreeSchema::TrainNumber).unwrap();
        let depths: Vec<usize> = tree
            .preorder()
            .iter()
            .map(|&idx| tree.node(idx).depth)
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 3, 3, 1]);
    }

    #[test]
    fn identical_payloads_get_distinct_ids() {
        let value = json!({
            "type": "Parallel",
            "children": [
                { "type": "Display", "actionId": 1 },
                { "type": "Display", "actionId": 1 }
            ]
        });
        let tree = build_tree(&value, TreeSchema::ComplexAction).unwrap();
        let kids = tree.children(tree.root);
        assert_ne!(tree.node(kids[0]).id, tree.node(kids[1]).id);
        assert_eq!(tree.node(kids[0]).kind, tree.node(kids[1]).kind);
    }

    #[test]
    fn node_payload_leaves_subtree_behind() {
        let value = json!({
            "type": "Serial",
            "CA_Time": 5,
            "children": [{ "type": "Display", "actionId": 1 }]
        });
        let payload = without_children(as_object(&value, "/").unwrap());
        assert_eq!(payload, json!({ "type": "Serial", "CA_Time": 5 }));
        assert!(value["children"].is_array());
    }

    #[test]
    fn complex_types_are_open_ended() {
        let value = json!({ "type": "Whatever", "CA_Time": "-1" });
        let tree = build_tree(&value, TreeSchema::ComplexAction).unwrap();
        let NodeKind::Complex(ca) = &tree.node(tree.root).kind else {
            panic!("expected complex node");
        };
        assert_eq!(ca.kind, ComplexKind::Other("Whatever".into()));
        assert_eq!(ca.attributes.time, Some(Scalar::Text("-1".into())));
    }

    #[test]
    fn rejects_non_object_child() {
        let value = json!({ "childType": "trainNumber", "children": [ 3 ] });
        let err = build_tree(&value, TreeSchema::TrainNumber).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::NotAnObject {
                path: "/children/0".into()
            }
        );
    }

    #[test]
    fn rejects_children_object() {
        let value = json!({ "childType": "trainNumber", "children": { "a": 1 } });
        let err = build_tree(&value, TreeSchema::TrainNumber).unwrap_err();
        assert_eq!(err, HierarchyError::ChildrenNotArray { path: "/".into() });
    }

    #[test]
    fn rejects_missing_discriminator() {
        let value = json!({
            "childType": "trainNumber",
            "children": [ { "childType": "lineSection", "children": [ { "actionId": 1 } ] } ]
        });
        let err = build_tree(&value, TreeSchema::TrainNumber).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::MissingKind {
                path: "/children/0/children/0".into(),
                field: "childType",
            }
        );
    }

    #[test]
    fn rejects_unknown_train_number_kind() {
        let value = json!({ "childType": "station" });
        let err = build_tree(&value, TreeSchema::TrainNumber).unwrap_err();
        assert_eq!(
            err,
            HierarchyError::UnknownKind {
                path: "/".into(),
                tag: "station".into()
            }
        );
    }

    #[test]
    fn rejects_bad_field_type() {
        let value = json!({ "childType": "action", "actionType": 5 });
        let err = build_tree(&value, TreeSchema::TrainNumber).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidPayload { .. }));
        assert_eq!(err.path(), "/");
    }

    #[test]
    fn from_str_reports_syntax_errors() {
        let err = build_tree_from_str("{not json", TreeSchema::TrainNumber).unwrap_err();
        assert!(matches!(err, HierarchyError::InvalidPayload { .. }));
    }
}
