//! Ontology precedence index.
//!
//! The platform ontology is a tree of classification attributes with nested
//! answer options; every node carries a feature hash and a dotted id
//! (`"1.2.3"`) encoding its position. Canonicalization needs the integer
//! precedence of arbitrary nodes, so the index is built once per session by
//! walking every attribute subtree, replacing repeated tree searches.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::types::Precedence;

/// Per-session lookup from (attribute feature hash, node feature hash) to
/// the node's integer precedence.
#[derive(Debug, Clone)]
pub struct OntologyIndex {
    attributes: HashMap<String, HashMap<String, Precedence>>,
}

impl OntologyIndex {
    /// Build the index from the ontology's classification-attribute list.
    ///
    /// Two attribute subtrees sharing a feature hash make attribute lookup
    /// ambiguous and fail the build outright.
    pub fn build(classifications: &serde_json::Value) -> Result<Self, CoreError> {
        let list = classifications.as_array().ok_or_else(|| {
            CoreError::Configuration(
                "ontology classifications must be a JSON array".to_string(),
            )
        })?;

        let mut attributes: HashMap<String, HashMap<String, Precedence>> = HashMap::new();

        for subtree in list {
            let attr_hash = feature_hash_of(subtree).ok_or_else(|| {
                CoreError::Configuration(
                    "classification attribute is missing 'featureNodeHash'".to_string(),
                )
            })?;

            if attributes.contains_key(attr_hash) {
                return Err(CoreError::Configuration(format!(
                    "multiple classification attributes share feature hash '{attr_hash}'"
                )));
            }

            let mut nodes = HashMap::new();
            collect_precedences(subtree, &mut nodes)?;
            attributes.insert(attr_hash.to_string(), nodes);
        }

        Ok(Self { attributes })
    }

    /// Precedence of `node_hash` within the attribute identified by
    /// `attribute_hash`.
    pub fn precedence(
        &self,
        attribute_hash: &str,
        node_hash: &str,
    ) -> Result<Precedence, CoreError> {
        let nodes = self.attributes.get(attribute_hash).ok_or_else(|| {
            CoreError::Configuration(format!(
                "no classification attribute matches feature hash '{attribute_hash}'"
            ))
        })?;

        nodes.get(node_hash).copied().ok_or_else(|| {
            CoreError::Configuration(format!(
                "feature hash '{node_hash}' not found under attribute '{attribute_hash}'"
            ))
        })
    }

    /// Number of indexed attribute subtrees.
    pub fn attribute_count(&self) -> usize {
        self.attributes.len()
    }
}

/// Parse a dotted precedence id into its integer form (`"1.2.3"` -> `123`).
fn parse_precedence(id: &str) -> Result<Precedence, CoreError> {
    let digits: String = id.split('.').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(CoreError::Configuration(format!(
            "ontology node id '{id}' is not a dotted sequence of integers"
        )));
    }
    digits.parse().map_err(|_| {
        CoreError::Configuration(format!("ontology node id '{id}' is out of range"))
    })
}

fn feature_hash_of(node: &serde_json::Value) -> Option<&str> {
    node.get("featureNodeHash").and_then(|v| v.as_str())
}

/// Depth-first walk recording the precedence of every node that carries
/// both a feature hash and a dotted id. Descends through both `options`
/// (answer choices) and nested `attributes` (sub-questions); leaves without
/// either simply end the walk.
fn collect_precedences(
    node: &serde_json::Value,
    out: &mut HashMap<String, Precedence>,
) -> Result<(), CoreError> {
    if let (Some(hash), Some(id)) = (feature_hash_of(node), node.get("id").and_then(|v| v.as_str()))
    {
        out.insert(hash.to_string(), parse_precedence(id)?);
    }

    for children_key in ["options", "attributes"] {
        if let Some(children) = node.get(children_key).and_then(|v| v.as_array()) {
            for child in children {
                collect_precedences(child, out)?;
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
