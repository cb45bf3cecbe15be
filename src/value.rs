use crate::ast::Node;
use crate::config::Config;
use crate::error::CfgError;
use crate::token::{Token, Value};
use std::collections::HashMap;

/// An insertion-ordered string-keyed map, backing `Value::Mapping` and
/// the result of `Config::as_dict`.
///
/// A duplicate key inserted later overwrites the earlier value but keeps
/// the earlier position, mirroring Python's `dict` semantics (which the
/// teacher's JSON example leans on for object decoding).
#[derive(Debug, Clone, Default)]
pub struct OrderedMap {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
}

impl OrderedMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

impl PartialEq for OrderedMap {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl FromIterator<(String, Value)> for OrderedMap {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        let mut m = OrderedMap::new();
        for (k, v) in iter {
            m.insert(k, v);
        }
        m
    }
}

/// An unevaluated mapping: the owning document, and the still-lazy
/// `(Token, Node)` pairs from a `Node::Mapping` or the root of a
/// `Config`. Cloning is cheap-ish (an `Rc` clone of the document plus a
/// clone of the small AST slice); full materialization only happens in
/// `as_plain`, per spec.md §4.5's "no partial-path cache" rule.
#[derive(Debug, Clone)]
pub struct MappingValue {
    config: Config,
    elements: Vec<(Token, Node)>,
}

impl MappingValue {
    pub fn new(config: Config, elements: Vec<(Token, Node)>) -> Self {
        Self { config, elements }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().map(|(k, _)| k.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The raw, unevaluated AST node for `key`, if present. Later
    /// entries with the same key shadow earlier ones (the parser already
    /// reports true duplicates at load time per spec.md §4.6; this
    /// lookup only has to pick the last match for robustness).
    pub fn base_get(&self, key: &str) -> Option<&Node> {
        self.elements
            .iter()
            .rev()
            .find(|(k, _)| k.text == key)
            .map(|(_, v)| v)
    }

    /// Evaluate `key`'s node to a fully materialized [`Value`].
    pub fn get(&self, key: &str) -> Result<Value, CfgError> {
        match self.base_get(key) {
            Some(node) => crate::evaluator::eval_node(&self.config, node),
            None => Err(CfgError::config(format!("Not found in configuration: {}", key))),
        }
    }

    /// Evaluate every entry into a plain [`OrderedMap`].
    pub fn as_plain(&self) -> Result<OrderedMap, CfgError> {
        let mut out = OrderedMap::new();
        for (k, v) in &self.elements {
            out.insert(k.text.clone(), crate::evaluator::eval_node(&self.config, v)?);
        }
        Ok(out)
    }
}

/// An unevaluated list: the owning document and the still-lazy element
/// nodes, plus Python-style slicing.
#[derive(Debug, Clone)]
pub struct ListValue {
    config: Config,
    elements: Vec<Node>,
}

impl ListValue {
    pub fn new(config: Config, elements: Vec<Node>) -> Self {
        Self { config, elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn base_get(&self, index: i64) -> Result<&Node, CfgError> {
        let len = self.elements.len();
        normalize_index(index, len)
            .map(|i| &self.elements[i])
            .ok_or_else(|| {
                CfgError::bad_index(
                    format!(
                        "index out of range: is {}, must be between 0 and {}",
                        index,
                        len.saturating_sub(1)
                    ),
                    None,
                )
            })
    }

    pub fn get(&self, index: i64) -> Result<Value, CfgError> {
        let node = self.base_get(index)?;
        crate::evaluator::eval_node(&self.config, node)
    }

    pub fn as_plain(&self) -> Result<Vec<Value>, CfgError> {
        self.elements
            .iter()
            .map(|n| crate::evaluator::eval_node(&self.config, n))
            .collect()
    }

    /// Python-style half-open slicing with negative-step support, per
    /// the resolved Open Question in DESIGN.md.
    pub fn slice(&self, start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Result<Vec<Value>, CfgError> {
        let step = step.unwrap_or(1);
        if step == 0 {
            return Err(CfgError::bad_index("slice step cannot be zero", None));
        }
        let len = self.elements.len() as i64;
        let (lo, hi) = slice_bounds(start, stop, step, len);
        let mut out = Vec::new();
        if step > 0 {
            let mut i = lo;
            while i < hi {
                out.push(crate::evaluator::eval_node(&self.config, &self.elements[i as usize])?);
                i += step;
            }
        } else {
            let mut i = lo;
            while i > hi {
                out.push(crate::evaluator::eval_node(&self.config, &self.elements[i as usize])?);
                i += step;
            }
        }
        Ok(out)
    }
}

fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let i = if index < 0 { index + len } else { index };
    if i < 0 || i >= len {
        None
    } else {
        Some(i as usize)
    }
}

/// Python's slice-index clamping, specialized to a known step sign.
fn slice_bounds(start: Option<i64>, stop: Option<i64>, step: i64, len: i64) -> (i64, i64) {
    let clamp_pos = |v: i64| -> i64 {
        let v = if v < 0 { v + len } else { v };
        v.clamp(0, len)
    };
    let clamp_neg = |v: i64| -> i64 {
        let v = if v < 0 { v + len } else { v };
        v.clamp(-1, len - 1)
    };
    if step > 0 {
        let lo = start.map(clamp_pos).unwrap_or(0);
        let hi = stop.map(clamp_pos).unwrap_or(len);
        (lo, hi)
    } else {
        let lo = start.map(clamp_neg).unwrap_or(len - 1);
        let hi = stop.map(clamp_neg).unwrap_or(-1);
        (lo, hi)
    }
}

/// The three shapes a path walk can land on mid-traversal: still
/// navigable containers, or a fully-resolved scalar. Keeping `Mapping`
/// and `List` lazy is what lets `a.b[2].c` only evaluate the nodes it
/// actually visits.
pub enum Position {
    Mapping(MappingValue),
    List(ListValue),
    Scalar(Value),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_map_duplicate_insert_keeps_position_but_updates_value() {
        let mut m = OrderedMap::new();
        m.insert("a", Value::Integer(1));
        m.insert("b", Value::Integer(2));
        m.insert("a", Value::Integer(3));
        let keys: Vec<&str> = m.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(m.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn slice_bounds_handles_positive_and_negative_step() {
        assert_eq!(slice_bounds(Some(1), Some(4), 1, 5), (1, 4));
        assert_eq!(slice_bounds(None, None, 1, 5), (0, 5));
        assert_eq!(slice_bounds(None, None, -1, 5), (4, -1));
    }

    #[test]
    fn normalize_index_wraps_negative_indices() {
        assert_eq!(normalize_index(-1, 3), Some(2));
        assert_eq!(normalize_index(3, 3), None);
    }
}
