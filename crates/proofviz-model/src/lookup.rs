use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::{Family, Kind, NodeType};

pub const DEFAULT_COLOR_FALLBACK: &str = "#94a3b8";
pub const DEFAULT_SHAPE_FALLBACK: &str = "circle";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LookupTable<K: Ord> {
    entries: BTreeMap<K, String>,
}

impl<K: Ord> LookupTable<K> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn resolve<'a>(&'a self, key: &K, fallback: &'a str) -> &'a str {
        self.get(key).unwrap_or(fallback)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &str)> {
        self.entries.iter().map(|(key, token)| (key, token.as_str()))
    }
}

impl<K: Ord> Default for LookupTable<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V: Into<String>> FromIterator<(K, V)> for LookupTable<K> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(key, token)| (key, token.into()))
                .collect(),
        }
    }
}

impl LookupTable<NodeType> {
    pub fn default_node_colors() -> Self {
        [
            (NodeType::Goal, "#3b82f6"),
            (NodeType::Hypothesis, "#10b981"),
            (NodeType::Tactic, "#f59e0b"),
            (NodeType::SimpTrace, "#8b5cf6"),
            (NodeType::CalcStep, "#06b6d4"),
            (NodeType::Qed, "#22c55e"),
            (NodeType::App, "#3b82f6"),
            (NodeType::Const, "#f59e0b"),
        ]
        .into_iter()
        .collect()
    }
}

impl LookupTable<Kind> {
    pub fn default_kind_shapes() -> Self {
        [
            (Kind::Theorem, "hexagon"),
            (Kind::Lemma, "diamond"),
            (Kind::Def, "rect"),
            (Kind::Structure, "ellipse"),
            (Kind::Type, "circle"),
            (Kind::Aux, "triangle"),
        ]
        .into_iter()
        .collect()
    }
}

impl LookupTable<Family> {
    pub fn default_family_colors() -> Self {
        [
            (Family::from("Core"), "#ef4444"),
            (Family::from("Constructor"), "#8b5cf6"),
            (Family::from("QKD/BB84"), "#f59e0b"),
        ]
        .into_iter()
        .collect()
    }
}

pub fn resolve_color<'a, K: Ord>(key: &K, table: &'a LookupTable<K>, fallback: &'a str) -> &'a str {
    table.resolve(key, fallback)
}

/// A document's own table layered over a built-in table and a fallback token.
#[derive(Debug, Clone)]
pub struct Palette<'a, K: Ord> {
    document: Option<&'a LookupTable<K>>,
    defaults: LookupTable<K>,
    fallback: String,
}

impl<'a, K: Ord> Palette<'a, K> {
    pub fn new(
        document: Option<&'a LookupTable<K>>,
        defaults: LookupTable<K>,
        fallback: impl Into<String>,
    ) -> Self {
        Self {
            document,
            defaults,
            fallback: fallback.into(),
        }
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    pub fn resolve(&self, key: &K) -> &str {
        self.document
            .and_then(|table| table.get(key))
            .or_else(|| self.defaults.get(key))
            .unwrap_or(&self.fallback)
    }

    pub fn is_mapped(&self, key: &K) -> bool {
        self.document.is_some_and(|table| table.contains(key)) || self.defaults.contains(key)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_known_node_type_has_a_default_color() {
        let colors = LookupTable::default_node_colors();
        for node_type in NodeType::KNOWN {
            assert!(colors.contains(&node_type), "missing {node_type}");
        }
    }

    #[test]
    fn every_known_kind_has_a_default_shape() {
        let shapes = LookupTable::default_kind_shapes();
        for kind in Kind::KNOWN {
            assert!(shapes.contains(&kind), "missing {kind}");
        }
    }

    #[test]
    fn document_table_shadows_defaults() {
        let document: LookupTable<NodeType> = [(NodeType::Goal, "#000000")].into_iter().collect();
        let palette = Palette::new(
            Some(&document),
            LookupTable::default_node_colors(),
            DEFAULT_COLOR_FALLBACK,
        );
        assert_eq!(palette.resolve(&NodeType::Goal), "#000000");
        assert_eq!(palette.resolve(&NodeType::Qed), "#22c55e");
        assert_eq!(
            palette.resolve(&NodeType::from("lemma_ref")),
            DEFAULT_COLOR_FALLBACK
        );
        assert!(!palette.is_mapped(&NodeType::from("lemma_ref")));
    }

    #[test]
    fn tables_iterate_in_key_order() {
        let table: LookupTable<Family> = [
            (Family::from("QKD/BB84"), "#f59e0b"),
            (Family::from("Core"), "#ef4444"),
            (Family::from("Constructor"), "#8b5cf6"),
        ]
        .into_iter()
        .collect();
        let keys: Vec<_> = table.iter().map(|(family, _)| family.as_str()).collect();
        assert_eq!(keys, vec!["Constructor", "Core", "QKD/BB84"]);
        assert_eq!(table.iter().next().map(|(_, token)| token), Some("#8b5cf6"));
    }

    #[test]
    fn fallback_can_be_replaced() {
        let palette = Palette::new(None, LookupTable::default_kind_shapes(), DEFAULT_SHAPE_FALLBACK);
        assert_eq!(palette.fallback(), "circle");

        let palette = palette.with_fallback("star");
        assert_eq!(palette.fallback(), "star");
        assert_eq!(palette.resolve(&Kind::from("axiom")), "star");
        assert_eq!(palette.resolve(&Kind::Lemma), "diamond");
    }
}
