use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::lookup::{LookupTable, Palette, DEFAULT_COLOR_FALLBACK, DEFAULT_SHAPE_FALLBACK};

/// Category of a step in a tactic-flow graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Goal,
    Hypothesis,
    Tactic,
    SimpTrace,
    CalcStep,
    Qed,
    App,
    Const,
    /// A category this crate does not know yet, kept verbatim.
    Unrecognized(String),
}

impl NodeType {
    pub const KNOWN: [NodeType; 8] = [
        NodeType::Goal,
        NodeType::Hypothesis,
        NodeType::Tactic,
        NodeType::SimpTrace,
        NodeType::CalcStep,
        NodeType::Qed,
        NodeType::App,
        NodeType::Const,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            NodeType::Goal => "goal",
            NodeType::Hypothesis => "hypothesis",
            NodeType::Tactic => "tactic",
            NodeType::SimpTrace => "simp_trace",
            NodeType::CalcStep => "calc_step",
            NodeType::Qed => "qed",
            NodeType::App => "app",
            NodeType::Const => "const",
            NodeType::Unrecognized(raw) => raw,
        }
    }

    /// Nodes of proofs written as terms rather than tactic scripts.
    pub fn is_term_mode(&self) -> bool {
        matches!(self, NodeType::App | NodeType::Const)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, NodeType::Unrecognized(_))
    }
}

impl From<&str> for NodeType {
    fn from(raw: &str) -> Self {
        match raw {
            "goal" => NodeType::Goal,
            "hypothesis" => NodeType::Hypothesis,
            "tactic" => NodeType::Tactic,
            "simp_trace" => NodeType::SimpTrace,
            "calc_step" => NodeType::CalcStep,
            "qed" => NodeType::Qed,
            "app" => NodeType::App,
            "const" => NodeType::Const,
            other => NodeType::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for NodeType {
    fn from(raw: String) -> Self {
        match NodeType::from(raw.as_str()) {
            NodeType::Unrecognized(_) => NodeType::Unrecognized(raw),
            known => known,
        }
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Syntactic category of a named proof constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Kind {
    Theorem,
    Lemma,
    Def,
    Structure,
    Type,
    Aux,
    Unrecognized(String),
}

impl Kind {
    pub const KNOWN: [Kind; 6] = [
        Kind::Theorem,
        Kind::Lemma,
        Kind::Def,
        Kind::Structure,
        Kind::Type,
        Kind::Aux,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Kind::Theorem => "theorem",
            Kind::Lemma => "lemma",
            Kind::Def => "def",
            Kind::Structure => "structure",
            Kind::Type => "type",
            Kind::Aux => "aux",
            Kind::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Kind::Unrecognized(_))
    }
}

impl From<&str> for Kind {
    fn from(raw: &str) -> Self {
        match raw {
            "theorem" => Kind::Theorem,
            "lemma" => Kind::Lemma,
            "def" => Kind::Def,
            "structure" => Kind::Structure,
            "type" => Kind::Type,
            "aux" => Kind::Aux,
            other => Kind::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Kind {
    fn from(raw: String) -> Self {
        match Kind::from(raw.as_str()) {
            Kind::Unrecognized(_) => Kind::Unrecognized(raw),
            known => known,
        }
    }
}

impl From<Kind> for String {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace label used to group constants for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Family(String);

impl Family {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Family {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStepNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub label: String,
    /// Layout hint; not required to grow along edges.
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStepEdge {
    pub from: String,
    pub to: String,
}

impl ProofStepEdge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TheoremEntry {
    pub name: String,
    pub file: String,
    pub description: String,
    pub statement: String,
    pub nodes: Vec<ProofStepNode>,
    #[serde(default)]
    pub edges: Vec<ProofStepEdge>,
}

impl TheoremEntry {
    pub fn node(&self, id: &str) -> Option<&ProofStepNode> {
        self.nodes.iter().find(|node| node.id == id)
    }

    /// Targets of the edges leaving `id`, in declaration order.
    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.edges
            .iter()
            .filter(move |edge| edge.from == id)
            .map(|edge| edge.to.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TacticFlowCatalog {
    pub theorems: Vec<TheoremEntry>,
    #[serde(default, alias = "tacticFlowColors", skip_serializing_if = "Option::is_none")]
    pub colors: Option<LookupTable<NodeType>>,
}

impl TacticFlowCatalog {
    pub fn theorem(&self, name: &str) -> Option<&TheoremEntry> {
        self.theorems.iter().find(|entry| entry.name == name)
    }

    /// The document's own colors over the built-in node palette.
    pub fn palette(&self) -> Palette<'_, NodeType> {
        Palette::new(
            self.colors.as_ref(),
            LookupTable::default_node_colors(),
            DEFAULT_COLOR_FALLBACK,
        )
    }

    pub(crate) fn warn_unrecognized(&self) {
        for entry in &self.theorems {
            for node in &entry.nodes {
                if let NodeType::Unrecognized(raw) = &node.node_type {
                    warn!(theorem = %entry.name, node = %node.id, node_type = %raw, "unrecognized node type");
                }
            }
        }
    }
}

/// Point in the embedding space; each axis is conventionally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "PositionRepr")]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn in_unit_cube(&self) -> bool {
        [self.x, self.y, self.z]
            .iter()
            .all(|axis| (0.0..=1.0).contains(axis))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PositionRepr {
    Object { x: f64, y: f64, z: f64 },
    Array([f64; 3]),
}

impl From<PositionRepr> for Position {
    fn from(repr: PositionRepr) -> Self {
        match repr {
            PositionRepr::Object { x, y, z } => Position { x, y, z },
            PositionRepr::Array([x, y, z]) => Position { x, y, z },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyItem {
    pub name: String,
    pub kind: Kind,
    pub family: Family,
    pub pos: Position,
}

/// `items[source]` is consumed by `items[target]`. Indices are kept as written,
/// negative ones included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "(i64, i64)", into = "(i64, i64)")]
pub struct DependencyEdge {
    pub source: i64,
    pub target: i64,
}

impl DependencyEdge {
    pub fn new(source: i64, target: i64) -> Self {
        Self { source, target }
    }

    /// `(source, target)` as item positions, or `None` if either is negative.
    pub fn indices(&self) -> Option<(usize, usize)> {
        let source = usize::try_from(self.source).ok()?;
        let target = usize::try_from(self.target).ok()?;
        Some((source, target))
    }
}

impl From<(i64, i64)> for DependencyEdge {
    fn from((source, target): (i64, i64)) -> Self {
        Self { source, target }
    }
}

impl From<DependencyEdge> for (i64, i64) {
    fn from(edge: DependencyEdge) -> Self {
        (edge.source, edge.target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyEmbedding {
    pub items: Vec<DependencyItem>,
    #[serde(default)]
    pub edges: Vec<DependencyEdge>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind_shapes: Option<LookupTable<Kind>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_colors: Option<LookupTable<Family>>,
}

impl DependencyEmbedding {
    pub fn item(&self, name: &str) -> Option<&DependencyItem> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Items consumed by `items[index]`, in edge declaration order.
    pub fn dependencies_of(&self, index: usize) -> impl Iterator<Item = &DependencyItem> + '_ {
        self.edges
            .iter()
            .filter_map(DependencyEdge::indices)
            .filter(move |&(_, target)| target == index)
            .filter_map(|(source, _)| self.items.get(source))
    }

    pub fn shape_palette(&self) -> Palette<'_, Kind> {
        Palette::new(
            self.kind_shapes.as_ref(),
            LookupTable::default_kind_shapes(),
            DEFAULT_SHAPE_FALLBACK,
        )
    }

    pub fn color_palette(&self) -> Palette<'_, Family> {
        Palette::new(
            self.family_colors.as_ref(),
            LookupTable::default_family_colors(),
            DEFAULT_COLOR_FALLBACK,
        )
    }

    pub(crate) fn warn_unrecognized(&self) {
        for item in &self.items {
            if let Kind::Unrecognized(raw) = &item.kind {
                warn!(item = %item.name, kind = %raw, "unrecognized constant kind");
            }
        }
    }
}

/// Either dataset, as told apart by the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Catalog(TacticFlowCatalog),
    Embedding(DependencyEmbedding),
}
