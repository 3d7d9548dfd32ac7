mod lexer;
mod lookup;
mod model;
mod parser;

use thiserror::Error;

pub use lookup::{
    resolve_color, LookupTable, Palette, DEFAULT_COLOR_FALLBACK, DEFAULT_SHAPE_FALLBACK,
};
pub use model::{
    DependencyEdge, DependencyEmbedding, DependencyItem, Document, Family, Kind, NodeType,
    Position, ProofStepEdge, ProofStepNode, TacticFlowCatalog, TheoremEntry,
};
pub use parser::{parse_catalog, parse_document, parse_embedding, parse_literal, to_json};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at byte {offset}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
}

impl ParseError {
    pub fn new(message: String, offset: usize) -> Self {
        Self { message, offset }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("syntax error: {0}")]
    Syntax(#[from] ParseError),

    #[error("document does not match the schema: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("document has both `theorems` and `items`")]
    AmbiguousDocument,

    #[error("document has neither `theorems` nor `items`")]
    UnknownDocument,
}
