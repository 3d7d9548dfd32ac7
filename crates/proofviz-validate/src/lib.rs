use std::collections::{BTreeSet, HashMap};

use proofviz_model::{
    DependencyEmbedding, Family, Kind, LookupTable, NodeType, TacticFlowCatalog, TheoremEntry,
};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RootPolicy {
    Single,
    /// Several roots only when every root is an `app` or `const` node.
    #[default]
    TermModeMayBranch,
    Any,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    pub root_policy: RootPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("theorem `{theorem}`: node id `{id}` declared at positions {first} and {second}")]
    DuplicateNodeId {
        theorem: String,
        id: String,
        first: usize,
        second: usize,
    },

    #[error("theorem `{theorem}`: edge {edge} references undeclared node `{id}`")]
    DanglingEdgeReference {
        theorem: String,
        edge: usize,
        id: String,
    },

    #[error("theorem `{theorem}`: cycle {}", .cycle.join(" -> "))]
    CycleDetected { theorem: String, cycle: Vec<String> },

    #[error("theorem `{theorem}`: {} roots ({})", .roots.len(), .roots.join(", "))]
    MultipleRoots { theorem: String, roots: Vec<String> },

    #[error("theorem `{theorem}` has no nodes")]
    EmptyGraph { theorem: String },

    #[error("theorem name `{name}` used by entries {first} and {second}")]
    DuplicateTheoremName {
        name: String,
        first: usize,
        second: usize,
    },

    #[error("edge {edge}: index {index} is out of range for {len} items")]
    IndexOutOfRange { edge: usize, index: i64, len: usize },

    #[error("item name `{name}` used at indices {first} and {second}")]
    DuplicateName {
        name: String,
        first: usize,
        second: usize,
    },
}

pub type ValidationResult<T> = Result<T, ValidationError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub roots: Vec<String>,
    /// Parents before children; ties go to the earlier declaration.
    pub topological_order: Vec<String>,
    pub leaves: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    pub index: usize,
    pub name: String,
    pub error: ValidationError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub accepted: Vec<TheoremEntry>,
    pub rejected: Vec<RejectedEntry>,
    pub colors: Option<LookupTable<NodeType>>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }

    pub fn into_catalog(self) -> TacticFlowCatalog {
        TacticFlowCatalog {
            theorems: self.accepted,
            colors: self.colors,
        }
    }
}

pub fn validate_theorem_entry(
    entry: TheoremEntry,
    options: &ValidationOptions,
) -> ValidationResult<TheoremEntry> {
    check_theorem_entry(&entry, options)?;
    Ok(entry)
}

pub fn check_theorem_entry(
    entry: &TheoremEntry,
    options: &ValidationOptions,
) -> ValidationResult<GraphSummary> {
    if entry.nodes.is_empty() {
        return Err(ValidationError::EmptyGraph {
            theorem: entry.name.clone(),
        });
    }

    let mut node_index: HashMap<&str, usize> = HashMap::with_capacity(entry.nodes.len());
    for (idx, node) in entry.nodes.iter().enumerate() {
        if let Some(&first) = node_index.get(node.id.as_str()) {
            return Err(ValidationError::DuplicateNodeId {
                theorem: entry.name.clone(),
                id: node.id.clone(),
                first,
                second: idx,
            });
        }
        node_index.insert(node.id.as_str(), idx);
    }

    let node_count = entry.nodes.len();
    let mut outgoing = vec![Vec::new(); node_count];
    let mut indegree = vec![0usize; node_count];
    for (edge_idx, edge) in entry.edges.iter().enumerate() {
        let lookup = |id: &str| {
            node_index
                .get(id)
                .copied()
                .ok_or_else(|| ValidationError::DanglingEdgeReference {
                    theorem: entry.name.clone(),
                    edge: edge_idx,
                    id: id.to_string(),
                })
        };
        let from = lookup(edge.from.as_str())?;
        let to = lookup(edge.to.as_str())?;
        outgoing[from].push(to);
        indegree[to] += 1;
    }

    let order = topological_order(&outgoing, &indegree);
    if order.len() < node_count {
        let cycle = find_cycle(&outgoing).unwrap_or_default();
        return Err(ValidationError::CycleDetected {
            theorem: entry.name.clone(),
            cycle: node_ids(entry, cycle),
        });
    }

    let roots: Vec<usize> = (0..node_count).filter(|&idx| indegree[idx] == 0).collect();
    let branching_allowed = match options.root_policy {
        RootPolicy::Single => false,
        RootPolicy::TermModeMayBranch => roots
            .iter()
            .all(|&idx| entry.nodes[idx].node_type.is_term_mode()),
        RootPolicy::Any => true,
    };
    if roots.len() > 1 && !branching_allowed {
        return Err(ValidationError::MultipleRoots {
            theorem: entry.name.clone(),
            roots: node_ids(entry, roots),
        });
    }

    let summary = GraphSummary {
        roots: node_ids(entry, roots),
        topological_order: node_ids(entry, order),
        leaves: node_ids(entry, (0..node_count).filter(|&idx| outgoing[idx].is_empty())),
    };
    debug!(
        theorem = %entry.name,
        nodes = node_count,
        edges = entry.edges.len(),
        roots = summary.roots.len(),
        "theorem graph validated"
    );
    Ok(summary)
}

fn node_ids(entry: &TheoremEntry, indices: impl IntoIterator<Item = usize>) -> Vec<String> {
    indices
        .into_iter()
        .map(|idx| entry.nodes[idx].id.clone())
        .collect()
}

/// Kahn's algorithm, always releasing the earliest-declared ready node.
fn topological_order(outgoing: &[Vec<usize>], indegree: &[usize]) -> Vec<usize> {
    let mut remaining = indegree.to_vec();
    let mut ready: BTreeSet<usize> = (0..remaining.len())
        .filter(|&idx| remaining[idx] == 0)
        .collect();

    let mut order = Vec::with_capacity(remaining.len());
    while let Some(node) = ready.pop_first() {
        order.push(node);
        for &next in &outgoing[node] {
            remaining[next] -= 1;
            if remaining[next] == 0 {
                ready.insert(next);
            }
        }
    }
    order
}

/// Node indices along one cycle, first node repeated at the end.
fn find_cycle(outgoing: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut state = vec![0u8; outgoing.len()];
    // (node, index of the next outgoing edge to follow)
    let mut path: Vec<(usize, usize)> = Vec::new();
    for start in 0..outgoing.len() {
        if state[start] != 0 {
            continue;
        }
        state[start] = 1;
        path.push((start, 0));
        while let Some(top) = path.last_mut() {
            let node = top.0;
            let Some(&next) = outgoing[node].get(top.1) else {
                state[node] = 2;
                path.pop();
                continue;
            };
            top.1 += 1;
            match state[next] {
                0 => {
                    state[next] = 1;
                    path.push((next, 0));
                }
                1 => {
                    let begin = path.iter().position(|&(idx, _)| idx == next).unwrap_or(0);
                    let mut cycle: Vec<usize> = path[begin..].iter().map(|&(idx, _)| idx).collect();
                    cycle.push(next);
                    return Some(cycle);
                }
                _ => {}
            }
        }
    }
    None
}

/// Stops at the first failing entry; duplicate theorem names count as failures.
pub fn validate_catalog(
    catalog: TacticFlowCatalog,
    options: &ValidationOptions,
) -> ValidationResult<TacticFlowCatalog> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for (idx, entry) in catalog.theorems.iter().enumerate() {
        if let Some(&first) = seen.get(entry.name.as_str()) {
            return Err(ValidationError::DuplicateTheoremName {
                name: entry.name.clone(),
                first,
                second: idx,
            });
        }
        seen.insert(entry.name.as_str(), idx);
        check_theorem_entry(entry, options)?;
    }
    Ok(catalog)
}

pub fn partition_catalog(catalog: TacticFlowCatalog, options: &ValidationOptions) -> CatalogReport {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    for (idx, entry) in catalog.theorems.into_iter().enumerate() {
        let outcome = match seen.get(&entry.name) {
            Some(&first) => Err(ValidationError::DuplicateTheoremName {
                name: entry.name.clone(),
                first,
                second: idx,
            }),
            None => check_theorem_entry(&entry, options).map(|_| ()),
        };
        seen.entry(entry.name.clone()).or_insert(idx);

        match outcome {
            Ok(()) => accepted.push(entry),
            Err(error) => {
                warn!(theorem = %entry.name, index = idx, %error, "rejected theorem entry");
                rejected.push(RejectedEntry {
                    index: idx,
                    name: entry.name,
                    error,
                });
            }
        }
    }

    CatalogReport {
        accepted,
        rejected,
        colors: catalog.colors,
    }
}

pub fn validate_dependency_embedding(
    embedding: DependencyEmbedding,
) -> ValidationResult<DependencyEmbedding> {
    check_dependency_embedding(&embedding)?;
    Ok(embedding)
}

pub fn check_dependency_embedding(embedding: &DependencyEmbedding) -> ValidationResult<()> {
    let len = embedding.items.len();
    for (edge_idx, edge) in embedding.edges.iter().enumerate() {
        for index in [edge.source, edge.target] {
            if !usize::try_from(index).is_ok_and(|index| index < len) {
                return Err(ValidationError::IndexOutOfRange {
                    edge: edge_idx,
                    index,
                    len,
                });
            }
        }
        if let Some((source, target)) = edge.indices() {
            if source == target {
                warn!(edge = edge_idx, item = %embedding.items[source].name, "item depends on itself");
            }
        }
    }

    let mut seen: HashMap<&str, usize> = HashMap::with_capacity(len);
    for (idx, item) in embedding.items.iter().enumerate() {
        if let Some(&first) = seen.get(item.name.as_str()) {
            return Err(ValidationError::DuplicateName {
                name: item.name.clone(),
                first,
                second: idx,
            });
        }
        seen.insert(item.name.as_str(), idx);
        if !item.pos.in_unit_cube() {
            debug!(item = %item.name, pos = ?item.pos, "position outside the unit cube");
        }
    }

    debug!(items = len, edges = embedding.edges.len(), "dependency embedding validated");
    Ok(())
}

pub fn unmapped_node_types(catalog: &TacticFlowCatalog) -> Vec<NodeType> {
    let used = catalog
        .theorems
        .iter()
        .flat_map(|entry| entry.nodes.iter().map(|node| &node.node_type));
    unmapped(used, catalog.colors.as_ref())
}

pub fn unmapped_kinds(embedding: &DependencyEmbedding) -> Vec<Kind> {
    let used = embedding.items.iter().map(|item| &item.kind);
    unmapped(used, embedding.kind_shapes.as_ref())
}

pub fn unmapped_families(embedding: &DependencyEmbedding) -> Vec<Family> {
    let used = embedding.items.iter().map(|item| &item.family);
    unmapped(used, embedding.family_colors.as_ref())
}

fn unmapped<'a, K>(used: impl Iterator<Item = &'a K>, table: Option<&LookupTable<K>>) -> Vec<K>
where
    K: Ord + Clone + 'a,
{
    used.filter(|key| !table.is_some_and(|table| table.contains(key)))
        .cloned()
        .collect::<BTreeSet<K>>()
        .into_iter()
        .collect()
}
