use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use proofviz_model::{
    parse_catalog, parse_document, parse_embedding, to_json, DependencyEmbedding, Document,
    TacticFlowCatalog,
};
use proofviz_validate::{
    check_theorem_entry, partition_catalog, unmapped_families, unmapped_kinds,
    unmapped_node_types, validate_catalog, validate_dependency_embedding, RootPolicy,
    ValidationOptions,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proofviz")]
#[command(about = "Load and validate proof-graph visualization data")]
#[command(version)]
struct Cli {
    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a document and report every entry
    Check {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value_t = RootPolicyArg::TermModeMayBranch)]
        root_policy: RootPolicyArg,
        /// Check every theorem entry instead of stopping at the first failure
        #[arg(long)]
        keep_going: bool,
    },
    /// Validate a document and print it as canonical JSON
    Normalize {
        #[command(flatten)]
        input: InputArgs,
        #[arg(long, value_enum, default_value_t = RootPolicyArg::TermModeMayBranch)]
        root_policy: RootPolicyArg,
    },
    /// Print the color or shape resolved for every node or item
    Tokens {
        #[command(flatten)]
        input: InputArgs,
        /// Color used for keys no table maps
        #[arg(long)]
        fallback: Option<String>,
        /// Shape used for kinds no table maps
        #[arg(long)]
        shape_fallback: Option<String>,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Document to read; stdin when omitted
    file: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = DatasetArg::Auto)]
    dataset: DatasetArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum DatasetArg {
    /// Detect from the top-level `theorems` or `items` sequence
    Auto,
    /// Tactic-flow catalog
    Flow,
    /// Dependency embedding
    Embedding,
}

#[derive(Clone, Copy, ValueEnum)]
enum RootPolicyArg {
    Single,
    TermModeMayBranch,
    Any,
}

impl From<RootPolicyArg> for ValidationOptions {
    fn from(arg: RootPolicyArg) -> Self {
        let root_policy = match arg {
            RootPolicyArg::Single => RootPolicy::Single,
            RootPolicyArg::TermModeMayBranch => RootPolicy::TermModeMayBranch,
            RootPolicyArg::Any => RootPolicy::Any,
        };
        ValidationOptions { root_policy }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            input,
            root_policy,
            keep_going,
        } => {
            let options = ValidationOptions::from(root_policy);
            match load(&input)? {
                Document::Catalog(catalog) => check_catalog(catalog, &options, keep_going),
                Document::Embedding(embedding) => check_embedding(embedding),
            }
        }
        Commands::Normalize { input, root_policy } => {
            let options = ValidationOptions::from(root_policy);
            let json = match load(&input)? {
                Document::Catalog(catalog) => to_json(&validate_catalog(catalog, &options)?)?,
                Document::Embedding(embedding) => {
                    to_json(&validate_dependency_embedding(embedding)?)?
                }
            };
            println!("{json}");
            Ok(())
        }
        Commands::Tokens {
            input,
            fallback,
            shape_fallback,
        } => {
            match load(&input)? {
                Document::Catalog(catalog) => print_node_tokens(&catalog, fallback),
                Document::Embedding(embedding) => {
                    print_item_tokens(&embedding, fallback, shape_fallback)
                }
            }
            Ok(())
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read stdin")?;
            Ok(buffer)
        }
    }
}

fn load(input: &InputArgs) -> Result<Document> {
    let source = read_input(input.file.as_ref())?;
    let origin = input
        .file
        .as_ref()
        .map_or_else(|| "<stdin>".to_string(), |path| path.display().to_string());
    let document = match input.dataset {
        DatasetArg::Auto => parse_document(&source),
        DatasetArg::Flow => parse_catalog(&source).map(Document::Catalog),
        DatasetArg::Embedding => parse_embedding(&source).map(Document::Embedding),
    }
    .with_context(|| format!("failed to load {origin}"))?;
    info!(%origin, "document loaded");
    Ok(document)
}

fn check_catalog(
    catalog: TacticFlowCatalog,
    options: &ValidationOptions,
    keep_going: bool,
) -> Result<()> {
    for node_type in unmapped_node_types(&catalog) {
        warn!(%node_type, "node type has no color in the document; renderers fall back");
    }

    let total = catalog.theorems.len();
    let (catalog, failures) = if keep_going {
        let report = partition_catalog(catalog, options);
        for rejected in &report.rejected {
            println!("FAIL  {} (entry {}): {}", rejected.name, rejected.index, rejected.error);
        }
        let failures = report.rejected.len();
        (report.into_catalog(), failures)
    } else {
        (validate_catalog(catalog, options)?, 0)
    };

    for entry in &catalog.theorems {
        let summary = check_theorem_entry(entry, options)?;
        println!(
            "ok    {} ({} nodes, {} edges, roots: {})",
            entry.name,
            entry.nodes.len(),
            entry.edges.len(),
            summary.roots.join(", ")
        );
    }

    if failures > 0 {
        bail!("{failures} of {total} theorem entries failed validation");
    }
    Ok(())
}

fn check_embedding(embedding: DependencyEmbedding) -> Result<()> {
    for kind in unmapped_kinds(&embedding) {
        warn!(%kind, "kind has no shape in the document; renderers fall back");
    }
    for family in unmapped_families(&embedding) {
        warn!(%family, "family has no color in the document; renderers fall back");
    }

    let embedding = validate_dependency_embedding(embedding)?;
    println!(
        "ok    {} items, {} dependency edges",
        embedding.items.len(),
        embedding.edges.len()
    );
    Ok(())
}

fn print_node_tokens(catalog: &TacticFlowCatalog, fallback: Option<String>) {
    let mut palette = catalog.palette();
    if let Some(fallback) = fallback {
        palette = palette.with_fallback(fallback);
    }
    for entry in &catalog.theorems {
        for node in &entry.nodes {
            println!(
                "{}\t{}\t{}\t{}",
                entry.name,
                node.id,
                node.node_type,
                palette.resolve(&node.node_type)
            );
        }
    }
}

fn print_item_tokens(
    embedding: &DependencyEmbedding,
    fallback: Option<String>,
    shape_fallback: Option<String>,
) {
    let mut shapes = embedding.shape_palette();
    if let Some(shape_fallback) = shape_fallback {
        shapes = shapes.with_fallback(shape_fallback);
    }
    let mut colors = embedding.color_palette();
    if let Some(fallback) = fallback {
        colors = colors.with_fallback(fallback);
    }
    for item in &embedding.items {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            item.name,
            item.kind,
            shapes.resolve(&item.kind),
            item.family,
            colors.resolve(&item.family)
        );
    }
}
