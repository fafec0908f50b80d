//! # cellmesh CLI Module
//!
//! This module implements the CLI interface for cellmesh.
//!
//! ## Available Commands
//!
//! - `info` - Show kind, counts and identifier marks of a document
//! - `validate` - Load a document and report whether it is well formed
//! - `format` - Rewrite a document in canonical form
//! - `query` - Run an adjacency query against a document

mod commands;

use crate::config::Config;
use cellmesh_core::MeshError;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// cellmesh - halfedge and halfface mesh documents
///
/// Inspect, validate, rewrite and query JSON mesh documents.
#[derive(Parser, Debug)]
#[command(name = "cellmesh")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress informational output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a TOML configuration file (default: ./cellmesh.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show document kind, live counts and identifier marks
    Info {
        /// Path to the document
        file: PathBuf,
    },

    /// Load a document and report whether it is well formed
    Validate {
        /// Path to the document
        file: PathBuf,
    },

    /// Rewrite a document in canonical form
    Format {
        /// Path to the document
        file: PathBuf,

        /// Output file (default: standard output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },

    /// Run an adjacency query
    Query {
        /// Path to the document
        file: PathBuf,

        #[command(subcommand)]
        query: QueryKind,
    },
}

/// Queries answered by `cellmesh query`.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum QueryKind {
    /// Vertices sharing an edge with a vertex (mesh)
    VertexNeighbors { vertex: u64 },

    /// Neighbors of a vertex in cyclic order (mesh)
    VertexRing { vertex: u64 },

    /// Stored cycle of a face (mesh)
    FaceVertices { face: u64 },

    /// Half-face of a cell containing the directed edge u->v (volmesh)
    CellFace { cell: u64, u: u64, v: u64 },

    /// Distinct half-face loops of a cell (volmesh)
    CellFaces { cell: u64 },

    /// Vertices of a cell (volmesh)
    CellVertices { cell: u64 },

    /// Cells sharing a face with a cell (volmesh)
    CellNeighbors { cell: u64 },
}

impl QueryKind {
    /// Command-line name of the query.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::VertexNeighbors { .. } => "vertex-neighbors",
            Self::VertexRing { .. } => "vertex-ring",
            Self::FaceVertices { .. } => "face-vertices",
            Self::CellFace { .. } => "cell-face",
            Self::CellFaces { .. } => "cell-faces",
            Self::CellVertices { .. } => "cell-vertices",
            Self::CellNeighbors { .. } => "cell-neighbors",
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Output and limit settings shared by every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub json: bool,
    pub quiet: bool,
    pub pretty: bool,
    pub max_file_size: u64,
}

impl Context {
    /// Merge command-line flags over the configuration file.
    #[must_use]
    pub fn new(cli: &Cli, config: &Config) -> Self {
        Self {
            json: cli.json,
            quiet: cli.quiet,
            pretty: config.output.pretty,
            max_file_size: config.limits.max_file_size,
        }
    }
}

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &Config) -> Result<(), MeshError> {
    let ctx = Context::new(&cli, config);

    match cli.command {
        Commands::Info { file } => cmd_info(&ctx, &file),
        Commands::Validate { file } => cmd_validate(&ctx, &file),
        Commands::Format {
            file,
            output,
            pretty,
        } => cmd_format(&ctx, &file, output.as_deref(), pretty),
        Commands::Query { file, query } => cmd_query(&ctx, &file, &query),
    }
}

// =============================================================================
// TESTS
// =============================================================================
