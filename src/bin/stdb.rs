//! CLI entry point for the `stdb` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use spacetime_index::cli::commands;
use spacetime_index::{Axis, AxisSpec, Position, Region, StoreError};

#[derive(Parser)]
#[command(
    name = "stdb",
    about = "Spacetime index CLI: inspect and query tagged 4-D snapshot files"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

/// Region selection, one spec per axis: "lo:hi", "lo:", ":hi", ":" or a point "v".
#[derive(Args)]
struct RegionArgs {
    /// Time axis (negative bounds are relative to the latest entry)
    #[arg(long, default_value = ":", allow_hyphen_values = true)]
    t: AxisSpec,
    /// X axis
    #[arg(long, default_value = ":", allow_hyphen_values = true)]
    x: AxisSpec,
    /// Y axis
    #[arg(long, default_value = ":", allow_hyphen_values = true)]
    y: AxisSpec,
    /// Z axis
    #[arg(long, default_value = ":", allow_hyphen_values = true)]
    z: AxisSpec,
}

impl RegionArgs {
    fn region(&self) -> Region {
        Region::new(self.t, self.x, self.y, self.z)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty snapshot file
    Create {
        /// Path to the snapshot file to create
        file: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Insert one entry
    Insert {
        /// Path to the snapshot file
        file: PathBuf,
        /// Time coordinate
        #[arg(allow_hyphen_values = true)]
        t: f64,
        /// X coordinate
        #[arg(allow_hyphen_values = true)]
        x: f64,
        /// Y coordinate
        #[arg(allow_hyphen_values = true)]
        y: f64,
        /// Z coordinate
        #[arg(allow_hyphen_values = true)]
        z: f64,
        /// Payload (JSON, or plain text stored as a string)
        payload: String,
        /// Comma-separated tags
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Display information about a snapshot file
    Info {
        /// Path to the snapshot file
        file: PathBuf,
    },
    /// Dump entries in time order, one per line
    Dump {
        /// Path to the snapshot file
        file: PathBuf,
        /// Comma-separated tags the entries must carry
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Range query
    Query {
        /// Path to the snapshot file
        file: PathBuf,
        /// Comma-separated tags the entries must carry
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[command(flatten)]
        region: RegionArgs,
        /// Sort results along an axis: t, x, y or z
        #[arg(long)]
        sort: Option<String>,
        /// Maximum entries to print
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Bounding box of matching entries
    Bounds {
        /// Path to the snapshot file
        file: PathBuf,
        /// Comma-separated tags the entries must carry
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
        #[command(flatten)]
        region: RegionArgs,
    },
    /// Most recent entry carrying a tag
    Last {
        /// Path to the snapshot file
        file: PathBuf,
        /// Tag ("ALL" for any entry)
        tag: String,
    },
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let result = match cli.command {
        Commands::Create { file, force } => commands::cmd_create(&file, force),
        Commands::Insert {
            file,
            t,
            x,
            y,
            z,
            payload,
            tags,
        } => commands::cmd_insert(&file, Position::new(t, x, y, z), &tags, &payload, json),
        Commands::Info { file } => commands::cmd_info(&file, json),
        Commands::Dump { file, tags, output } => {
            commands::cmd_dump(&file, &tags, output.as_deref(), json)
        }
        Commands::Query {
            file,
            tags,
            region,
            sort,
            limit,
        } => {
            let sort = match sort.as_deref().map(Axis::from_name) {
                Some(None) => {
                    eprintln!("Invalid sort axis: {}", sort.unwrap_or_default());
                    process::exit(3);
                }
                Some(axis) => axis,
                None => None,
            };
            commands::cmd_query(&file, &tags, &region.region(), sort, limit, json)
        }
        Commands::Bounds { file, tags, region } => {
            commands::cmd_bounds(&file, &tags, &region.region(), json)
        }
        Commands::Last { file, tag } => commands::cmd_last(&file, &tag, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            StoreError::Io(_) => 1,
            StoreError::InvalidMagic
            | StoreError::UnsupportedVersion(_)
            | StoreError::ChecksumMismatch { .. }
            | StoreError::Truncated
            | StoreError::Corrupt(_)
            | StoreError::Payload(_)
            | StoreError::Compression(_) => 2,
            StoreError::InvalidQuery(_)
            | StoreError::InvalidPosition(_)
            | StoreError::UntaggedEntry => 3,
            StoreError::SnapshotNotFound(_)
            | StoreError::TagNotFound(_)
            | StoreError::NoEntries(_) => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
