//! node-query - print Elasticsearch searches for infrastructure node metrics
//!
//! Reads a node request (the JSON payload of the inventory route), runs it
//! through the query pipeline and prints the resulting search body. Nothing
//! is sent to a cluster.

mod config;
mod tracing_config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use config::Config;
use node_query::{
    NodeRequest, QueryRequestOptions, SearchBody, build_cardinality_query, build_node_query,
    partition_count, partitioned_options,
};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_config::{TracingConfig, initialize_tracing};

#[derive(Parser)]
#[command(name = "node-query")]
#[command(about = "Build Elasticsearch queries for host, pod and container metrics", long_about = None)]
#[command(version)]
struct Cli {
    /// Log only warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the search body for one partition of a node request
    Build {
        /// Request file, or "-" for stdin
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// YAML configuration file
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Partition to fetch (overrides the request)
        #[arg(long, value_name = "N")]
        partition: Option<u32>,

        /// Total number of partitions (overrides the request)
        #[arg(long, value_name = "M")]
        partitions: Option<u32>,

        /// Print JSON on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Print the query counting the nodes a request matches
    Count {
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long)]
        compact: bool,
    },
    /// Print one search body per partition for a known node count
    Plan {
        #[arg(value_name = "REQUEST")]
        request: PathBuf,

        /// Number of distinct nodes, as returned by the count query
        #[arg(long, value_name = "N")]
        cardinality: u64,

        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        #[arg(long)]
        compact: bool,
    },
    /// Print the JSON schema of node requests
    Schema,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let tracing = if cli.quiet {
        TracingConfig::default().with_log_level("warn")
    } else {
        TracingConfig::default()
    };
    initialize_tracing(tracing);

    match cli.command {
        Commands::Build {
            request,
            config,
            partition,
            partitions,
            compact,
        } => {
            let config = Config::load(config.as_deref())?;
            let mut options = load_options(&request, &config)?;

            if partition.is_some() || partitions.is_some() {
                let partition_id = partition.unwrap_or(options.partition_id);
                let number_of_partitions = partitions.unwrap_or(options.number_of_partitions);
                options = options.with_partition(partition_id, number_of_partitions);
            }

            let body = build_node_query(&options, &config.partition)
                .context("Failed to build node query")?;
            print_json(&body, compact)?;
        }
        Commands::Count {
            request,
            config,
            compact,
        } => {
            let config = Config::load(config.as_deref())?;
            let options = load_options(&request, &config)?;

            let body = build_cardinality_query(&options)
                .context("Failed to build node count query")?;
            print_json(&body, compact)?;
        }
        Commands::Plan {
            request,
            cardinality,
            config,
            compact,
        } => {
            let config = Config::load(config.as_deref())?;
            let options = load_options(&request, &config)?;

            let number_of_partitions = partition_count(cardinality, &config.partition);
            info!(cardinality, number_of_partitions, "planned node request");

            let bodies = partitioned_options(&options, number_of_partitions)
                .iter()
                .map(|options| build_node_query(options, &config.partition))
                .collect::<Result<Vec<SearchBody>, _>>()
                .context("Failed to build partitioned node queries")?;
            print_json(&bodies, compact)?;
        }
        Commands::Schema => {
            let schema = schemars::schema_for!(NodeRequest);
            print_json(&schema, false)?;
        }
    }

    Ok(())
}

/// Read a request and resolve it with the configured source fields
fn load_options(path: &Path, config: &Config) -> Result<QueryRequestOptions> {
    let mut request = read_request(path)?;
    if request.source_configuration.is_none() {
        request.source_configuration = Some(config.source.clone());
    }

    request
        .into_options()
        .with_context(|| format!("Invalid node request: {}", path.display()))
}

fn read_request(path: &Path) -> Result<NodeRequest> {
    let contents = if path == Path::new("-") {
        let mut contents = String::new();
        std::io::stdin()
            .read_to_string(&mut contents)
            .context("Failed to read request from stdin")?;
        contents
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read request file: {}", path.display()))?
    };

    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse node request: {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let output = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{output}");
    Ok(())
}
