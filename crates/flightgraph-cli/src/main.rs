//! CLI entry point for the flightgraph query layer.
//!
//! Runs one catalog operation per invocation and writes the JSON result to
//! stdout. Logs go to stderr.

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use flightgraph_core::form::{decode_body, decode_pairs};
use flightgraph_core::FlightConfig;
use flightgraph_graph::catalog::Operation;
use flightgraph_graph::{AccessMode, GraphClient, GraphConfig, RetryPolicy, SessionExecutor};

#[derive(Parser)]
#[command(name = "flightgraph")]
#[command(about = "Query and update the airport connection graph")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file prefix (default: flightgraph).
    #[arg(short, long, default_value = "flightgraph", global = true)]
    config: String,

    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the operations in the query catalog.
    Operations,
    /// Connect and create the airport name uniqueness constraint.
    Schema,
    /// Run a catalog operation.
    Run {
        /// Operation name, e.g. shortest_path.
        operation: String,
        /// Parameter as key=value; repeatable.
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Parameters as a key=value&key=value body.
        #[arg(short, long)]
        body: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    match cli.command {
        Command::Operations => print_operations(),
        Command::Schema => {
            connect(&cli.config).await?;
            println!("schema ready");
        }
        Command::Run {
            operation,
            params,
            body,
        } => {
            let (config, client) = connect(&cli.config).await?;
            let decoding = config.form.decoding;
            let mut request = decode_pairs(params.iter().map(String::as_str), decoding)?;
            if let Some(body) = body {
                request.extend(decode_body(&body, decoding)?);
            }

            let executor =
                SessionExecutor::new(client).with_retry_policy(RetryPolicy::from(&config.retry));
            tracing::info!(%operation, params = request.len(), "Running operation");
            let outcome = executor.invoke(&operation, &request).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
    }

    Ok(())
}

/// Load configuration, connect to Neo4j and ensure the schema. Failure here
/// ends the process.
async fn connect(file_prefix: &str) -> anyhow::Result<(FlightConfig, GraphClient)> {
    let config = FlightConfig::load(file_prefix)?;
    let client = GraphClient::connect(&GraphConfig::from(&config.neo4j)).await?;
    Ok((config, client))
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_operations() {
    for op in Operation::ALL {
        let entry = op.entry();
        let params: Vec<&str> = entry.params.iter().map(|p| p.name).collect();
        let mode = match entry.mode {
            AccessMode::Read => "read",
            AccessMode::Write => "write",
        };
        println!("{:<28} {:<6} {}", op.name(), mode, params.join(", "));
    }
}
