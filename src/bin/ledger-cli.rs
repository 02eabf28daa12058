use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::process::ExitCode;

use ledger_driver::config::{load_config, validate_config, ConfigError, DriverConfig};
use ledger_driver::ledger::{Keypair, LedgerClient, Operation, PrepareRequest, SendMode, TransactionsEndpoint};
use ledger_driver::net::NodeSpec;
use ledger_driver::observability::init_logging;
use ledger_driver::TransportError;

#[derive(Parser)]
#[command(name = "ledger-cli")]
#[command(about = "Command line client for ledger federation nodes", long_about = None)]
struct Cli {
    /// TOML driver configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Node URL, repeatable. Replaces the nodes of the config file
    #[arg(short, long = "node")]
    nodes: Vec<String>,

    /// Overall request timeout in seconds
    #[arg(short, long)]
    timeout: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the node root document
    Info,
    /// Show the API description
    ApiInfo,
    /// Print the normalized node list
    Nodes,
    /// Generate a new keypair
    Keygen,
    /// Transaction commands
    Tx {
        #[command(subcommand)]
        command: TxCommands,
    },
    /// List outputs owned by a public key
    Outputs {
        public_key: String,
        #[arg(long)]
        spent: Option<bool>,
    },
    /// Block commands
    Blocks {
        #[command(subcommand)]
        command: BlockCommands,
    },
    /// Search asset data
    Assets {
        search: String,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Search transaction metadata
    Metadata {
        search: String,
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Fetch a transaction by id
    Retrieve { txid: String },
    /// Fetch the processing status of a transaction
    Status { txid: String },
    /// List transactions of an asset
    Get {
        #[arg(long)]
        asset_id: String,
        #[arg(long)]
        operation: Option<Operation>,
    },
    /// Create, sign and submit a CREATE transaction with the key in LEDGER_PRIVATE_KEY
    Create {
        /// Asset data as JSON
        #[arg(long)]
        data: Option<String>,
        /// Metadata as JSON
        #[arg(long)]
        metadata: Option<String>,
        /// async, sync or commit
        #[arg(long, default_value = "commit")]
        mode: SendMode,
    },
}

#[derive(Subcommand)]
enum BlockCommands {
    /// Heights of blocks containing a transaction
    Get { txid: String },
    /// Fetch a block by height
    Retrieve { height: u64 },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(TransportError::Timeout { errors }) = e.downcast_ref::<TransportError>() {
                for (i, err) in errors.iter().enumerate() {
                    eprintln!("  attempt {}: {}", i + 1, err);
                }
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(&cli)?;
    init_logging(&config.observability.log_level);

    let client = LedgerClient::from_config(&config)?;
    let response = dispatch(&client, cli.command).await?;
    print_json(&response)
}

async fn dispatch(client: &LedgerClient, command: Commands) -> Result<Value, Box<dyn std::error::Error>> {
    let response = match command {
        Commands::Info => client.info().await?,
        Commands::ApiInfo => client.api_info().await?,
        Commands::Nodes => serde_json::to_value(client.nodes())?,
        Commands::Keygen => {
            let keypair = Keypair::generate();
            serde_json::json!({
                "public_key": keypair.public_key(),
                "private_key": keypair.private_key(),
            })
        }
        Commands::Tx { command } => match command {
            TxCommands::Retrieve { txid } => client.transactions().retrieve(&txid).await?,
            TxCommands::Status { txid } => client.transactions().status(&txid).await?,
            TxCommands::Get { asset_id, operation } => {
                client.transactions().get(&asset_id, operation).await?
            }
            TxCommands::Create { data, metadata, mode } => {
                let keypair = Keypair::from_env()?;
                let mut request = PrepareRequest::create(vec![keypair.public_key()]);
                if let Some(data) = data {
                    request = request.with_asset_data(serde_json::from_str(&data)?);
                }
                if let Some(metadata) = metadata {
                    request = request.with_metadata(serde_json::from_str(&metadata)?);
                }
                let prepared = TransactionsEndpoint::prepare(request)?;
                let signed = TransactionsEndpoint::fulfill(&prepared, &[keypair.private_key()])?;
                client.transactions().send(&signed, mode).await?
            }
        },
        Commands::Outputs { public_key, spent } => client.outputs().get(&public_key, spent).await?,
        Commands::Blocks { command } => match command {
            BlockCommands::Get { txid } => client.blocks().get(&txid).await?,
            BlockCommands::Retrieve { height } => client.blocks().retrieve(height).await?,
        },
        Commands::Assets { search, limit } => client.assets().get(&search, limit).await?,
        Commands::Metadata { search, limit } => client.metadata().get(&search, limit).await?,
    };
    Ok(response)
}

/// Config file (or defaults) with command line overrides applied.
fn resolve_config(cli: &Cli) -> Result<DriverConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => DriverConfig::default(),
    };
    if !cli.nodes.is_empty() {
        config.nodes = cli.nodes.iter().map(|n| NodeSpec::from(n.as_str())).collect();
    }
    if cli.timeout.is_some() {
        config.transport.timeout_secs = cli.timeout;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

fn print_json(value: &Value) -> Result<(), Box<dyn std::error::Error>> {
    match value {
        Value::String(text) => println!("{}", text),
        other => println!("{}", serde_json::to_string_pretty(other)?),
    }
    Ok(())
}
