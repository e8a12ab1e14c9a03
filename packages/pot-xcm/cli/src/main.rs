use anyhow::Result;
use clap::{Parser, Subcommand};
use pot_xcm::PotXcmError;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod origin;
mod pots;
mod report;
mod session;
mod xcm;

#[derive(Parser)]
#[command(name = "pot-xcm")]
#[command(about = "Provision sponsorship pots and propose relay-chain XCM calls")]
#[command(version)]
struct Cli {
    /// Parachain RPC endpoint (default: ws://localhost:9280)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Runtime metadata (.scale) to resolve call indices from
    #[arg(long, global = true)]
    metadata: Option<PathBuf>,

    /// Secret URI of the signing account
    #[arg(
        long,
        global = true,
        env = "POT_XCM_SIGNER",
        default_value = "//Alice",
        hide_env_values = true
    )]
    signer: String,

    /// polkadot.js JSON keystore of the signing account, used instead of --signer
    #[arg(long, global = true, value_name = "PATH")]
    json_key: Option<PathBuf>,

    /// Password of the JSON keystore
    #[arg(long, global = true, env = "POT_XCM_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create sponsorship pots with consecutive ids
    CreatePots(pots::CreatePotsArgs),
    /// Derive pot users and register them with their pot
    #[command(alias = "registeruser")]
    RegisterUsers(pots::RegisterUsersArgs),
    /// Propose a relay-chain call to the technical committee
    ProposeXcm(xcm::ProposeXcmArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("{}", describe(&e));
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every submission succeeded
async fn run(cli: Cli) -> Result<bool> {
    let signer = match cli.json_key {
        Some(path) => session::SignerSource::Keystore {
            path,
            password: cli.password.unwrap_or_default(),
        },
        None => session::SignerSource::Uri(cli.signer),
    };
    let session =
        session::Invocation::load(cli.config.as_deref(), cli.url, cli.metadata, signer)?;

    match cli.command {
        Commands::CreatePots(args) => pots::handle_create_pots(&session, args).await,
        Commands::RegisterUsers(args) => pots::handle_register_users(&session, args).await,
        Commands::ProposeXcm(args) => xcm::handle_command(&session, args).await,
    }
}

/// `<ErrorKind>: <message>` for library errors, the plain chain otherwise
fn describe(error: &anyhow::Error) -> String {
    match error
        .chain()
        .find_map(|cause| cause.downcast_ref::<PotXcmError>())
    {
        Some(e) => format!("{}: {:#}", e.kind(), error),
        None => format!("Error: {:#}", error),
    }
}
