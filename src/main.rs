//! Fingerprint Capture CLI
//!
//! Serves the capture and identify endpoints, or runs a single workflow
//! from the command line. The binary ships with the simulated reader; real
//! hardware is wired in through a `DeviceProvider` by the embedding
//! application.

use clap::{Parser, Subcommand};
use fingerprint_capture::{
    config::{FileConfig, MAX_TIMEOUT_SECS},
    device::{simulated_template, DeviceProvider, SimulatedProvider, Template},
    extraction::SampleExtractor,
    matching::MatchEngine,
    metrics::MetricsRegistry,
    response::{CaptureResponse, ErrorResponse, VerifyResponse},
    server::{AppState, Server},
    store::{MemoryTemplateStore, SqliteTemplateStore, TemplateStore},
    workflow::{CaptureWorkflow, IdentifyWorkflow},
};
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Candidate id enrolled with the simulated finger when no store is configured.
const DEMO_CANDIDATE_ID: i64 = 1;

#[derive(Debug, Parser)]
#[command(name = "fingerprint-capture", version, about)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Capture budget in seconds, overriding the configuration.
    #[arg(long, global = true)]
    timeout: Option<f64>,

    /// Empty probes the simulated reader reports before presenting a finger.
    #[arg(long, global = true, default_value_t = 25)]
    empty_probes: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve POST /capture and POST /verify.
    Serve {
        /// Listen address, overriding the configuration.
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Capture one finger and print the capture response.
    Capture,
    /// Capture one finger, identify it and print the verify response.
    Identify,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = load_config(&cli)?;

    info!("Fingerprint Capture v{}", fingerprint_capture::VERSION);
    info!(
        timeout_secs = config.capture.timeout_secs,
        policy = ?config.matching.policy,
        "Using simulated fingerprint reader"
    );

    let workflow = IdentifyWorkflow::new(
        CaptureWorkflow::new(
            config.capture.clone(),
            SampleExtractor::new(config.enhance.clone()),
        ),
        MatchEngine::new(config.matching.policy),
    );
    let provider = SimulatedProvider::new(cli.empty_probes);
    let store = open_store(&config)?;

    match cli.command {
        Command::Serve { bind } => {
            let mut server_config = config.server.clone();
            if let Some(addr) = bind {
                server_config.bind_addr = addr;
            }

            let metrics = Arc::new(MetricsRegistry::new()?);
            let state = AppState::new(Arc::new(provider), store, workflow, metrics);

            let runtime = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            runtime.block_on(Server::new(server_config, state).run())?;
        }
        Command::Capture => {
            let mut device = provider.initialize()?;
            let result = workflow.capture_workflow().capture(device.as_mut());
            print_json(&CaptureResponse::from(result))?;
        }
        Command::Identify => {
            let mut device = provider.initialize()?;
            match workflow.identify(device.as_mut(), store.as_ref()) {
                Ok(result) => print_json(&VerifyResponse::from(result))?,
                Err(e) => {
                    print_json(&ErrorResponse::from(&e))?;
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<FileConfig, Box<dyn Error>> {
    let mut config = match &cli.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };

    if let Some(timeout) = cli.timeout {
        if !(0.0..=MAX_TIMEOUT_SECS).contains(&timeout) {
            return Err(format!("--timeout must be between 0 and {}", MAX_TIMEOUT_SECS).into());
        }
        config.capture.timeout_secs = timeout;
    }

    config.validate()?;
    Ok(config)
}

fn open_store(config: &FileConfig) -> Result<Arc<dyn TemplateStore>, Box<dyn Error>> {
    if config.store.path.is_some() {
        let store = SqliteTemplateStore::from_config(&config.store)?;
        return Ok(Arc::new(store));
    }

    warn!(
        candidate_id = DEMO_CANDIDATE_ID,
        "No template store configured; enrolling the simulated finger in memory"
    );
    let mut store = MemoryTemplateStore::default();
    store.enroll(DEMO_CANDIDATE_ID, &Template::from_bytes(simulated_template()));
    Ok(Arc::new(store))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
