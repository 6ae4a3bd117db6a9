use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use steptrace::web::{run_server, ServerConfig, WebAppState};
use steptrace::{util, Config, Language, TraceCore};

#[derive(Debug, Parser)]
#[command(name = "steptrace")]
#[command(version, about = "Capture step-by-step execution traces of Python and C++ programs")]
struct Cli {
    /// Data directory for config and logs (defaults to ~/.steptrace)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the trace API over HTTP.
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
    /// Trace a single source file and print the response JSON.
    Trace {
        file: PathBuf,
        /// `python` or `cpp`; inferred from the file extension when omitted.
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        pretty: bool,
    },
}

fn init_logging() -> Result<()> {
    // Log to file (~/.steptrace/logs/steptrace.log)
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .init();
    Ok(())
}

fn build_core(config: Config) -> TraceCore {
    let tools = util::ToolAvailability::detect(&config.tool_paths);
    TraceCore::new(config, tools)
}

async fn trace_file(
    core: &TraceCore,
    file: PathBuf,
    language: Option<String>,
    pretty: bool,
) -> Result<bool> {
    let code = fs::read_to_string(&file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let language =
        language.or_else(|| Language::from_path(&file).map(|l| l.as_str().to_string()));

    let (body, ok) = match core.trace(Some(&code), language.as_deref()).await {
        Ok(trace) => (serde_json::json!({ "trace": trace }), true),
        Err(e) => (serde_json::json!({ "error": e.to_string() }), false),
    };
    let rendered = if pretty {
        serde_json::to_string_pretty(&body)?
    } else {
        serde_json::to_string(&body)?
    };
    println!("{rendered}");
    Ok(ok)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir);
    init_logging()?;

    let config = Config::load();

    match cli.command {
        Command::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config = config.with_host(host);
            }
            if let Some(port) = port {
                config = config.with_port(port);
            }
            let server = ServerConfig::from(config.server.clone());
            let state = WebAppState::new(build_core(config));
            run_server(state, server).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Trace {
            file,
            language,
            pretty,
        } => {
            let core = build_core(config);
            if trace_file(&core, file, language, pretty).await? {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
