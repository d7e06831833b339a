use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, CONFIG_PATH_ENV};
use crate::interpreter::Capability;
use crate::runner::Runner;
use crate::types::{ExecutionRequest, ExecutionResponse};

#[derive(Parser)]
#[command(name = "luabox")]
#[command(about = "luabox - run Lua snippets and capture their output and result", long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default search)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Maximum executions in flight (overrides config file and env vars)
    #[arg(long, global = true)]
    pub max_concurrency: Option<usize>,

    /// Script timeout in milliseconds, 0 to disable (overrides config file and env vars)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a Lua file
    Run {
        /// Script path, or "-" for stdin
        file: String,

        /// Bind a string global (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Execute Lua source given on the command line
    Eval {
        /// Lua source
        source: String,

        /// Bind a string global (repeatable)
        #[arg(long = "var", value_name = "KEY=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,

        /// Print the full response as JSON
        #[arg(long)]
        json: bool,
    },

    /// Serve newline-delimited JSON requests on stdin, responses on stdout
    Serve,

    /// List capability modules and whether they are enabled
    Modules,

    /// Print the effective configuration
    Config,
}

/// One line of `serve` input.
#[derive(Debug, Deserialize)]
pub struct ServeRequest {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub request: ExecutionRequest,
}

/// One line of `serve` output.
#[derive(Debug, Serialize)]
pub struct ServeResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    #[serde(flatten)]
    pub response: ExecutionResponse,
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Run the CLI by parsing process arguments
pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run_cli_with_args(cli).await
}

/// Run the CLI with provided arguments
pub async fn run_cli_from_args(args: Vec<String>) -> Result<()> {
    let cli = Cli::parse_from(args);
    run_cli_with_args(cli).await
}

async fn run_cli_with_args(cli: Cli) -> Result<()> {
    use std::env;

    // Apply CLI overrides to environment before loading configuration
    if let Some(config_path) = &cli.config {
        env::set_var(CONFIG_PATH_ENV, config_path);
    }
    if let Some(max_concurrency) = cli.max_concurrency {
        env::set_var("LUABOX_EXECUTOR__MAX_CONCURRENCY", max_concurrency.to_string());
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        env::set_var("LUABOX_EXECUTOR__TIMEOUT_MS", timeout_ms.to_string());
    }

    let config = Config::load()?;
    init_tracing(&config.log.filter);

    match cli.command {
        Commands::Run { file, vars, json } => {
            let script = read_script(&file).await?;
            let runner = Runner::from_config(&config)?;
            let response = runner.run(request(script, vars)).await;
            report(&response, json)?;
        }

        Commands::Eval { source, vars, json } => {
            let runner = Runner::from_config(&config)?;
            let response = runner.run(request(source, vars)).await;
            report(&response, json)?;
        }

        Commands::Serve => {
            let runner = Runner::from_config(&config)?;
            info!(
                max_concurrency = config.executor.max_concurrency,
                timeout_ms = config.executor.timeout_ms,
                "serving requests on stdin"
            );
            let stdin = BufReader::new(tokio::io::stdin());
            serve(runner, stdin, tokio::io::stdout()).await?;
        }

        Commands::Modules => {
            let enabled = config.sandbox_options()?.capabilities;
            for capability in Capability::ALL {
                let marker = if enabled.contains(&capability) { "✓" } else { " " };
                println!("  {} {}", marker, capability);
            }
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn request(script: String, vars: Vec<(String, String)>) -> ExecutionRequest {
    ExecutionRequest::new(script).with_variables(vars.into_iter().collect::<HashMap<_, _>>())
}

async fn read_script(file: &str) -> Result<String> {
    if file == "-" {
        let mut script = String::new();
        tokio::io::stdin()
            .read_to_string(&mut script)
            .await
            .context("Failed to read script from stdin")?;
        return Ok(script);
    }

    tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read script {}", file))
}

/// Print a response for `run`/`eval`; exits with status 1 if the script failed.
fn report(response: &ExecutionResponse, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(response)?);
    } else {
        for line in &response.logs {
            println!("{}", line);
        }
        if let Some(result) = &response.result {
            println!("{}", result);
        }
        if let Some(error) = &response.error {
            eprintln!("Error: {}", error);
        }
    }

    if !response.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Answer each JSON line of `input` with one JSON line on `output`.
///
/// Requests run concurrently, bounded by the runner, so responses may arrive
/// out of order; callers correlate them by `id`. Returns the writer once
/// input is exhausted and every response has been written.
pub async fn serve<R, W>(runner: Runner, input: R, mut output: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<String>(64);

    let writer = tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            output.write_all(line.as_bytes()).await?;
            output.write_all(b"\n").await?;
            output.flush().await?;
        }
        Ok::<_, std::io::Error>(output)
    });

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }

        let runner = runner.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = handle_line(&runner, &line).await;
            if tx.send(reply).await.is_err() {
                warn!("response writer closed, dropping response");
            }
        });
    }
    drop(tx);

    let output = writer
        .await
        .context("Response writer task failed")?
        .context("Failed to write response")?;
    Ok(output)
}

async fn handle_line(runner: &Runner, line: &str) -> String {
    let reply = match serde_json::from_str::<ServeRequest>(line) {
        Ok(ServeRequest { id, request }) => ServeResponse {
            id,
            response: runner.run(request).await,
        },
        Err(err) => {
            debug!(error = %err, "rejecting malformed request");
            ServeResponse {
                id: None,
                response: ExecutionResponse::failed(format!("invalid request: {err}")),
            }
        }
    };

    serde_json::to_string(&reply).unwrap_or_else(|err| {
        warn!(error = %err, "failed to encode response");
        serde_json::json!({ "error": err.to_string(), "logs": [] }).to_string()
    })
}
