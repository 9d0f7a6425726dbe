//! toolloop - explicit tool-call resolution loop
//!
//! Sends a conversation to an OpenAI-compatible model, executes the tool
//! calls it requests, feeds the results back, and repeats until the model
//! answers without tools or a scenario-specific stop condition fires.

mod config;
mod console;
mod conversation;
mod llm;
mod runtime;
mod scenario;
mod state_machine;
mod system_prompt;
mod tools;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::Config;
use console::{ConsoleSink, StdinInput};
use conversation::{Conversation, Message};
use runtime::{AgentLoop, GatewayClient, OutputSink};
use scenario::{Scenario, DEFAULT_CALCULATOR_PROMPT};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tools::Session;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "toolloop")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run a model against local tools until it answers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Model to use (overrides TOOLLOOP_MODEL)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Upper bound on model requests per run (overrides TOOLLOOP_MAX_ITERATIONS)
    #[arg(long, global = true)]
    max_iterations: Option<u32>,

    /// Directory saved documents are written to (overrides TOOLLOOP_WORKDIR)
    #[arg(short, long, global = true)]
    workdir: Option<PathBuf>,

    /// Execute the tool calls of one reply concurrently
    #[arg(long, global = true)]
    parallel_tools: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one arithmetic question using add, subtract and multiply
    Calculator {
        /// Question to ask; defaults to a sample prompt
        prompt: Vec<String>,
    },

    /// Interactive document drafting; ends when the document is saved
    Drafter,

    /// List the tools each scenario exposes
    Tools,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.llm.model.clone_from(model);
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_iterations = max_iterations.max(1);
        }
        if let Some(workdir) = &self.workdir {
            config.workdir.clone_from(workdir);
        }
        if self.parallel_tools {
            config.parallel_tools = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    cli.apply_overrides(&mut config);

    init_tracing(config.log_json);

    match cli.command {
        Commands::Tools => list_tools(),
        Commands::Calculator { prompt } => {
            let prompt = if prompt.is_empty() {
                DEFAULT_CALCULATOR_PROMPT.to_string()
            } else {
                prompt.join(" ")
            };
            run_calculator(&config, prompt).await
        }
        Commands::Drafter => run_drafter(&config).await,
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("toolloop=info"));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so the transcript on stdout stays readable
    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn list_tools() -> anyhow::Result<()> {
    for scenario in [Scenario::Calculator, Scenario::Drafter] {
        let registry = scenario.registry()?;
        println!("{}:", scenario.name());
        for definition in registry.definitions() {
            println!("  {:<10} {}", definition.name, definition.description);
        }
    }
    Ok(())
}

/// Build the loop for a scenario and wire Ctrl-C to cancellation
fn build_loop(
    config: &Config,
    scenario: Scenario,
) -> anyhow::Result<AgentLoop<GatewayClient, tools::ToolRegistry>> {
    let service = llm::create_service(&config.llm).context("Failed to set up model gateway")?;
    tracing::info!(model = %service.model_id(), scenario = scenario.name(), "Gateway ready");

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling run");
            on_signal.cancel();
        }
    });

    let registry = scenario.registry()?;
    tracing::debug!(tools = ?registry.names(), "Tools registered");

    Ok(AgentLoop::new(
        scenario,
        GatewayClient::new(service),
        registry,
        Arc::new(Session::new(config.workdir.clone())),
    )
    .with_input(StdinInput::new())
    .with_sink(Arc::new(ConsoleSink))
    .with_options(config.loop_options())
    .with_max_iterations(config.max_iterations)
    .with_cancel(cancel))
}

async fn run_calculator(config: &Config, prompt: String) -> anyhow::Result<()> {
    let mut agent = build_loop(config, Scenario::Calculator)?;

    let seed = Message::user(prompt);
    ConsoleSink.message(&seed);
    let conversation = Conversation::from_messages([seed])?;

    let outcome = agent.run(conversation).await?;
    // The answer itself is already on stdout through the console sink
    tracing::info!(
        iterations = outcome.iterations,
        messages = outcome.conversation.len(),
        answer = outcome.final_answer().unwrap_or_default(),
        "Calculator finished"
    );
    Ok(())
}

async fn run_drafter(config: &Config) -> anyhow::Result<()> {
    let mut agent = build_loop(config, Scenario::Drafter)?;

    println!("\n ===== DRAFTER =====");
    let outcome = agent.run_session(Conversation::new()).await?;
    println!("\n ===== DRAFTER FINISHED =====");

    tracing::info!(
        turns = outcome.turns,
        messages = outcome.conversation.len(),
        "Drafter finished"
    );
    if !outcome.completed() {
        tracing::info!("Session ended before the document was saved");
    }
    Ok(())
}
