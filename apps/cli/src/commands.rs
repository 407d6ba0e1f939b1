//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use tutorgraph_core::app::TutorApp;
use tutorgraph_core::bootstrap::load_knowledge;
use tutorgraph_core::pipeline::{Orchestrator, ProgressReporter, TutorResponse};
use tutorgraph_providers::{ChatClient, verification_from_config};
use tutorgraph_shared::{
    AppConfig, RagOptions, VerificationSourceType, init_config, load_config, load_config_from,
};

use crate::render::{self, VerificationOutcome};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// TutorGraph: a study assistant grounded in your own course material.
#[derive(Parser)]
#[command(
    name = "tutorgraph",
    version,
    about = "Answer learner questions from a local corpus, with prerequisites, related topics, and fact checks.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.tutorgraph/tutorgraph.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask one question and print the answer.
    Ask {
        /// The question to answer.
        question: String,

        /// Number of passages to retrieve (overrides config).
        #[arg(short = 'k', long)]
        retrieve_count: Option<usize>,

        /// Verify the answer against these sources (comma-separated: academic,books,web).
        #[arg(long, value_delimiter = ',')]
        verify: Vec<VerificationSourceType>,

        /// Print the result as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Interactive session. `:verify <type>` checks the last answer, `:quit` exits.
    Chat {
        /// Number of passages to retrieve (overrides config).
        #[arg(short = 'k', long)]
        retrieve_count: Option<usize>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "tutorgraph=warn",
        1 => "tutorgraph=info",
        2 => "tutorgraph=debug",
        _ => "tutorgraph=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Ask {
            question,
            retrieve_count,
            verify,
            json,
        } => cmd_ask(config_path, &question, retrieve_count, &verify, json).await,
        Command::Chat { retrieve_count } => cmd_chat(config_path, retrieve_count).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

fn rag_options(config: &AppConfig, retrieve_count: Option<usize>) -> RagOptions {
    let mut options = RagOptions::from(config);
    if let Some(count) = retrieve_count {
        options.retrieve_count = count;
    }
    options
}

/// Load the knowledge base and wire the configured providers into a session.
async fn start_session(config: &AppConfig) -> tutorgraph_shared::Result<Orchestrator> {
    // Fail on a missing API key before reading any data.
    let backend = ChatClient::from_config(config)?;
    let knowledge = load_knowledge(&config.data, config.rag.min_similarity as f32).await?;

    let mut orchestrator = knowledge.into_orchestrator(Arc::new(backend), config);
    if let Some(verification) = verification_from_config(&config.verification)? {
        orchestrator = orchestrator.with_verification(verification);
    }
    Ok(orchestrator)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(
    config_path: Option<&Path>,
    question: &str,
    retrieve_count: Option<usize>,
    verify: &[VerificationSourceType],
    json: bool,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let options = rag_options(&config, retrieve_count);

    let reporter = CliProgress::new();
    reporter.phase("Loading knowledge base");
    let orchestrator = Arc::new(start_session(&config).await?);

    info!(session = %orchestrator.session_id(), retrieve_count = options.retrieve_count, "asking");
    let response = orchestrator.ask_with(question, &options, &reporter).await?;

    let outcomes = if verify.is_empty() {
        Vec::new()
    } else {
        run_verifications(&orchestrator, verify).await
    };

    if json {
        println!("{}", render::to_json(&response, &outcomes)?);
    } else {
        render::print_response(&response);
        for outcome in &outcomes {
            render::print_verification(outcome);
        }
    }
    Ok(())
}

/// Verify the last answer against each requested source concurrently.
async fn run_verifications(
    orchestrator: &Arc<Orchestrator>,
    types: &[VerificationSourceType],
) -> Vec<VerificationOutcome> {
    let mut requested: Vec<VerificationSourceType> = Vec::with_capacity(types.len());
    for source_type in types {
        if !requested.contains(source_type) {
            requested.push(*source_type);
        }
    }

    let handles: Vec<_> = requested
        .iter()
        .map(|&source_type| {
            let orchestrator = Arc::clone(orchestrator);
            tokio::spawn(async move { orchestrator.verify(source_type).await })
        })
        .collect();

    let mut outcomes = Vec::with_capacity(handles.len());
    for (source_type, handle) in requested.into_iter().zip(handles) {
        let result = match handle.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("verification task failed: {e}")),
        };
        if let Err(error) = &result {
            warn!(source = %source_type, %error, "verification failed");
        }
        outcomes.push(VerificationOutcome::new(source_type, result));
    }
    outcomes
}

async fn cmd_chat(config_path: Option<&Path>, retrieve_count: Option<usize>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let options = rag_options(&config, retrieve_count);

    // Start loading in the background; questions asked meanwhile are
    // answered with "not initialized".
    let app = Arc::new(TutorApp::new());
    {
        let app = Arc::clone(&app);
        let config = config.clone();
        tokio::spawn(async move {
            match start_session(&config).await {
                Ok(orchestrator) => {
                    if let Err(e) = app.install(orchestrator) {
                        app.fail(e.to_string());
                    }
                }
                Err(e) => app.fail(e.to_string()),
            }
        });
    }

    println!("Ask a question. `:verify <academic|books|web>` checks the last answer, `:quit` exits.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}", if app.is_ready() { "> " } else { "(loading) > " });
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();

        match ChatInput::parse(line) {
            ChatInput::Empty => continue,
            ChatInput::Quit => break,
            ChatInput::Help => {
                println!("  <question>           ask a question");
                println!("  :verify <type>       verify the last answer (academic, books, web)");
                println!("  :quit                exit");
            }
            ChatInput::Verify(arg) => match arg.parse::<VerificationSourceType>() {
                Ok(source_type) => {
                    let outcome = VerificationOutcome::new(
                        source_type,
                        app.verify(source_type).await.map_err(|e| e.to_string()),
                    );
                    render::print_verification(&outcome);
                }
                Err(e) => eprintln!("error: {e}"),
            },
            ChatInput::Unknown(command) => eprintln!("unknown command '{command}', try :help"),
            ChatInput::Question(question) => {
                let reporter = CliProgress::new();
                match app.ask(question, &options, &reporter).await {
                    Ok(response) => render::print_response(&response),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Chat input
// ---------------------------------------------------------------------------

/// One line typed at the chat prompt.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Empty,
    Quit,
    Help,
    Verify(&'a str),
    Unknown(&'a str),
    Question(&'a str),
}

impl<'a> ChatInput<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix(':') else {
            return Self::Question(line);
        };
        let (name, arg) = command
            .split_once(char::is_whitespace)
            .map_or((command, ""), |(name, arg)| (name, arg.trim()));
        match name {
            "q" | "quit" | "exit" => Self::Quit,
            "h" | "help" => Self::Help,
            "v" | "verify" => Self::Verify(arg),
            _ => Self::Unknown(name),
        }
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl Drop for CliProgress {
    fn drop(&mut self) {
        self.spinner.finish_and_clear();
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn answered(&self, grounded_on: usize) {
        self.spinner
            .set_message(format!("Answer ready ({grounded_on} passages)"));
    }

    fn done(&self, _response: &TutorResponse) {
        self.spinner.finish_and_clear();
    }
}
