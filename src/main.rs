//! File Agent - Entry Point
//!
//! Sets up logging and the async runtime for LLM calls, then either runs an
//! interactive session or handles a single request.

use clap::{Parser, Subcommand};
use file_agent::command::format_response;
use file_agent::core::config::AgentConfig;
use file_agent::core::error::Result;
use file_agent::memory::ActionRecord;
use file_agent::Agent;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "bye"];

/// Organize and find files with natural language commands
#[derive(Parser, Debug)]
#[command(name = "file-agent")]
#[command(about = "Organize and find files with natural language commands")]
struct Args {
    /// Config file (defaults to ~/.config/file-agent/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive session (the default)
    Chat,
    /// Handle a single request, e.g. `run organize my downloads by type`
    Run {
        /// The request text
        #[arg(required = true, num_args = 1..)]
        request: Vec<String>,

        /// Print the plan as JSON instead of executing it
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Show recently recorded actions
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Write a config file and create the default workspace
    Setup {
        /// Default workspace directory
        #[arg(long)]
        workspace: Option<PathBuf>,

        /// API key for the language backend
        #[arg(long)]
        api_key: Option<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config_path = args.config.as_deref();

    match args.command.unwrap_or(Command::Chat) {
        Command::Setup { workspace, api_key } => {
            init_tracing("file_agent=info");
            setup(config_path, workspace, api_key)
        }
        Command::Chat => {
            let mut agent = start(config_path)?;
            // Create the async runtime for LLM calls
            let rt = Runtime::new()?;
            run_chat(&rt, &mut agent)
        }
        Command::Run { request, dry_run } => {
            let mut agent = start(config_path)?;
            let rt = Runtime::new()?;
            run_once(&rt, &mut agent, &request.join(" "), dry_run)
        }
        Command::History { limit } => {
            let agent = start(config_path)?;
            print_history(agent.log().history(limit));
            Ok(())
        }
    }
}

/// Load configuration, set up logging and build the agent
fn start(config_path: Option<&Path>) -> Result<Agent> {
    let config = AgentConfig::load(config_path)?;
    init_tracing(&config.logging.level);
    tracing::info!("File Agent starting...");
    Ok(Agent::from_config(&config))
}

/// Log to stderr so records never interleave with the conversation
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_chat(rt: &Runtime, agent: &mut Agent) -> Result<()> {
    print_welcome();

    loop {
        print!("\nWhat would you like me to do? > ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            // EOF
            println!();
            break;
        }
        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if EXIT_WORDS.contains(&input.to_lowercase().as_str()) {
            println!("Thank you for using File Agent! Goodbye.");
            break;
        }

        if input.eq_ignore_ascii_case("history") {
            print_history(agent.log().history(5));
            continue;
        }

        let (_, plan) = rt.block_on(agent.plan(input));
        if plan.is_unknown() {
            println!("{}", plan.description());
            continue;
        }

        println!("Executing: {}...", plan.description());
        match agent.execute(&plan) {
            Ok(result) => println!("{}", format_response(&plan, &result)),
            Err(e) => println!("Error: {}", e),
        }
    }

    Ok(())
}

fn run_once(rt: &Runtime, agent: &mut Agent, request: &str, dry_run: bool) -> Result<()> {
    if dry_run {
        let (parsed, plan) = rt.block_on(agent.plan(request));
        println!("{}", serde_json::to_string_pretty(&parsed)?);
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    let response = rt.block_on(agent.handle(request))?;
    if !response.plan.is_unknown() {
        println!("Executing: {}...", response.plan.description());
    }
    println!("{}", response.message);
    Ok(())
}

fn setup(
    config_path: Option<&Path>,
    workspace: Option<PathBuf>,
    api_key: Option<String>,
) -> Result<()> {
    let path = config_path
        .map(PathBuf::from)
        .unwrap_or_else(AgentConfig::default_path);

    let mut config = if path.exists() {
        println!("Updating existing configuration at {}", path.display());
        AgentConfig::load(Some(&path))?
    } else {
        AgentConfig::default()
    };

    if let Some(workspace) = workspace {
        config.default_workspace = file_agent::core::config::expand_tilde(&workspace);
    }
    if let Some(key) = api_key {
        config.llm.api_key = Some(key);
    }
    config.validate()?;

    std::fs::create_dir_all(&config.default_workspace)?;
    config.save(&path)?;

    println!("Configuration saved to {}", path.display());
    println!("Default workspace set to: {}", config.default_workspace.display());
    if config.llm.api_key.is_none() {
        println!("No API key configured - requests will use keyword matching.");
    }
    Ok(())
}

fn print_welcome() {
    println!("{}", "=".repeat(60));
    println!("  File Agent - Your Personal File Assistant");
    println!("{}", "=".repeat(60));
    println!("You can ask me to:");
    println!("  - Organize files by type: 'organize my downloads by file type'");
    println!("  - Organize files by date: 'sort my desktop by date modified'");
    println!("  - Find files: 'find all PDFs in my documents folder'");
    println!("  - Find a file by name: 'where is budget.xlsx'");
    println!();
    println!("Type 'history' to see recent actions, 'exit' to quit.");
    println!("{}", "=".repeat(60));
}

fn print_history(actions: &[ActionRecord]) {
    if actions.is_empty() {
        println!("No actions recorded yet.");
        return;
    }

    for action in actions {
        let when = action.timestamp.get(..16).unwrap_or(&action.timestamp);
        let status = if action.success { "ok" } else { "failed" };
        println!(
            "{}  {:<20} {:<6} {}",
            when,
            action.action_type,
            status,
            serde_json::Value::Object(action.details.clone())
        );
    }
}
