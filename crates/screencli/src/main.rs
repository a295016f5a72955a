// crates/screencli/src/main.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use screencli::{log_progress, screen, AppConfig, ScreeningOptions};
use screencore::DocumentKind;
use screennodes::{
    screening_spec, AgentDeps, FileDocumentStore, InMemoryDocumentStore, LogNotifier,
    NotificationOutcome, Notifier, OpenAiCompatClient, WebhookNotifier,
};
use screenruntime::{FlowRuntime, NodeRegistry, WorkflowSpec};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "screen")]
#[command(about = "Candidate screening workflow CLI", long_about = None)]
struct Cli {
    /// Path to a TOML config file (defaults to ./screen.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen a candidate document against a role description
    Run {
        /// Candidate document (plain text)
        #[arg(long)]
        resume: PathBuf,

        /// Role description (plain text)
        #[arg(long)]
        role: PathBuf,

        /// Workflow JSON file (defaults to the built-in screening workflow)
        #[arg(short, long)]
        workflow: Option<PathBuf>,

        /// Shortlisting threshold, overrides the config
        #[arg(short, long)]
        threshold: Option<u32>,

        /// Address to send an interview invitation to when shortlisted
        #[arg(long)]
        recipient: Option<String>,

        /// Name used in the invitation (defaults to the extracted name)
        #[arg(long)]
        candidate_name: Option<String>,
    },

    /// Validate a workflow file
    Validate {
        /// Path to workflow JSON file
        file: PathBuf,
    },

    /// Print a workflow as a Mermaid flowchart
    Graph {
        /// Workflow JSON file (defaults to the built-in screening workflow)
        file: Option<PathBuf>,
    },

    /// List available node kinds
    Nodes,

    /// Write the built-in screening workflow to a file
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.json")]
        output: PathBuf,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    fmt().with_env_filter(filter).with_target(false).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Run {
            resume,
            role,
            workflow,
            threshold,
            recipient,
            candidate_name,
        } => {
            let options = RunOptions {
                resume,
                role,
                workflow,
                threshold: threshold.unwrap_or(config.screening.threshold),
                recipient: recipient.or_else(|| config.notify.recipient.clone()),
                candidate_name,
            };
            run_screening(&config, options).await?;
        }

        Commands::Validate { file } => {
            validate_workflow(&file)?;
        }

        Commands::Graph { file } => {
            print_graph(file.as_deref())?;
        }

        Commands::Nodes => {
            list_nodes();
        }

        Commands::Init { output } => {
            create_workflow_file(&output)?;
        }

        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

struct RunOptions {
    resume: PathBuf,
    role: PathBuf,
    workflow: Option<PathBuf>,
    threshold: u32,
    recipient: Option<String>,
    candidate_name: Option<String>,
}

/// Registry whose agents never run; enough to build and check a workflow file.
fn offline_registry() -> NodeRegistry {
    let deps = AgentDeps::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(OfflineGenerator),
    );
    let mut registry = NodeRegistry::new();
    screennodes::register_all(&mut registry, &deps);
    registry
}

struct OfflineGenerator;

#[async_trait::async_trait]
impl screencore::TextGenerator for OfflineGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, screencore::CapabilityError> {
        Err(screencore::CapabilityError::Network(
            "text generation is not available offline".to_string(),
        ))
    }
}

fn load_spec(file: Option<&Path>) -> Result<WorkflowSpec> {
    match file {
        Some(path) => WorkflowSpec::from_file(path)
            .with_context(|| format!("failed to load workflow {}", path.display())),
        None => Ok(screening_spec()),
    }
}

async fn run_screening(config: &AppConfig, options: RunOptions) -> Result<()> {
    let documents = FileDocumentStore::new()
        .with_path(DocumentKind::CandidateDocument, &options.resume)
        .with_path(DocumentKind::RoleDescription, &options.role);
    let generator = OpenAiCompatClient::from_env(config.model.clone())?;
    let deps = AgentDeps::new(Arc::new(documents), Arc::new(generator));

    let mut registry = NodeRegistry::new();
    screennodes::register_all(&mut registry, &deps);
    let runtime = FlowRuntime::with_registry(Arc::new(registry), config.runtime.clone());

    let spec = load_spec(options.workflow.as_deref())?;
    let workflow = runtime.load_workflow(&spec).await?;

    println!("Workflow: {} ({} nodes)", workflow.name(), workflow.len());
    println!("Model: {}", config.model.model);
    println!();

    let progress = tokio::spawn(log_progress(runtime.subscribe_events()));

    let notifier: Box<dyn Notifier> = match &config.notify.webhook_url {
        Some(url) => Box::new(WebhookNotifier::new(url.clone())),
        None => Box::new(LogNotifier),
    };
    let screening = ScreeningOptions {
        threshold: options.threshold,
        recipient: options.recipient,
        candidate_name: options.candidate_name,
    };

    let outcome = screen(&runtime, workflow, &screening, notifier.as_ref(), |event| {
        let marker = if event.degraded { " [degraded]" } else { "" };
        println!("== {} ({}ms){}", event.node, event.duration_ms, marker);
        for entry in &event.delta.entries {
            println!("{}", entry);
        }
        println!();
    })
    .await;
    progress.abort();
    let outcome = outcome?;

    let verdict = outcome.verdict;
    println!("Overall score: {}/100", verdict.score);
    if !outcome.structured {
        if let Some(summary) = &outcome.evaluation.summary {
            println!("Evaluation (unstructured):");
            println!("{}", summary);
        }
    }
    if verdict.shortlisted {
        println!("Shortlisted (threshold {})", verdict.threshold);
    } else {
        println!("Not shortlisted (threshold {})", verdict.threshold);
    }

    match outcome.notification {
        Some(NotificationOutcome::Sent) => {
            println!("Interview invitation sent to {}", outcome.candidate_name)
        }
        Some(NotificationOutcome::Failed(reason)) => {
            println!("Failed to send invitation: {}", reason)
        }
        None if verdict.shortlisted => println!("No recipient configured, invitation skipped"),
        None => {}
    }

    Ok(())
}

fn validate_workflow(file: &Path) -> Result<()> {
    println!("Validating workflow: {}", file.display());

    let spec = load_spec(Some(file))?;
    let workflow = spec.build(&offline_registry())?;

    println!("Workflow is valid:");
    println!("   Name: {}", workflow.name());
    println!("   Nodes: {}", workflow.len());
    println!("   Edges: {}", workflow.edges().len());
    if let Some(entry) = workflow.entry() {
        println!("   Entry: {}", entry);
    }
    println!("   Terminal: {}", workflow.terminal_nodes().join(", "));

    Ok(())
}

fn print_graph(file: Option<&Path>) -> Result<()> {
    let workflow = load_spec(file)?.build(&offline_registry())?;
    println!("{}", workflow.to_mermaid());
    Ok(())
}

fn list_nodes() {
    println!("Available node kinds:");
    println!();

    let registry = offline_registry();
    for kind in registry.list_node_kinds() {
        if let Some(metadata) = registry.get_metadata(&kind) {
            println!("  {} ({})", kind, metadata.category);
            println!("    {}", metadata.description);
        } else {
            println!("  {}", kind);
        }
    }
}

fn create_workflow_file(output: &Path) -> Result<()> {
    let json = screening_spec().to_json_pretty()?;
    std::fs::write(output, json)?;

    println!("Created workflow: {}", output.display());
    println!();
    println!("Run it with:");
    println!(
        "  screen run --workflow {} --resume resume.txt --role role.txt",
        output.display()
    );

    Ok(())
}
