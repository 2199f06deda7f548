//! Notebook Prompt CLI
//!
//! Usage:
//!   notebook-prompt fill --notebook <FILE> --cell <N> (--template <FILE> | --template-id <ID>)
//!   notebook-prompt keys <TEMPLATE>
//!   notebook-prompt check --notebook <FILE> --cell <N>
//!
//! Options:
//!   -c, --config <FILE>  Configuration file (TOML format)
//!   -v, --verbose        Log resolution decisions to stderr
//!   -h, --help           Print help

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notebook_prompt::report::load_report;
use notebook_prompt::template::{fill_template_with_config, TemplateRegistry};
use notebook_prompt::{
    format_test_results, resolve_for_template, template_placeholder_keys, Notebook, PromptConfig,
    PromptError, ResolveError,
};

#[derive(Parser)]
#[command(name = "notebook-prompt")]
#[command(about = "Assemble LLM prompts from notebook cell markers")]
struct Cli {
    /// Configuration file (TOML format)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log resolution decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a template for one cell and print the prompt
    Fill(FillArgs),
    /// Print the placeholder keys a template refers to
    Keys {
        /// Template file
        template: PathBuf,
    },
    /// Validate the prompt markers visible from one cell
    Check(NotebookArgs),
}

#[derive(Args)]
struct NotebookArgs {
    /// Notebook file (.ipynb)
    #[arg(short, long)]
    notebook: PathBuf,

    /// Index of the current cell (0-based)
    #[arg(long)]
    cell: usize,
}

#[derive(Args)]
struct FillArgs {
    #[command(flatten)]
    target: NotebookArgs,

    /// Template file
    #[arg(short, long, conflicts_with = "template_id", required_unless_present = "template_id")]
    template: Option<PathBuf>,

    /// Template ID, looked up in the configured template directory
    #[arg(long)]
    template_id: Option<String>,

    /// Test report (JSON) exposed to the template as {{test_results}}
    #[arg(long)]
    test_report: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => match PromptConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => PromptConfig::default(),
    };

    let result = match &cli.command {
        Command::Fill(args) => run_fill(args, &config),
        Command::Keys { template } => run_keys(template),
        Command::Check(args) => run_check(args, &config),
    };

    match result {
        Ok(code) => code,
        Err(message) => {
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_fill(args: &FillArgs, config: &PromptConfig) -> Result<ExitCode, String> {
    let notebook = load_notebook(&args.target.notebook)?;
    let template = load_template(args, config)?;

    let mut map = match resolve_for_template(&template, &notebook, args.target.cell, config) {
        Ok(map) => map,
        Err(PromptError::Resolve(ResolveError::Structural(e))) => {
            eprint!("{}", e.format(&notebook));
            return Err(e.to_string());
        }
        Err(e) => return Err(e.to_string()),
    };

    if let Some(path) = &args.test_report {
        let results = load_report(path)
            .map_err(|e| format!("reading test report '{}': {}", path.display(), e))?;
        map.insert_text("test_results", format_test_results(&results));
    }

    println!(
        "{}",
        fill_template_with_config(&template, &map, &notebook, &config.fill)
    );
    Ok(ExitCode::SUCCESS)
}

fn run_keys(template: &Path) -> Result<ExitCode, String> {
    let body = read_file(template)?;
    for key in template_placeholder_keys(&body) {
        println!("{}", key);
    }
    Ok(ExitCode::SUCCESS)
}

fn run_check(args: &NotebookArgs, config: &PromptConfig) -> Result<ExitCode, String> {
    let notebook = load_notebook(&args.notebook)?;

    match notebook_prompt::template::resolve_placeholders_with_config(
        &notebook,
        args.cell,
        None,
        &config.resolver,
    ) {
        Ok(map) => {
            for warning in map.warnings() {
                eprint!(
                    "{}",
                    warning.format(&notebook, ariadne::ReportKind::Warning)
                );
            }
            println!("{} placeholders resolved for cell {}", map.len(), args.cell);
            for key in map.keys() {
                println!("  {}", key);
            }
            Ok(ExitCode::SUCCESS)
        }
        Err(ResolveError::Structural(e)) => {
            eprint!("{}", e.format(&notebook));
            eprintln!("{} marker problem(s) found", e.violations().len());
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e.to_string()),
    }
}

fn load_notebook(path: &Path) -> Result<Notebook, String> {
    Notebook::from_file(path).map_err(|e| format!("reading notebook '{}': {}", path.display(), e))
}

fn load_template(args: &FillArgs, config: &PromptConfig) -> Result<String, String> {
    if let Some(path) = &args.template {
        return read_file(path);
    }

    let id = args
        .template_id
        .as_deref()
        .ok_or_else(|| "either --template or --template-id is required".to_string())?;
    let dir = config
        .templates_dir
        .as_deref()
        .ok_or_else(|| "--template-id needs [templates] dir in the config file".to_string())?;

    let registry = TemplateRegistry::from_dir(dir).map_err(|e| e.to_string())?;
    registry
        .require(id)
        .map(|def| def.body.clone())
        .map_err(|e| e.to_string())
}

fn read_file(path: &Path) -> Result<String, String> {
    fs::read_to_string(path).map_err(|e| format!("reading file '{}': {}", path.display(), e))
}

