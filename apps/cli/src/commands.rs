//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use pitchlens_core::{
    Collaborators, Pipeline, ProgressReporter, ResearchRequest, ResearchResponse,
    UploadedDocument, prepare_record,
};
use pitchlens_shared::{AppConfig, ResearchRecord, StageStatus, init_config, load_config};
use tracing::info;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PitchLens: research a startup and score it for investment.
#[derive(Parser)]
#[command(
    name = "pitchlens",
    version,
    about = "Research a startup from its pitch deck, website and the web, then score it.",
    long_about = None,
)]
pub(crate) struct Cli {
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
    /// Run the full research pipeline for one startup.
    Research(ResearchArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Args)]
pub(crate) struct ResearchArgs {
    /// Startup name.
    #[arg(long)]
    pub name: String,

    /// Registered legal name (defaults to the name).
    #[arg(long, default_value = "")]
    pub legal_name: String,

    #[arg(long, default_value = "")]
    pub industry: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Contact email.
    #[arg(long, default_value = "")]
    pub email: String,

    #[arg(long, default_value = "")]
    pub phone: String,

    /// Company website to scrape.
    #[arg(long, default_value = "")]
    pub website: String,

    /// Founder names, comma-separated.
    #[arg(long, default_value = "")]
    pub founders: String,

    /// Funding stage, e.g. SEED.
    #[arg(long, default_value = "")]
    pub stage: String,

    #[arg(long)]
    pub team_size: Option<u32>,

    #[arg(long)]
    pub founded_year: Option<i32>,

    #[arg(long, default_value = "")]
    pub location: String,

    #[arg(long, default_value = "")]
    pub ceo_linkedin_url: String,

    /// Shared data room link forwarded to the platform.
    #[arg(long, default_value = "")]
    pub data_room_url: String,

    /// Local pitch deck PDF.
    #[arg(long, conflicts_with = "deck_url")]
    pub deck: Option<PathBuf>,

    /// Pitch deck PDF to download.
    #[arg(long)]
    pub deck_url: Option<String>,

    /// Write the JSON response to this file.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
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
        0 => "pitchlens=info",
        1 => "pitchlens=debug",
        _ => "pitchlens=trace",
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
    match cli.command {
        Command::Research(args) => cmd_research(args).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn read_deck(path: &Path) -> Result<UploadedDocument> {
    let bytes = tokio::fs::read(path)
        .await
        .wrap_err_with(|| format!("cannot read pitch deck '{}'", path.display()))?;
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| eyre!("pitch deck path '{}' has no file name", path.display()))?;
    Ok(UploadedDocument {
        file_name: file_name.to_string(),
        bytes,
    })
}

async fn cmd_research(args: ResearchArgs) -> Result<()> {
    let config = load_config()?;
    let collaborators = Collaborators::from_config(&config)?;
    let pipeline = Pipeline::standard(collaborators, config.platform.clone());

    let pitch_deck = match &args.deck {
        Some(path) => Some(read_deck(path).await?),
        None => None,
    };

    let request = ResearchRequest {
        name: args.name,
        legal_name: args.legal_name,
        industry: args.industry,
        description: args.description,
        email: args.email,
        phone: args.phone,
        website: args.website,
        founders: args.founders,
        stage: args.stage,
        team_size: args.team_size,
        founded_year: args.founded_year,
        location: args.location,
        ceo_linkedin_url: args.ceo_linkedin_url,
        data_room_url: args.data_room_url,
        pitch_deck_url: args.deck_url,
        pitch_deck,
    };

    let record = prepare_record(request, Path::new(&config.defaults.uploads_dir)).await?;
    info!(run_id = %record.run_id(), startup = %record.input().name, "research requested");

    let reporter = CliProgress::new(pipeline.stage_names().len());
    let record = pipeline.run(record, &reporter).await;
    let response = ResearchResponse::from_record(&record);

    print_summary(&record);

    if let Some(path) = &args.output {
        let json = serde_json::to_string_pretty(&response)?;
        std::fs::write(path, json)
            .wrap_err_with(|| format!("cannot write response to '{}'", path.display()))?;
        println!("  Output:  {}", path.display());
        println!();
    }

    if !response.is_success() {
        return Err(eyre!("no research findings were produced for '{}'", record.input().name));
    }
    Ok(())
}

fn print_summary(record: &ResearchRecord) {
    println!();
    match record.findings() {
        Some(findings) => {
            let card = &findings.ai_scorecard;
            println!("  Research complete: {}", findings.name);
            println!("  Thesis:         {}", findings.thesis_name);
            println!("  Overall score:  {:.2} / 10", card.overall_score);
            println!("  Recommendation: {}", card.investment_recommendation);
        }
        None => println!("  No research findings for {}", record.input().name),
    }
    println!("  Outcome:  {:?}", record.outcome());
    println!("  Status:   {}", record.status());
    if let Some(path) = record.report_path() {
        println!("  Report:   {}", path.display());
    }
    if let Some(id) = record.startup_id() {
        println!("  Platform: {id}");
    }
    if !record.errors().is_empty() {
        println!("  Errors:");
        for e in record.errors() {
            println!("    - {e}");
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let spinner = ProgressBar::new(total as u64);
        let style = ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
        spinner.set_style(style);
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn stage_started(&self, name: &str, index: usize, _total: usize) {
        self.spinner.set_position(index as u64);
        self.spinner.set_message(name.to_string());
    }

    fn stage_finished(&self, name: &str, status: StageStatus) {
        if status.is_failure() {
            self.spinner.println(format!("  ! {name}: {status}"));
        }
        self.spinner.inc(1);
    }

    fn done(&self, _record: &ResearchRecord) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
