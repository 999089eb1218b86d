use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use pageimages_protocol::{
    parse_page_record, serialize_json, serialize_json_pretty, CandidateScore, CommandResponse,
    MetadataDump, PageRecord, ScoreOutput, SelectionOutput,
};
use pageimages_scorer::{
    LinksUpdateHandler, PageImagesError, ParsedPage, ScoringConfig, StaticMetadataSource,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

const CONFIG_ENV: &str = "PAGEIMAGES_CONFIG";

#[derive(Parser)]
#[command(name = "pageimages")]
#[command(about = "Pick the representative image of a rendered wiki page", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Scoring config file, JSON or TOML (overrides PAGEIMAGES_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Select the page images of a page dump
    Select(SelectArgs),

    /// Print the score of every candidate image
    Score(ScoreArgs),

    /// Validate a scoring config file
    CheckConfig(CheckConfigArgs),

    /// Print the JSON schema of a document type
    Schema(SchemaArgs),
}

#[derive(Args)]
struct SelectArgs {
    /// Page dump (JSON)
    #[arg(long)]
    page: PathBuf,

    /// File metadata dump (JSON); files missing from it count as free
    #[arg(long)]
    metadata: Option<PathBuf>,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ScoreArgs {
    /// Page dump (JSON)
    #[arg(long)]
    page: PathBuf,

    #[command(flatten)]
    scope: ScopeArgs,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct ScopeArgs {
    /// Only use images of the lead section
    #[arg(long, conflicts_with = "all_sections")]
    lead_only: bool,

    /// Use images of the whole page
    #[arg(long)]
    all_sections: bool,
}

impl ScopeArgs {
    fn apply(&self, config: &mut ScoringConfig) {
        if self.lead_only {
            config.lead_section_only = true;
        } else if self.all_sections {
            config.lead_section_only = false;
        }
    }
}

#[derive(Args)]
struct CheckConfigArgs {
    /// Config file to validate
    path: PathBuf,

    /// Output JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SchemaArgs {
    #[arg(value_enum)]
    document: SchemaDocument,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaDocument {
    Page,
    Metadata,
    Output,
}

impl Commands {
    const fn json_output(&self) -> bool {
        match self {
            Self::Select(args) => args.json,
            Self::Score(args) => args.json,
            Self::CheckConfig(args) => args.json,
            Self::Schema(_) => true,
        }
    }
}

fn print_stdout(text: &str) -> Result<()> {
    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

fn print_response<T: Serialize>(result: &T) -> Result<()> {
    print_stdout(&serialize_json(&CommandResponse::ok(result)?)?)
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

pub fn main_entry() -> Result<ExitCode> {
    let mut cli = Cli::parse();
    if cli.command.json_output() && !cli.verbose {
        cli.quiet = true;
    }
    init_logging(&cli);

    let json = cli.command.json_output();
    match run(cli) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) if json => {
            print_stdout(&serialize_json(&error_response(&err))?)?;
            Ok(ExitCode::FAILURE)
        }
        Err(err) => Err(err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli
        .config
        .clone()
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    match cli.command {
        Commands::Select(args) => run_select(args, config_path.as_deref()),
        Commands::Score(args) => run_score(args, config_path.as_deref()),
        Commands::CheckConfig(args) => run_check_config(args),
        Commands::Schema(args) => run_schema(args),
    }
}

/// Input file that failed to load, attached as error context.
#[derive(Debug)]
enum InvalidInput {
    Config,
    PageDump(PathBuf),
    MetadataDump(PathBuf),
}

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config => f.write_str("Scoring config rejected"),
            Self::PageDump(path) => write!(f, "Invalid page dump {}", path.display()),
            Self::MetadataDump(path) => write!(f, "Invalid metadata dump {}", path.display()),
        }
    }
}

fn read_config(path: &Path) -> Result<ScoringConfig> {
    log::debug!("Loading scoring config from {}", path.display());
    ScoringConfig::from_file(path).context(InvalidInput::Config)
}

fn load_config(path: Option<&Path>) -> Result<ScoringConfig> {
    path.map_or_else(|| Ok(ScoringConfig::default()), read_config)
}

fn load_page(path: &Path) -> Result<(PageRecord, ParsedPage)> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read page dump {}", path.display()))?;
    let record =
        parse_page_record(&bytes).with_context(|| InvalidInput::PageDump(path.to_path_buf()))?;
    let page = ParsedPage::from_record(&record)
        .with_context(|| InvalidInput::PageDump(path.to_path_buf()))?;
    Ok((record, page))
}

fn load_metadata(path: Option<&Path>) -> Result<StaticMetadataSource> {
    let Some(path) = path else {
        return Ok(StaticMetadataSource::new());
    };
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read metadata dump {}", path.display()))?;
    let dump = MetadataDump::from_slice(&bytes)
        .with_context(|| InvalidInput::MetadataDump(path.to_path_buf()))?;
    Ok(StaticMetadataSource::from_dump(dump))
}

fn run_select(args: SelectArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    args.scope.apply(&mut config);
    let (record, page) = load_page(&args.page)?;
    let metadata = load_metadata(args.metadata.as_deref())?;

    let handler = LinksUpdateHandler::new(config, metadata);
    let mut properties: BTreeMap<String, String> = BTreeMap::new();
    handler.do_links_update(page.page_ref(), &page, &mut properties)?;

    let output = SelectionOutput {
        title: record.title,
        properties,
    };
    if args.json {
        return print_response(&output);
    }
    if output.properties.is_empty() {
        log::info!("No page image for '{}'", output.title);
    }
    for (name, value) in &output.properties {
        print_stdout(&format!("{name}\t{value}"))?;
    }
    Ok(())
}

fn run_score(args: ScoreArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    args.scope.apply(&mut config);
    let (record, page) = load_page(&args.page)?;

    let handler = LinksUpdateHandler::new(config, StaticMetadataSource::new());
    let candidates = handler
        .scored_candidates(&page)?
        .into_iter()
        .map(|image| CandidateScore {
            position: image.position,
            filename: image.file_name,
            score: image.score,
        })
        .collect();
    let output = ScoreOutput {
        title: record.title,
        candidates,
    };

    if args.json {
        return print_response(&output);
    }
    for candidate in &output.candidates {
        print_stdout(&format!(
            "#{}\t{}\t{}",
            candidate.position, candidate.score, candidate.filename
        ))?;
    }
    Ok(())
}

fn run_check_config(args: CheckConfigArgs) -> Result<()> {
    let config = read_config(&args.path)?;
    let summary = serde_json::json!({
        "path": args.path.display().to_string(),
        "lead_section_only": config.lead_section_only,
        "namespaces": config.namespaces,
        "selection": config.selection,
        "denylist_entries": config.denylist.len(),
        "position_bonuses": config.scores.position,
    });
    if args.json {
        return print_response(&summary);
    }
    print_stdout(&format!(
        "{}: ok ({} denylist entries, lead_section_only={})",
        args.path.display(),
        config.denylist.len(),
        config.lead_section_only
    ))
}

fn run_schema(args: SchemaArgs) -> Result<()> {
    let schema = match args.document {
        SchemaDocument::Page => schemars::schema_for!(PageRecord),
        SchemaDocument::Metadata => schemars::schema_for!(MetadataDump),
        SchemaDocument::Output => schemars::schema_for!(SelectionOutput),
    };
    print_stdout(&serialize_json_pretty(&schema)?)
}

fn error_response(err: &anyhow::Error) -> CommandResponse {
    let message = format!("{err:#}");
    if err.chain().any(|cause| cause.is::<PageImagesError>()) {
        return CommandResponse::error("invalid_page", message)
            .with_hint("Every image record needs a non-empty filename.");
    }
    if err.chain().any(|cause| cause.is::<io::Error>()) {
        return CommandResponse::error("io", message);
    }
    match err.downcast_ref::<InvalidInput>() {
        Some(InvalidInput::Config) => CommandResponse::error("invalid_config", message)
            .with_hint("Run `pageimages check-config <file>` for details."),
        Some(InvalidInput::PageDump(_) | InvalidInput::MetadataDump(_)) => {
            CommandResponse::error("invalid_input", message)
        }
        None => CommandResponse::error("internal", message),
    }
}
