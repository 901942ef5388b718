use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

use storymap_highlight::config::{load_config, load_config_from};
use storymap_highlight::{
    Document, GenerationRequest, GenerationResponse, HighlightEngine, HighlightSession,
    MemoryCounterStore, SqliteCounterStore,
};

/// Highlight conflicting sentences from a story map response in a document
#[derive(Parser, Debug)]
#[command(name = "storymap-highlight", version)]
struct CliArgs {
    /// Document to highlight (.md for markdown, anything else is document JSON)
    #[arg(value_name = "DOCUMENT")]
    document: PathBuf,

    /// Generation service response JSON; omit with --request or --clear
    #[arg(value_name = "RESPONSE")]
    response: Option<PathBuf>,

    /// Where to write the highlighted document JSON (stdout if omitted)
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Config file (defaults to the user config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print the request body for the generation service and exit
    #[arg(long)]
    request: bool,

    /// Only clear existing highlights
    #[arg(long)]
    clear: bool,
}

fn read_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;

    if path.extension().is_some_and(|ext| ext == "md") {
        return Ok(Document::from_markdown(&content));
    }

    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse document {}", path.display()))
}

fn write_output(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => fs::write(path, content)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", content);
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let config = match &args.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    let mut doc = read_document(&args.document)?;

    if args.request {
        let request = GenerationRequest::for_document(&doc);
        return write_output(args.out.as_deref(), &serde_json::to_string_pretty(&request)?);
    }

    if args.clear {
        let cleared = HighlightEngine::clear_all(&mut doc);
        log::info!("cleared {} text spans", cleared);
        return write_output(args.out.as_deref(), &serde_json::to_string_pretty(&doc)?);
    }

    let response_path = args
        .response
        .as_ref()
        .context("A response file is required unless --request or --clear is given")?;
    let response_json = fs::read_to_string(response_path)
        .with_context(|| format!("Failed to read response {}", response_path.display()))?;
    let response = GenerationResponse::from_json(&response_json)?;

    let report = match config.database_path() {
        Some(db) => match SqliteCounterStore::open(&db) {
            Ok(store) => HighlightSession::new(&config, &store).run(&mut doc, &response),
            Err(err) => {
                log::warn!("counter store at {} unavailable: {}", db.display(), err);
                HighlightSession::new(&config, &MemoryCounterStore::new()).run(&mut doc, &response)
            }
        },
        None => HighlightSession::new(&config, &MemoryCounterStore::new()).run(&mut doc, &response),
    };

    eprintln!("{}", serde_json::to_string(&report)?);
    write_output(args.out.as_deref(), &serde_json::to_string_pretty(&doc)?)
}
