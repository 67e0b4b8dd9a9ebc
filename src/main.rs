// deck-pdf: Lay out playing cards onto printable sheets

use chrono::Local;
use clap::Parser;
use deck_pdf::assets::DirectoryAssets;
use deck_pdf::fonts::FontLibrary;
use deck_pdf::geometry::Geometry;
use deck_pdf::pdf::PdfWriter;
use deck_pdf::{AssetPolicy, DeckError, DeckPipeline, EngineConfig, RunSummary, TypeRegistry};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// ============================================================================
// Data Structures
// ============================================================================

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Lay out playing cards onto printable 3x3 sheets")]
struct Args {
    /// Card data (tab-separated, three header rows)
    #[arg(short, long)]
    input: PathBuf,

    /// Output filename (defaults to {input}-{date}.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory that icon, illustration and marker references resolve against
    #[arg(long, default_value = "images")]
    images: PathBuf,

    /// Engine configuration (JSON, optional)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Document title
    #[arg(long, default_value = "Cards")]
    title: String,

    /// Skip cards whose assets are missing instead of aborting
    #[arg(long)]
    skip_missing_assets: bool,

    /// Log progress (debug level)
    #[arg(short, long)]
    verbose: bool,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), DeckError> {
    // Load configuration
    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if args.skip_missing_assets {
        config.asset_policy = AssetPolicy::Skip;
    }

    // Static tables: fail before any page is drawn
    let assets = DirectoryAssets::new(&args.images);
    let registry = TypeRegistry::new(&config, &assets)?;
    let fonts = FontLibrary::load(&config.fonts)?;
    for card_type in registry.iter() {
        if !fonts.can_draw(&config.fonts.title, &card_type.display_name) {
            log::warn!(
                "Title font cannot show every letter of '{}'; set fonts.title.file to a font that can",
                card_type.display_name
            );
        }
    }
    let pipeline = DeckPipeline::new(&config, &registry, &fonts, &assets)?;

    let input = File::open(&args.input)
        .map_err(|e| DeckError::Input(format!("{}: {}", args.input.display(), e)))?;

    let document_id = generate_document_id();
    let geometry = Geometry::from_config(&config.geometry);
    let mut writer = PdfWriter::new(&args.title, &geometry, &document_id, &fonts)?;

    let result = pipeline.run(BufReader::new(input), &mut writer);

    // Determine output filename
    let output_file = args
        .output
        .unwrap_or_else(|| default_output_path(&args.input));

    match result {
        Ok(summary) => {
            writer.save(&output_file)?;
            print_summary(&output_file, &summary, &document_id);
            Ok(())
        }
        Err(e) => {
            // Keep every page completed before the failing row
            let pages = writer.pages();
            if pages > 0 {
                writer.save(&output_file)?;
                eprintln!(
                    "Partial output: {} ({} complete pages)",
                    output_file.display(),
                    pages
                );
            }
            Err(e)
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn generate_document_id() -> String {
    let uuid = Uuid::new_v4();
    let hex = format!("{:x}", uuid);
    hex[..8].to_uppercase()
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "cards".to_string());
    let sanitized = stem
        .to_lowercase()
        .replace(' ', "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
        .collect::<String>();
    let file_name = format!("{}-{}.pdf", sanitized, Local::now().date_naive().format("%Y-%m-%d"));
    input.with_file_name(file_name)
}

fn print_summary(output_file: &Path, summary: &RunSummary, document_id: &str) {
    println!("✓ Generated: {}", output_file.display());
    println!("  Cards: {}", summary.cards);
    println!("  Pages: {}", summary.pages);
    if summary.skipped_rows > 0 {
        println!("  Skipped rows: {}", summary.skipped_rows);
    }
    if summary.skipped_cards > 0 {
        println!("  Skipped cards (missing assets): {}", summary.skipped_cards);
    }
    println!("  Document ID: {}", document_id);
}
