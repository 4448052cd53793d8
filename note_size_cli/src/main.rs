use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use note_size_cli::collection::ExportedCollection;
use note_size_cli::config::{AppConfig, ConfigManager};
use note_size_cli::output::{
    FilesReport, NoteReport, OutputFormat, SummaryReport, create_formatter,
};
use note_size_cli::progress::{create_progress_infrastructure, render_progress};
use note_size_cli::paths;
use note_size_cli::terminal::TerminalCaps;
use note_size_core::progress::ProgressProvider;
use note_size_core::{
    CardId, Collection, NoteId, NoteSizeService, ServiceConfig, SizeBytes, SizeType,
    WarmUpOutcome, bytes_to_str,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "note-size")]
#[command(author, version, about = "Note size - text and media sizes of flashcard notes", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Exported collection file (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    collection: Option<PathBuf>,

    /// Media directory of the collection
    #[arg(short, long, global = true, value_name = "DIR")]
    media_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Query(QueryCommand),

    /// Manage the persisted cache
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Read-only size queries against the collection
#[derive(Subcommand)]
enum QueryCommand {
    /// Show the size of a note
    Note {
        /// Note id
        id: i64,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Show the size of the note a card belongs to
    Card {
        /// Card id
        id: i64,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// List the media files of a note, largest first
    Files {
        /// Note id
        note_id: i64,

        /// Bypass cache and recalculate
        #[arg(long)]
        no_cache: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the size of the whole collection
    Summary {
        /// Bypass cache and recalculate
        #[arg(long)]
        no_cache: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct QueryArgs {
    /// Which part of the note to size
    #[arg(short = 't', long, value_enum, default_value = "total")]
    size_type: SizeTypeArg,

    /// Bypass cache and recalculate
    #[arg(long)]
    no_cache: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Subcommand)]
enum CacheCommand {
    /// Walk the whole collection and fill every cache
    Warmup,

    /// Drop the cache file and warm up from scratch
    Refresh,

    /// Drop every cached value and the cache file
    Clear,

    /// Show where the cache lives and how full it is
    Status,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Get a configuration value
    Get {
        /// Configuration key (e.g., format.precision)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., cache.warmup_enabled)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration values
    List,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum SizeTypeArg {
    Total,
    Texts,
    Files,
}

impl From<SizeTypeArg> for SizeType {
    fn from(arg: SizeTypeArg) -> Self {
        match arg {
            SizeTypeArg::Total => SizeType::Total,
            SizeTypeArg::Texts => SizeType::Texts,
            SizeTypeArg::Files => SizeType::Files,
        }
    }
}

/// Collection location given on the command line
struct CollectionArgs {
    collection: Option<PathBuf>,
    media_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let Cli {
        debug,
        collection,
        media_dir,
        command,
    } = Cli::parse();

    let config_manager = ConfigManager::new();
    let loaded = config_manager.load();
    init_logging(
        debug,
        loaded
            .as_ref()
            .map(|config| config.logging.level.as_str())
            .unwrap_or("warn"),
    );

    let location = CollectionArgs {
        collection,
        media_dir,
    };

    match command {
        Commands::Config { command } => config_command(config_manager, command),
        Commands::Completions { shell } => {
            generate_completions(shell);
            Ok(())
        }
        Commands::Cache { command } => {
            let config = loaded.context("Failed to load configuration")?;
            let service = open_service(&config, location)?;
            cache_command(&service, command).await
        }
        Commands::Query(command) => {
            let config = loaded.context("Failed to load configuration")?;
            let service = open_service(&config, location)?;

            // One-shot queries reuse the persisted cache and fill it lazily;
            // media changed since it was written is re-stated first
            if config.cache.store_cache_in_file_enabled && service.restore_from_file() {
                log::debug!("Loaded cache from {}", service.storage().path().display());
            }

            let result = query_command(&config, &service, command);
            service.shutdown();
            result
        }
    }
}

fn init_logging(debug: bool, level: &str) {
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Debug)
            .filter_module("note_size_core", log::LevelFilter::Debug)
            .filter_module("note_size_cli", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    }
}

fn open_service(config: &AppConfig, location: CollectionArgs) -> Result<NoteSizeService> {
    let path = location
        .collection
        .or_else(|| config.collection.path.clone())
        .context("No collection given: pass --collection or set collection.path")?;
    let media_dir = location
        .media_dir
        .or_else(|| config.collection.media_dir.clone())
        .unwrap_or_else(|| paths::default_media_dir(&path));

    let exported = ExportedCollection::open(&path, &media_dir)?;
    log::info!(
        "Opened {} ({} notes, {} cards), media in {}",
        path.display(),
        exported.note_count(),
        exported.card_count(),
        media_dir.display()
    );

    let collection: Arc<dyn Collection> = Arc::new(exported);
    Ok(NoteSizeService::new(
        collection,
        ServiceConfig {
            cache: config.cache.clone(),
            format: config.format.clone(),
            cache_file: config.cache_file(),
        },
    ))
}

fn query_command(
    config: &AppConfig,
    service: &NoteSizeService,
    command: QueryCommand,
) -> Result<()> {
    let precision = config.format.precision;
    let use_color = TerminalCaps::detect().color_stdout();

    match command {
        QueryCommand::Note { id, query } => {
            let report = note_report(config, service, NoteId(id), None, &query)?;
            let formatter = create_formatter(query.format, use_color, precision);
            println!("{}", formatter.format_note(&report)?);
        }
        QueryCommand::Card { id, query } => {
            let card_id = CardId(id);
            let note_id = service
                .get_note_id_by_card(card_id)
                .with_context(|| format!("Cannot resolve card {card_id}"))?;
            let report = note_report(config, service, note_id, Some(card_id), &query)?;
            let formatter = create_formatter(query.format, use_color, precision);
            println!("{}", formatter.format_note(&report)?);
        }
        QueryCommand::Files {
            note_id,
            no_cache,
            format,
        } => {
            let note_id = NoteId(note_id);
            let files = service
                .get_note_file_details(note_id, !no_cache)
                .with_context(|| format!("Cannot list files of note {note_id}"))?;
            let total: SizeBytes = files.iter().map(|file| file.size).sum();
            let report = FilesReport {
                note_id,
                files,
                total,
                total_str: bytes_to_str(total, precision),
            };
            let formatter = create_formatter(format, use_color, precision);
            println!("{}", formatter.format_files(&report)?);
        }
        QueryCommand::Summary { no_cache, format } => {
            let size = service
                .collection_size(!no_cache)
                .context("Cannot size the collection")?;
            let report = SummaryReport {
                total_str: bytes_to_str(size.total, precision),
                size,
            };
            let formatter = create_formatter(format, use_color, precision);
            println!("{}", formatter.format_summary(&report)?);
        }
    }

    Ok(())
}

fn note_report(
    config: &AppConfig,
    service: &NoteSizeService,
    note_id: NoteId,
    card_id: Option<CardId>,
    query: &QueryArgs,
) -> Result<NoteReport> {
    let size_type = SizeType::from(query.size_type);
    let use_cache = !query.no_cache;

    let size = service
        .get_note_size(note_id, size_type, use_cache)
        .with_context(|| format!("Cannot size note {note_id}"))?;
    let size_str = service.get_note_size_str(note_id, size_type, use_cache)?;

    Ok(NoteReport {
        note_id,
        card_id,
        size_type,
        size,
        size_str,
        level: config.levels.level_for(size).cloned(),
    })
}

async fn cache_command(service: &NoteSizeService, command: CacheCommand) -> Result<()> {
    let store_enabled = service.config().cache.store_cache_in_file_enabled;

    match command {
        CacheCommand::Warmup | CacheCommand::Refresh => {
            let refresh = matches!(command, CacheCommand::Refresh);
            let outcome = run_warm_up(service, |progress| {
                if refresh {
                    service.refresh(progress)
                } else {
                    service.warm_up(progress)
                }
            })
            .await?;

            match outcome {
                WarmUpOutcome::Completed => {
                    service.shutdown();
                    eprintln!(
                        "{}",
                        format!(
                            "Cache warmed up ({} entries)",
                            service.manager().aggregate_size()
                        )
                        .green()
                    );
                    if store_enabled {
                        eprintln!("Cache saved to: {}", service.storage().path().display());
                    }
                }
                WarmUpOutcome::Cancelled => {
                    // A partial walk is not persisted
                    eprintln!("{}", "Warm-up cancelled, cache not saved".yellow());
                }
            }
        }
        CacheCommand::Clear => {
            service.clear();
            eprintln!("{}", "Cache cleared".green());
        }
        CacheCommand::Status => {
            let loaded = store_enabled && service.load_from_file();

            println!("Cache file: {}", service.storage().path().display());
            println!(
                "Persistence: {}",
                if store_enabled { "enabled" } else { "disabled" }
            );
            println!("Loaded: {}", if loaded { "yes" } else { "no" });
            println!("Initialized: {}", service.is_initialized());
            for (name, entries) in service.manager().cache_sizes() {
                println!("  {name:<28}{entries}");
            }
            println!("Total entries: {}", service.manager().aggregate_size());
        }
    }

    Ok(())
}

/// Start a warm-up through `start` and wait for it, cancelling on Ctrl-C
async fn run_warm_up<F>(service: &NoteSizeService, start: F) -> Result<WarmUpOutcome>
where
    F: FnOnce(Arc<dyn ProgressProvider>) -> note_size_core::Result<()>,
{
    let (provider, rx) = create_progress_infrastructure();
    let mut renderer = tokio::spawn(render_progress(rx, TerminalCaps::detect().show_progress()));

    start(provider).context("Failed to start warm-up")?;

    // The renderer ends when the warm-up drops its side of the channel
    tokio::select! {
        _ = &mut renderer => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl-C")?;
            eprintln!("{}", "Cancelling warm-up...".yellow());
            service.cancel_warm_up();
            let _ = renderer.await;
        }
    }

    let outcome = service
        .wait_for_warm_up()
        .context("No warm-up was running")??;
    Ok(outcome)
}

fn config_command(mut manager: ConfigManager, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Get { key } => match manager.get(&key) {
            Ok(value) => {
                println!("{value}");
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::Set { key, value } => match manager.set(&key, &value) {
            Ok(()) => {
                eprintln!("{}", format!("Set {key} = {value}").green());
                eprintln!(
                    "Configuration saved to: {}",
                    manager.get_config_path().display()
                );
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
        ConfigCommand::List => match manager.list() {
            Ok(items) => {
                eprintln!("{}", "Configuration:".bold().blue());
                eprintln!("Config file: {}", manager.get_config_path().display());
                eprintln!();

                let mut sections: BTreeMap<String, Vec<(String, String)>> = BTreeMap::new();
                for (key, value) in items {
                    let (section, rest) = key.split_once('.').unwrap_or(("general", key.as_str()));
                    sections
                        .entry(section.to_string())
                        .or_default()
                        .push((rest.to_string(), value));
                }

                for (section, items) in sections {
                    println!("[{}]", section.yellow());
                    for (key, value) in items {
                        println!("  {} = {}", key.cyan(), value);
                    }
                    println!();
                }
            }
            Err(e) => {
                eprintln!("{}", format!("Error: {e:#}").red());
                std::process::exit(1);
            }
        },
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();

    generate(shell, &mut cmd, name, &mut std::io::stdout());
}
