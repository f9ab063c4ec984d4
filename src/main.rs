//! # Sprouts
//!
//! A terminal companion for keeping houseplants alive. Sprouts tracks plant
//! care tasks (watering, fertilizing, misting) with due dates, recurring
//! schedules and completion history, and keeps a catalog of your plants
//! with reference care data.
//!
//! ## Features
//!
//! *   **Recurring care**: completing a recurring task schedules the next one
//!     (daily, every 2-3 days, every 4-5 days, weekly, biweekly, monthly).
//! *   **Series editing**: editing any occurrence updates the whole series
//!     without touching due dates or completion history.
//! *   **Agenda**: tasks grouped into Today, Upcoming and Completed.
//! *   **Plants**: catalog plants, enriched from an offline species table.
//!
//! ## Usage
//!
//! ```bash
//! # Interactive mode
//! sprouts
//!
//! # Weekly watering, starting today
//! sprouts add "Water" --plant Monstera --recur weekly
//!
//! # Agenda, including completed tasks
//! sprouts list --all
//!
//! # Complete by id prefix
//! sprouts complete 0190c3
//! ```
//!
//! ## Data Storage
//!
//! Tasks and plants are saved as JSON in `~/.local/share/sprouts/` (or the
//! platform equivalent). Set `SPROUTS_DATA_DIR` or `data_dir` in
//! `~/.config/sprouts/config.toml` to move them.

use std::fs::{self, OpenOptions};
use std::io;
use std::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use sprouts::commands::*;
use sprouts::config::Config;
use sprouts::plants::PlantCatalog;
use sprouts::schedule::local_today;
use sprouts::species::{NoSpeciesData, SpeciesLookup, SpeciesTable};
use sprouts::storage::{BlobStore, FileBlobStore};
use sprouts::store::TaskStore;
use sprouts::tui::{app::App, run_tui};

#[derive(Parser)]
#[command(name = "sprouts")]
#[command(about = "Plant care task tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new care task
    Add {
        /// Task title (quoted if it has spaces)
        title: String,
        /// Plant the task is for
        #[arg(short, long)]
        plant: Option<String>,
        /// Longer description
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// Due date in YYYY-MM-DD, or today / tomorrow
        #[arg(short, long, default_value = "today")]
        due: String,
        /// Repeat (daily, 2-3 days, 4-5 days, weekly, biweekly, monthly)
        #[arg(short, long)]
        recur: Option<String>,
    },
    /// Show the agenda
    List {
        /// Show completed tasks
        #[arg(short, long)]
        all: bool,
    },
    /// Mark a task as complete
    Complete {
        id: String,
    },
    /// Remove a single task
    Remove {
        id: String,
    },
    /// Edit a task and every occurrence in its series
    Edit {
        id: String,
        /// New title
        #[arg(short, long)]
        title: Option<String>,
        /// New plant name (empty to clear)
        #[arg(short, long)]
        plant: Option<String>,
        /// New description (empty to clear)
        #[arg(short = 'D', long)]
        description: Option<String>,
        /// New repeat, or "none"
        #[arg(short, long)]
        recur: Option<String>,
    },
    /// Move a single task to another due date
    Reschedule {
        id: String,
        /// Due date in YYYY-MM-DD, or today / tomorrow
        due: String,
    },
    /// Show every occurrence in a task's series
    Chain {
        id: String,
    },
    /// Manage plants
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },
    /// Reset the database (delete all tasks and plants)
    Reset {
        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for (bash, zsh, fish, powershell, elvish)
        shell: String,
    },
    /// Open interactive TUI
    Ui,
}

#[derive(Subcommand)]
enum PlantCommands {
    /// Add a plant, looking up its care data
    Add {
        /// Plant name
        name: String,
        /// Path or URI of a photo
        #[arg(short, long)]
        photo: Option<String>,
    },
    /// List plants
    List,
    /// Remove a plant by id or name
    Remove {
        /// Plant id, id prefix or name
        plant: String,
    },
}

/// Logs go to stderr, or to a file while the TUI owns the terminal.
fn init_logging(config: &Config, to_file: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    if to_file {
        let _ = fs::create_dir_all(&config.data_dir);
        match OpenOptions::new().create(true).append(true).open(config.log_file()) {
            Ok(file) => {
                let _ = builder.with_ansi(false).with_writer(Mutex::new(file)).try_init();
                return;
            }
            Err(e) => eprintln!("Cannot open log file {}: {}", config.log_file().display(), e),
        }
    }
    let _ = builder.with_writer(io::stderr).try_init();
}

fn backend(config: &Config) -> Box<dyn BlobStore> {
    Box::new(FileBlobStore::new(&config.data_dir))
}

fn species_lookup(config: &Config) -> Box<dyn SpeciesLookup> {
    match &config.species_file {
        Some(path) => match SpeciesTable::open(path) {
            Ok(table) => {
                tracing::debug!(entries = table.len(), path = %path.display(), "species table loaded");
                Box::new(table)
            }
            Err(e) => {
                tracing::warn!(error = %e, "species table unavailable");
                Box::new(NoSpeciesData)
            }
        },
        None => Box::new(NoSpeciesData),
    }
}

fn main() {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("{}; using defaults", e);
        Config::default()
    });
    init_logging(&config, matches!(cli.command, None | Some(Commands::Ui)));

    let today = local_today();
    let mut store = TaskStore::load(backend(&config));
    let mut catalog = PlantCatalog::load(backend(&config));

    match cli.command {
        Some(Commands::Add { title, plant, description, due, recur }) => {
            cmd_add(&mut store, title, plant, description, due, recur, today, false);
        }
        Some(Commands::List { all }) => cmd_list(&store, all, today),
        Some(Commands::Complete { id }) => cmd_complete(&mut store, &id, false),
        Some(Commands::Remove { id }) => cmd_remove(&mut store, &id, false),
        Some(Commands::Edit { id, title, plant, description, recur }) => {
            cmd_edit(&mut store, &id, title, plant, description, recur, false)
        }
        Some(Commands::Reschedule { id, due }) => cmd_reschedule(&mut store, &id, &due, today, false),
        Some(Commands::Chain { id }) => cmd_chain(&store, &id, today),
        Some(Commands::Plant { command }) => match command {
            PlantCommands::Add { name, photo } => {
                let lookup = species_lookup(&config);
                cmd_plant_add(&mut catalog, name, photo, lookup.as_ref(), false);
            }
            PlantCommands::List => cmd_plant_list(&catalog),
            PlantCommands::Remove { plant } => cmd_plant_remove(&mut catalog, &plant, false),
        },
        Some(Commands::Reset { force }) => cmd_reset(&mut store, &mut catalog, force),
        Some(Commands::Completions { shell }) => {
            let shell_enum = match shell.as_str() {
                "bash" => Shell::Bash,
                "zsh" => Shell::Zsh,
                "fish" => Shell::Fish,
                "powershell" => Shell::PowerShell,
                "elvish" => Shell::Elvish,
                _ => {
                    eprintln!("Unsupported shell: {}", shell);
                    return;
                }
            };
            let mut cmd = Cli::command();
            generate(shell_enum, &mut cmd, "sprouts", &mut io::stdout());
        }
        Some(Commands::Ui) | None => {
            let app = App::new(store, catalog, species_lookup(&config), today);
            if let Err(e) = run_tui(app) {
                eprintln!("Error running TUI: {}", e);
            }
        }
    }
}
