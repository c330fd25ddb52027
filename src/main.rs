use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::runtime::Runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pawcare::cli::CommandContext;
use pawcare::cli::commands::{self, ListFormat};
use pawcare::config::ConfigFormat;

#[derive(Parser)]
#[command(name = "pawcare")]
#[command(
    version,
    about = "AI behavior analysis for your pets, with saved history per pet"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, env = "PAWCARE_USER", help = "Owner id (overrides session.user_id)")]
    user: Option<String>,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a behavior with AI
    Analyze {
        #[arg(long, help = "Stored pet id (provides species, breed, color and age)")]
        pet: Option<String>,
        #[arg(long, help = "Species when no --pet is given (Dog, Cat, ...)")]
        species: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, help = "Color or markings")]
        color: Option<String>,
        #[arg(long, help = "Date of birth (YYYY-MM-DD)")]
        born: Option<NaiveDate>,
        #[arg(long, short, help = "What the pet is doing")]
        behavior: String,
        #[arg(long, short, help = "When and where it happens")]
        context: Option<String>,
        #[arg(long, short, help = "Photo of the behavior (max 5MB)")]
        image: Option<PathBuf>,
        #[arg(long, help = "Save the analysis to the pet's history (requires --pet)")]
        save: bool,
    },

    /// Show saved analyses of a pet
    History {
        #[arg(long, help = "Pet id")]
        pet: String,
        #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Manage pets
    Pet {
        #[command(subcommand)]
        action: PetAction,
    },

    /// List vaccines for a species
    Vaccines {
        species: String,
        #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// List activity types for a species
    Activities {
        species: String,
        #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum PetAction {
    /// Register a pet
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        species: String,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, help = "Date of birth (YYYY-MM-DD)")]
        born: Option<NaiveDate>,
        #[arg(long, help = "Profile photo")]
        photo: Option<PathBuf>,
    },
    /// List your pets
    List {
        #[arg(short = 'f', long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },
    /// Remove a pet with its saved analyses
    Remove { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(short = 'f', long, value_enum, default_value_t = ConfigFormat::Toml)]
        format: ConfigFormat,
    },
    /// Show configuration file paths
    Path,
    /// Write a starter configuration file
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mPawCare encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Backtrace when RUST_BACKTRACE=1
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let user = cli.user.as_deref();

    match cli.command {
        Commands::Analyze {
            pet,
            species,
            breed,
            color,
            born,
            behavior,
            context,
            image,
            save,
        } => {
            let ctx = CommandContext::load(user)?;
            let rt = Runtime::new()?;
            rt.block_on(commands::analyze::run(
                &ctx,
                commands::analyze::AnalyzeOptions {
                    pet,
                    species,
                    breed,
                    color,
                    born,
                    behavior,
                    context,
                    image,
                    save,
                },
            ))?;
        }
        Commands::History { pet, format } => {
            let ctx = CommandContext::load(user)?;
            commands::history::run(&ctx, &pet, format)?;
        }
        Commands::Pet { action } => {
            let ctx = CommandContext::load(user)?;
            match action {
                PetAction::Add {
                    name,
                    species,
                    breed,
                    color,
                    born,
                    photo,
                } => {
                    commands::pet::add(
                        &ctx,
                        commands::pet::NewPet {
                            name,
                            species,
                            breed,
                            color,
                            born,
                            photo,
                        },
                    )?;
                }
                PetAction::List { format } => commands::pet::list(&ctx, format)?,
                PetAction::Remove { id } => commands::pet::remove(&ctx, &id)?,
            }
        }
        Commands::Vaccines { species, format } => {
            commands::catalog::vaccines(&species, format)?;
        }
        Commands::Activities { species, format } => {
            commands::catalog::activities(&species, format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { format } => commands::config::show(format)?,
            ConfigAction::Path => commands::config::path()?,
            ConfigAction::Init { global, force } => commands::config::init(global, force)?,
        },
    }

    Ok(())
}
