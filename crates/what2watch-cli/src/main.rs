use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use what2watch_core::model::{TitleId, TitleTypeFamily};
use what2watch_etl::{Config, DatasetFiles};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "what2watch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the database (default: ~/.local/share/what2watch/what2watch.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Download the IMDB title.basics and title.ratings datasets
    ///
    /// Both files are fetched concurrently into the configured data
    /// directory. If either download fails, every failure is reported and
    /// nothing is imported.
    Download {
        /// Replace dataset files that already exist
        #[arg(long)]
        overwrite: bool,
    },
    /// Import the IMDB datasets into the title catalog
    ///
    /// Downloads fresh copies of both datasets (unless --skip-download or
    /// explicit files are given), joins them on the title id and upserts
    /// movies, TV movies, series and mini-series in batches. Existing titles
    /// are updated in place; their genres are replaced. The whole import is
    /// one transaction.
    Import {
        /// Path to title.basics.tsv(.gz) (implies --skip-download)
        #[arg(long, requires = "ratings")]
        basics: Option<PathBuf>,

        /// Path to title.ratings.tsv(.gz) (implies --skip-download)
        #[arg(long, requires = "basics")]
        ratings: Option<PathBuf>,

        /// Titles written per batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Import the files already in the data directory
        #[arg(long)]
        skip_download: bool,
    },
    /// Suggest a random title for a user
    Suggest {
        /// User id
        #[arg(long)]
        user: i64,

        /// Print the suggestion as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change a user's preferences
    ///
    /// Without options, prints the current preferences. The user is created
    /// with default preferences on first use.
    Prefs {
        /// User id
        #[arg(long)]
        user: i64,

        /// Minimum rating (0-10)
        #[arg(long)]
        min_rating: Option<f64>,

        /// Minimum number of votes
        #[arg(long)]
        min_votes: Option<u32>,

        /// Select a genre by name (repeatable)
        #[arg(long = "genre")]
        genres: Vec<String>,

        /// Deselect a genre by name (repeatable)
        #[arg(long = "no-genre")]
        unselected_genres: Vec<String>,

        /// Select every known genre
        #[arg(long, conflicts_with = "no_genres")]
        all_genres: bool,

        /// Deselect every genre
        #[arg(long)]
        no_genres: bool,

        /// Select a title type: movie, series or mini-series (repeatable)
        #[arg(long = "type")]
        types: Vec<TitleTypeFamily>,

        /// Deselect a title type (repeatable)
        #[arg(long = "no-type")]
        unselected_types: Vec<TitleTypeFamily>,

        /// Require every selected genre instead of any
        #[arg(long)]
        require_all_genres: Option<bool>,

        /// Mark a title as watched, e.g. tt0111161 (repeatable)
        #[arg(long)]
        watched: Vec<TitleId>,

        /// Never suggest a title again (repeatable)
        #[arg(long)]
        ignored: Vec<TitleId>,
    },
    /// Show catalog statistics
    Status,
    /// Manage configuration
    ///
    /// Configuration is loaded from multiple sources with priority:
    /// CLI args > ENV vars (W2W_*) > Config file > Defaults
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.db {
        Some(db) => Config::load_with_db_path(db)?,
        None => Config::load()?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Commands::Download { overwrite } => {
            commands::run_download(&config, overwrite).await?;
        }
        Commands::Import {
            basics,
            ratings,
            batch_size,
            skip_download,
        } => {
            let mut config = config;
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            let files = match (basics, ratings) {
                (Some(basics), Some(ratings)) => Some(DatasetFiles { basics, ratings }),
                _ => None,
            };
            commands::run_import(&config, files, skip_download).await?;
        }
        Commands::Suggest { user, json } => {
            commands::suggest(&config, user, json)?;
        }
        Commands::Prefs {
            user,
            min_rating,
            min_votes,
            genres,
            unselected_genres,
            all_genres,
            no_genres,
            types,
            unselected_types,
            require_all_genres,
            watched,
            ignored,
        } => {
            let changes = commands::prefs::PrefsChanges {
                min_rating,
                min_votes,
                genres,
                unselected_genres,
                all_genres,
                no_genres,
                types,
                unselected_types,
                require_all_genres,
                watched,
                ignored,
            };
            commands::prefs::update_prefs(&config, user, &changes)?;
        }
        Commands::Status => {
            commands::show_status(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show_config(&config)?,
            ConfigAction::Path => commands::config::show_path()?,
            ConfigAction::Example => commands::config::show_example()?,
            ConfigAction::Init => commands::config::init_config()?,
        },
    }

    Ok(())
}
