use anyhow::{Context, Result};
use clap::Parser;
use fzgrep::output;
use fzgrep::search::{ExternalSearcher, SearchMode, SearchOptions};
use fzgrep::tui::{self, App, FsPreview, PreviewMode};
use fzgrep::utils::{self, AppConfig};
use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Environment variable naming the log file
const LOG_ENV: &str = "FZGREP_LOG";

/// Exit status when the user quits without confirming
const EXIT_QUIT: u8 = 130;

#[derive(Parser)]
#[command(name = "fzgrep")]
#[command(about = "Interactive fuzzy finder over file contents and paths")]
struct Cli {
    /// Initial query
    query: Option<String>,

    /// Directory to search in
    #[arg(short, long)]
    path: Option<PathBuf>,

    /// Start in file mode instead of content mode
    #[arg(short, long)]
    files: bool,

    /// Match case exactly
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Include hidden files and directories
    #[arg(short = 'H', long)]
    hidden: bool,

    /// Cap on candidates taken from the search tool
    #[arg(short, long)]
    max_results: Option<usize>,

    /// Preview pane placement
    #[arg(long, value_enum)]
    preview: Option<PreviewMode>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fzgrep: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    init_logging()?;

    let config = AppConfig::load()?;
    let options = SearchOptions {
        case_sensitive: cli.case_sensitive || config.case_sensitive,
        search_hidden: cli.hidden || config.search_hidden,
        max_results: cli.max_results.or(config.max_results),
        directory: cli.path,
    };
    let mode = if cli.files {
        SearchMode::Files
    } else {
        SearchMode::Content
    };

    let history_path = utils::get_history_path()?;
    let history = utils::load_history(&history_path).unwrap_or_else(|e| {
        warn!(error = %e, "ignoring unreadable history");
        Vec::new()
    });

    let searcher = ExternalSearcher::new(config.rg_path.clone(), config.fd_path.clone());
    let mut app = App::new(Box::new(searcher), options, mode)
        .with_history(history, config.history_limit);
    app.preview_mode = cli.preview.unwrap_or(config.preview_mode);
    if let Some(query) = cli.query.as_deref() {
        app.set_query(query);
    }

    info!(mode = mode.label(), query = app.query(), "starting finder");

    let mut previews = FsPreview::new(config.preview_max_bytes);
    let outcome = tui::run(&mut app, &mut previews)?;

    if let Err(e) = utils::save_history(&history_path, app.history()) {
        warn!(error = %e, "failed to save history");
    }

    let Some(selection) = outcome else {
        return Ok(ExitCode::from(EXIT_QUIT));
    };
    if selection.is_empty() {
        return Ok(ExitCode::FAILURE);
    }

    output::print_selection(&selection, app.search_mode, !cli.no_color)
        .context("failed to print selection")?;
    Ok(ExitCode::SUCCESS)
}

/// Log to the file named by `FZGREP_LOG`; the terminal belongs to the finder
fn init_logging() -> Result<()> {
    let Some(path) = std::env::var_os(LOG_ENV) else {
        return Ok(());
    };

    let file = File::create(&path)
        .with_context(|| format!("failed to open log file {}", PathBuf::from(&path).display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
