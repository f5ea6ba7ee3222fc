use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;

use blunder_check_core::{
    analyze_pgn_game, parse_pgn_file, parse_pgn_string, AnalysisConfig, MatePolicy, PgnGame, Tally,
};
use clap::{ArgAction, Parser};
use thiserror::Error;
use tokio::sync::{AcquireError, Semaphore};
use tokio::task::{self, JoinError, JoinHandle};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// The three sample games bundled with the binary
const DEMO_GAMES: &str = include_str!("../games/demo.pgn");

/// Count inaccuracies, mistakes and blunders in chess games.
#[derive(Debug, Parser)]
#[command(name = "blunder-check", version)]
struct Cli {
    /// PGN files to analyze ("-" or nothing reads stdin)
    files: Vec<PathBuf>,

    /// Analyze the bundled sample games instead of reading input
    #[arg(long, conflicts_with = "files")]
    demo: bool,

    /// TOML file with analysis settings
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Path to a UCI engine binary
    #[arg(short, long, value_name = "PATH")]
    engine: Option<PathBuf>,

    /// Engine time per position
    #[arg(short = 't', long, value_name = "SECONDS")]
    move_time: Option<f64>,

    /// Who is charged for mate transitions: any-transition or opponent-only
    #[arg(long, value_name = "POLICY")]
    mate_policy: Option<MatePolicy>,

    /// Analyze games concurrently, one engine per game, as many at once as
    /// there are CPUs
    #[arg(short, long)]
    parallel: bool,

    /// Number of games analyzed at once (overrides --parallel)
    #[arg(short, long, value_name = "N")]
    jobs: Option<NonZeroUsize>,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] blunder_check_core::Error),

    #[error("Failed to read {path}: {source}")]
    Input { path: String, source: io::Error },

    #[error("Failed to encode result: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Analysis task failed: {0}")]
    Task(#[from] JoinError),

    #[error("Analysis scheduler closed: {0}")]
    Scheduler(#[from] AcquireError),
}

impl From<blunder_check_core::PgnError> for CliError {
    fn from(error: blunder_check_core::PgnError) -> Self {
        CliError::Core(error.into())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("[ERROR] {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config = build_config(&cli)?;
    let games = load_games(&cli)?;
    let jobs = job_limit(&cli);

    info!(
        games = games.len(),
        engine = %config.engine_path.display(),
        jobs,
        "starting analysis"
    );
    println!("Analysing {} game(s):", games.len());

    let analyze = Arc::new(move |game: &PgnGame| analyze_pgn_game(game, &config));
    let mut handles = spawn_all(&games, jobs, analyze);

    let result = report_all(&games, &mut handles).await;
    if result.is_err() {
        // Games still waiting for a slot are not started
        handles.iter().for_each(JoinHandle::abort);
    }
    result
}

fn job_limit(cli: &Cli) -> usize {
    match cli.jobs {
        Some(jobs) => jobs.get(),
        None if cli.parallel => thread::available_parallelism().map_or(1, NonZeroUsize::get),
        None => 1,
    }
}

/// Queues every game for analysis on the blocking pool, with at most `jobs`
/// engines running at once. Handles are returned in input order.
fn spawn_all<F>(
    games: &[PgnGame],
    jobs: usize,
    analyze: Arc<F>,
) -> Vec<JoinHandle<Result<Tally, CliError>>>
where
    F: Fn(&PgnGame) -> blunder_check_core::Result<Tally> + Send + Sync + 'static,
{
    let slots = Arc::new(Semaphore::new(jobs.max(1)));

    games
        .iter()
        .cloned()
        .map(|game| {
            let slots = Arc::clone(&slots);
            let analyze = Arc::clone(&analyze);
            tokio::spawn(async move {
                let _slot = slots.acquire_owned().await?;
                // Engine I/O is synchronous
                let tally = task::spawn_blocking(move || analyze(&game)).await??;
                Ok::<_, CliError>(tally)
            })
        })
        .collect()
}

async fn report_all(
    games: &[PgnGame],
    handles: &mut [JoinHandle<Result<Tally, CliError>>],
) -> Result<(), CliError> {
    for (index, (game, handle)) in games.iter().zip(handles.iter_mut()).enumerate() {
        let tally = handle.await??;
        report(index, game, &tally)?;
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<AnalysisConfig, CliError> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    if let Some(engine) = &cli.engine {
        config.engine_path = engine.clone();
    }
    if let Some(secs) = cli.move_time {
        config.move_time_secs = secs;
    }
    if let Some(policy) = cli.mate_policy {
        config.mate_policy = policy;
    }

    config.validate()?;
    Ok(config)
}

fn load_games(cli: &Cli) -> Result<Vec<PgnGame>, CliError> {
    if cli.demo {
        return Ok(parse_pgn_string(DEMO_GAMES)?);
    }

    if cli.files.is_empty() {
        return read_stdin();
    }

    let mut games = Vec::new();
    for path in &cli.files {
        if path == Path::new("-") {
            games.extend(read_stdin()?);
        } else {
            games.extend(parse_pgn_file(path)?);
        }
    }
    Ok(games)
}

fn read_stdin() -> Result<Vec<PgnGame>, CliError> {
    let text = io::read_to_string(io::stdin()).map_err(|source| CliError::Input {
        path: "stdin".into(),
        source,
    })?;
    Ok(parse_pgn_string(&text)?)
}

fn report(index: usize, game: &PgnGame, tally: &Tally) -> Result<(), CliError> {
    println!("Game {}: {}", index + 1, game.summary());
    println!("Game {} analysis: {}", index + 1, serde_json::to_string(tally)?);
    Ok(())
}
