// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use catdle::{format_countdown, Game, GameConfig, GameMode, GuessOutcome, Verdict};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about = "Guess the daily cat", long_about = None)]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "catdle.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play in the terminal UI (default)
    Play {
        /// Endless practice rounds instead of the daily cat
        #[arg(long)]
        infinite: bool,
    },

    /// Show the game day, time to the next cat, and yesterday's answer
    Today,

    /// Search the catalog by name
    Search { query: String },

    /// Submit one guess by exact name
    Guess {
        name: String,

        #[arg(long)]
        infinite: bool,
    },

    /// Reveal the hint if it is unlocked
    Hint {
        #[arg(long)]
        infinite: bool,
    },

    /// Clear today's progress
    Reset {
        #[arg(long)]
        infinite: bool,
    },
}

fn mode(infinite: bool) -> GameMode {
    if infinite {
        GameMode::Infinite
    } else {
        GameMode::Daily
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Play { infinite: false });

    // The TUI owns the terminal; only log when printing plain output
    if !matches!(command, Command::Play { .. }) {
        init_logging();
    }

    let config = GameConfig::load_or_default(&args.config);

    match command {
        Command::Play { infinite } => run_ui_mode(config, mode(infinite)),
        Command::Today => run_today(config),
        Command::Search { query } => run_search(config, &query),
        Command::Guess { name, infinite } => run_guess(config, mode(infinite), &name),
        Command::Hint { infinite } => run_hint(config, mode(infinite)),
        Command::Reset { infinite } => run_reset(config, mode(infinite)),
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "catdle=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_game(config: GameConfig, mode: GameMode) -> Result<Game> {
    let db_path = config.database_path.clone();
    Game::open(config, mode).with_context(|| format!("opening game state at {}", db_path.display()))
}

fn run_today(config: GameConfig) -> Result<()> {
    let game = open_game(config, GameMode::Daily)?;

    println!("🐱 Catdle {}", game.day_key());
    println!("   Next cat in {}", format_countdown(game.time_until_reset()));
    println!("   Guesses {}/{}", game.attempts(), game.config().max_guesses);

    let yesterday = game.yesterdays_answer();
    if yesterday.is_placeholder() {
        println!("   Yesterday: (none)");
    } else {
        println!("   Yesterday: {}", yesterday.name);
    }

    Ok(())
}

fn run_search(config: GameConfig, query: &str) -> Result<()> {
    let game = open_game(config, GameMode::Daily)?;
    let results = game.search(query);

    if results.is_empty() {
        println!("No cats match '{}'", query);
        return Ok(());
    }

    for cat in results {
        println!("{:<28} {:<8} {}", cat.name, cat.form, cat.rarity);
    }
    Ok(())
}

fn run_guess(config: GameConfig, mode: GameMode, name: &str) -> Result<()> {
    let mut game = open_game(config, mode)?;

    let report = match game.guess_by_name(name) {
        Some(report) => report,
        None => {
            println!("❌ No cat named '{}'. Try: catdle search {}", name, name);
            return Ok(());
        }
    };

    match report.outcome {
        GuessOutcome::Duplicate => println!("Already guessed {}", name),
        GuessOutcome::Closed => println!("This round is over. It was {}", game.current_secret().name),
        GuessOutcome::Correct | GuessOutcome::Incorrect => {
            if let Some(feedback) = report.feedback {
                for v in &feedback.verdicts {
                    println!(
                        "  {:<12} {:<24} {}",
                        v.attribute.label(),
                        v.attribute.value_of(&feedback.cat),
                        verdict_marker(v.verdict)
                    );
                }
            }
            if report.outcome.is_correct() {
                println!("🎉 {} it is! ({} guesses)", name, game.attempts());
            } else if game.is_over() {
                println!("Out of guesses. It was {}", game.current_secret().name);
            } else {
                println!("{} guesses left", game.guesses_left());
            }
        }
    }

    Ok(())
}

fn verdict_marker(verdict: Verdict) -> &'static str {
    match verdict {
        Verdict::Exact => "✅",
        Verdict::Partial => "🟨",
        Verdict::Miss => "❌",
        Verdict::SingleHigher => "⬆️",
        Verdict::DoubleHigher => "⏫",
        Verdict::SingleLower => "⬇️",
        Verdict::DoubleLower => "⏬",
    }
}

fn run_hint(config: GameConfig, mode: GameMode) -> Result<()> {
    let game = open_game(config, mode)?;
    match game.hint() {
        Some(source) => println!("💡 Obtained from: {}", source),
        None => println!(
            "Hint unlocks after {} guesses ({} so far)",
            game.config().hint_threshold,
            game.attempts()
        ),
    }
    Ok(())
}

fn run_reset(config: GameConfig, mode: GameMode) -> Result<()> {
    let mut game = open_game(config, mode)?;
    game.reset();
    println!("✓ Progress cleared");
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: GameConfig, mode: GameMode) -> Result<()> {
    let game = open_game(config, mode)?;

    let mut app = ui::App::new(game);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: GameConfig, _mode: GameMode) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use the web API: cargo run --bin catdle-server --features server");
    std::process::exit(1);
}
