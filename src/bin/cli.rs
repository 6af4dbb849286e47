//! Keiba CLI - Command-line interface for race probabilities and bet allocation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use keiba::backtesting::run_backtest;
use keiba::core::{allocate_budget_with, BlendConfig, ProbabilityBlender, Strategy, DEFAULT_UNIT};
use keiba::data::{load_historical_races, load_race_card};
use keiba::error::{validate_alpha, validate_budget, validate_unit};
use keiba::{AllocationResult, RaceCard};

#[cfg(feature = "scraper")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "scraper")]
use keiba::data::save_race_card;
#[cfg(feature = "scraper")]
use keiba::history::{
    attach_history, HistoryCache, HistoryClientConfig, HistoryProvider, NetkeibaHistory,
    HISTORY_RACES,
};

#[derive(Parser)]
#[command(name = "keiba")]
#[command(author, version, about = "Horse racing probability and budget allocation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log allocator decisions
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show blended win probabilities and expected values for a race
    Probabilities {
        /// Race card JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Weight on the form model (0 = market only)
        #[arg(long, default_value_t = keiba::core::ALPHA)]
        alpha: f64,
    },

    /// Allocate a budget across a race
    Allocate {
        /// Race card JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Total budget in yen
        #[arg(short, long)]
        budget: i64,

        /// Allocation strategy: covering (dutch) or kelly
        #[arg(short, long, default_value = "covering")]
        strategy: Strategy,

        /// Betting unit in yen (covering strategy)
        #[arg(long, default_value_t = DEFAULT_UNIT)]
        unit: i64,

        /// Weight on the form model
        #[arg(long, default_value_t = keiba::core::ALPHA)]
        alpha: f64,

        /// Print the allocation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay settled races through a strategy
    Backtest {
        /// JSON array of settled races
        #[arg(short, long)]
        input: PathBuf,

        /// Budget per race in yen
        #[arg(short, long)]
        budget: i64,

        /// Allocation strategy: covering (dutch) or kelly
        #[arg(short, long, default_value = "covering")]
        strategy: Strategy,

        /// Betting unit in yen (covering strategy)
        #[arg(long, default_value_t = DEFAULT_UNIT)]
        unit: i64,
    },

    /// Fetch one horse's recent results from db.netkeiba.com
    #[cfg(feature = "scraper")]
    History {
        /// netkeiba horse id
        #[arg(long)]
        horse_id: String,

        /// Number of recent races
        #[arg(long, default_value_t = HISTORY_RACES)]
        races: usize,

        /// Delay between requests in milliseconds
        #[arg(long, default_value = "250")]
        delay: u64,
    },

    /// Attach recent results to every entrant of a race card
    #[cfg(feature = "scraper")]
    Enrich {
        /// Race card JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output race card JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// Number of recent races per horse
        #[arg(long, default_value_t = HISTORY_RACES)]
        races: usize,

        /// Delay between requests in milliseconds
        #[arg(long, default_value = "250")]
        delay: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    // Keep stdout clean for JSON output
    let json_output = matches!(cli.command, Some(Commands::Allocate { json: true, .. }));
    if !json_output {
        println!("{}", format!("Keiba CLI v{}", env!("CARGO_PKG_VERSION")).cyan().bold());
        println!();
    }

    match cli.command {
        Some(Commands::Probabilities { input, alpha }) => show_probabilities(&input, alpha)?,
        Some(Commands::Allocate {
            input,
            budget,
            strategy,
            unit,
            alpha,
            json,
        }) => run_allocate(&input, budget, strategy, unit, alpha, json)?,
        Some(Commands::Backtest {
            input,
            budget,
            strategy,
            unit,
        }) => run_backtest_command(&input, budget, strategy, unit)?,
        #[cfg(feature = "scraper")]
        Some(Commands::History {
            horse_id,
            races,
            delay,
        }) => run_history(&horse_id, races, delay)?,
        #[cfg(feature = "scraper")]
        Some(Commands::Enrich {
            input,
            output,
            races,
            delay,
        }) => run_enrich(&input, &output, races, delay)?,
        None => println!("Use --help for usage information."),
    }

    Ok(())
}

fn load_card(input: &Path) -> Result<RaceCard> {
    load_race_card(input).with_context(|| format!("Failed to load race card from {:?}", input))
}

fn print_race_header(card: &RaceCard) {
    println!(
        "{}: {} {}",
        "Race".green(),
        card.race_id,
        card.race_name.as_deref().unwrap_or("")
    );
    println!();
}

fn show_probabilities(input: &Path, alpha: f64) -> Result<()> {
    validate_alpha(alpha)?;
    let card = load_card(input)?;
    print_race_header(&card);

    let blender = ProbabilityBlender::new(BlendConfig { alpha });
    let breakdown = blender.breakdown(&card.entrants);
    let rated = blender.rate(&card.entrants);

    println!("{}", "勝率予想 (Win Probabilities):".yellow().bold());
    println!(
        "{:>4} {:<16} {:>7} {:>6} {:>8} {:>8} {:>8} {:>8}",
        "馬番", "馬名", "オッズ", "Form", "市場", "Form%", "予想", "EV"
    );
    println!("{}", "-".repeat(78));

    for (r, b) in rated.iter().zip(&breakdown) {
        let ev = format!("{:>+8.3}", r.expected_value);
        let ev = if r.is_value_bet() { ev.green().bold() } else { ev.normal() };
        println!(
            "{:>4} {:<16} {:>7.1} {:>6.3} {:>7.1}% {:>7.1}% {:>7.1}% {}",
            r.entrant.horse_number,
            truncate_name(&r.entrant.horse_name, 16),
            r.entrant.odds_win,
            b.form_score,
            b.p_market * 100.0,
            b.p_form * 100.0,
            r.win_probability * 100.0,
            ev
        );
    }
    println!();

    let value_bets = rated.iter().filter(|r| r.is_value_bet()).count();
    println!("Value bets (EV > 0): {}", value_bets);

    Ok(())
}

fn run_allocate(input: &Path, budget: i64, strategy: Strategy, unit: i64, alpha: f64, json: bool) -> Result<()> {
    validate_budget(budget)?;
    validate_unit(unit)?;
    validate_alpha(alpha)?;

    let card = load_card(input)?;
    let allocator = strategy.allocator(unit);
    let blender = ProbabilityBlender::new(BlendConfig { alpha });
    let allocation = allocate_budget_with(&blender, &card.entrants, budget, allocator.as_ref());

    if json {
        println!("{}", serde_json::to_string_pretty(&allocation)?);
        return Ok(());
    }

    print_race_header(&card);
    println!(
        "{}: {} / budget {}",
        "Strategy".green(),
        allocator.name(),
        budget
    );
    println!();
    print_allocation(&allocation);

    Ok(())
}

fn print_allocation(allocation: &AllocationResult) {
    match allocation {
        AllocationResult::Kelly(alloc) => {
            println!("{:>4} {:<16} {:>7} {:>10} {:>10} {:>10}", "馬番", "馬名", "オッズ", "Kelly", "推奨額", "期待値");
            println!("{}", "-".repeat(64));
            for bet in alloc.bets.iter().filter(|b| b.recommended_bet > 0) {
                println!(
                    "{:>4} {:<16} {:>7.1} {:>10.4} {:>10} {:>10.2}",
                    bet.horse_number,
                    truncate_name(&bet.horse_name, 16),
                    bet.odds_win,
                    bet.kelly_fraction,
                    bet.recommended_bet,
                    bet.expected_return
                );
            }
        }
        AllocationResult::Covering(alloc) => {
            println!("{:>4} {:<16} {:>7} {:>8} {:>10} {:>10}", "馬番", "馬名", "オッズ", "勝率", "推奨額", "的中時");
            println!("{}", "-".repeat(64));
            for bet in &alloc.bets {
                println!(
                    "{:>4} {:<16} {:>7.1} {:>7.1}% {:>10} {:>10}",
                    bet.horse_number,
                    truncate_name(&bet.horse_name, 16),
                    bet.odds_win,
                    bet.win_probability * 100.0,
                    bet.recommended_bet,
                    bet.if_wins_return
                );
            }
            println!();
            println!("Guaranteed return: {}", alloc.guaranteed_return);
            println!("Coverage: {:.1}%", alloc.coverage * 100.0);
        }
    }

    println!();
    if allocation.total_bet() == 0 {
        println!("{}", "No bets recommended for this race.".yellow());
    }
    println!("Total bet: {}", allocation.total_bet());
    println!("Remaining budget: {}", allocation.remaining_budget());
    println!("Expected return: {:.2}", allocation.expected_return());
}

fn run_backtest_command(input: &Path, budget: i64, strategy: Strategy, unit: i64) -> Result<()> {
    validate_budget(budget)?;
    validate_unit(unit)?;

    let races = load_historical_races(input)
        .with_context(|| format!("Failed to load races from {:?}", input))?;

    println!("{}", "Running backtest...".green());
    println!("Strategy: {}", strategy);
    println!("Budget per race: {}", budget);
    println!("Races: {}", races.len());
    println!();

    let allocator = strategy.allocator(unit);
    let result = run_backtest(&races, allocator.as_ref(), budget);

    println!("{}", "Results:".yellow().bold());
    println!("{}", "-".repeat(40));
    println!("Races with bets: {}/{}", result.races_with_bets, result.total_races);
    println!("Total stake: {}", result.total_stake);
    println!("Total payout: {}", result.total_payout);

    let profit = result.total_profit();
    let profit_str = format!("{:+}", profit);
    println!(
        "Profit: {}",
        if profit >= 0 { profit_str.green() } else { profit_str.red() }
    );
    println!("ROI: {:+.1}%", result.roi() * 100.0);

    if let Some(metrics) = &result.metrics {
        println!("Hit rate: {:.1}%", metrics.hit_rate * 100.0);
        println!("Max drawdown: {}", metrics.max_drawdown);
        println!("Profit factor: {:.2}", metrics.profit_factor);
    }

    Ok(())
}

#[cfg(feature = "scraper")]
fn history_client(delay: u64) -> Result<NetkeibaHistory> {
    let config = HistoryClientConfig {
        delay_ms: delay,
        ..Default::default()
    };
    NetkeibaHistory::new(config, HistoryCache::new()).context("Failed to create history client")
}

#[cfg(feature = "scraper")]
fn run_history(horse_id: &str, races: usize, delay: u64) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let client = history_client(delay)?;
    let history = rt
        .block_on(client.recent_results(horse_id, races))
        .with_context(|| format!("Failed to fetch history for horse {}", horse_id))?;

    println!("{}: {}", "Horse".green(), horse_id);
    println!("{:>4} {:>6} {:>6} {:>8} {:>8}", "#", "着順", "頭数", "上り", "体重増減");
    println!("{}", "-".repeat(40));

    for (i, result) in history.iter().enumerate() {
        println!(
            "{:>4} {:>6} {:>6} {:>8} {:>8}",
            i + 1,
            result.ranking.map_or("-".to_string(), |r| r.to_string()),
            result.field_size,
            if result.last_3f > 0.0 {
                format!("{:.1}", result.last_3f)
            } else {
                "-".to_string()
            },
            result.weight_change.map_or("-".to_string(), |w| format!("{:+}", w))
        );
    }

    if history.is_empty() {
        println!("{}", "No results found.".yellow());
    }

    Ok(())
}

#[cfg(feature = "scraper")]
fn run_enrich(input: &Path, output: &Path, races: usize, delay: u64) -> Result<()> {
    let mut card = load_card(input)?;
    print_race_header(&card);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let client = history_client(delay)?;

    let pb = ProgressBar::new(card.entrants.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Invalid progress bar template")?
            .progress_chars("#>-"),
    );

    let mut attached = 0;
    for entrant in card.entrants.iter_mut() {
        pb.set_message(entrant.horse_name.clone());
        attached += rt.block_on(attach_history(std::slice::from_mut(entrant), &client, races));
        pb.inc(1);
    }

    pb.finish_and_clear();

    save_race_card(output, &card).with_context(|| format!("Failed to write race card to {:?}", output))?;

    println!(
        "{}: history attached for {}/{} entrants, saved to {:?}",
        "Complete".green(),
        attached,
        card.entrants.len(),
        output
    );

    Ok(())
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
