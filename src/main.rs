use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use courtside::calculate::leaderboard;
use courtside::calculate::rating::{compute_tier, match_deltas, side_tier};
use courtside::config::EngineConfig;
use courtside::models::{
    default_ceiling, MatchFormat, MatchRules, PairingRecord, Participant, ParticipantId, Side,
    POINT_GOAL_PRESETS,
};
use courtside::scoring::MatchState;
use courtside::session::Session;

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Match scoring and fair rotation engine for badminton meetups")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./courtside.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a simulated session with random rallies
    Simulate {
        /// Number of participants
        #[arg(long, default_value = "8")]
        players: usize,

        /// Number of matches to play
        #[arg(long, default_value = "20")]
        games: usize,

        /// Match format; picked from the pool size when omitted
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Seed for the scheduler and rallies (overrides config)
        #[arg(long)]
        seed: Option<u64>,

        /// Players to bench for the whole session, by index
        #[arg(long, value_delimiter = ',')]
        bench: Vec<usize>,

        /// Print the finished session as JSON instead of tables
        #[arg(long)]
        json: bool,
    },

    /// List point goals and their allowed point caps
    Rules,

    /// Show the rating change for a match between two sides
    Deltas {
        /// Ratings of side A, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        side_a: Vec<u32>,

        /// Ratings of side B, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        side_b: Vec<u32>,

        /// Winning side
        #[arg(long, value_enum)]
        winner: SideArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Singles,
    Doubles,
}

impl From<FormatArg> for MatchFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Singles => MatchFormat::Singles,
            FormatArg::Doubles => MatchFormat::Doubles,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SideArg {
    A,
    B,
}

impl From<SideArg> for Side {
    fn from(arg: SideArg) -> Self {
        match arg {
            SideArg::A => Side::A,
            SideArg::B => Side::B,
        }
    }
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    if path.exists() {
        EngineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))
    } else {
        Ok(EngineConfig::default())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    // Initialize tracing
    let level = cli.log_level.as_deref().unwrap_or(&config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting courtside v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Simulate {
            players,
            games,
            format,
            seed,
            bench,
            json,
        } => simulate(
            &config,
            players,
            games,
            format.map(Into::into),
            seed,
            &bench,
            json,
        ),

        Commands::Rules => {
            println!("=== Point Goals ===");
            for goal in POINT_GOAL_PRESETS {
                let rules = MatchRules::new(MatchFormat::Doubles, goal);
                let options = rules.ceiling_options();
                println!(
                    "  {:>2} points: cap {} (choose {}..={})",
                    goal,
                    default_ceiling(goal).unwrap_or(goal),
                    options.start(),
                    options.end()
                );
            }
            println!();
            for format in [MatchFormat::Singles, MatchFormat::Doubles] {
                let rules = config.rules.rules_for(format);
                println!(
                    "Default {}: {} points, cap {}",
                    format, rules.point_goal, rules.point_ceiling
                );
            }
            Ok(())
        }

        Commands::Deltas {
            side_a,
            side_b,
            winner,
        } => {
            let winner: Side = winner.into();
            let (delta_a, delta_b) = match_deltas(&side_a, &side_b, winner);
            println!(
                "Side A tier {} -> {:+}",
                side_tier(&side_a),
                delta_a
            );
            println!(
                "Side B tier {} -> {:+}",
                side_tier(&side_b),
                delta_b
            );
            println!("Winner: {}", winner);
            Ok(())
        }
    }
}

fn simulate(
    config: &EngineConfig,
    players: usize,
    games: usize,
    format: Option<MatchFormat>,
    seed: Option<u64>,
    bench: &[usize],
    json: bool,
) -> Result<()> {
    if players < 2 {
        bail!("Need at least 2 players, got {}", players);
    }

    let mut rng = match seed.or(config.scheduler.seed) {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut roster: Vec<Participant> = (1..=players)
        .map(|i| {
            Participant::with_id(ParticipantId::from(format!("p{}", i)), format!("Player {}", i))
                .with_rating(rng.random_range(0..=100))
        })
        .collect();
    let mut pairings: Vec<PairingRecord> = Vec::new();

    let mut session = Session::new(roster.iter().map(|p| p.id.clone()));
    for &index in bench {
        let Some(player) = roster.get(index) else {
            bail!("No player at index {}", index);
        };
        session.set_benched(&player.id, true)?;
    }

    let scheduler = config.scheduler.scheduler();
    let format = format.unwrap_or_else(|| session.suggested_format());
    let rules = config.rules.rules_for(format);

    if !json {
        println!(
            "=== Simulating {} {} matches, {} players ===\n",
            games,
            format,
            session.eligible_pool().len()
        );
    }

    for game in 1..=games {
        let Some(matchup) = session.schedule_next(&scheduler, format, &mut rng) else {
            bail!("Pool too small for {}", format);
        };

        let edge = rally_edge(&roster, &matchup.side_a.members(), &matchup.side_b.members());
        let state = session.start_matchup(matchup, rules)?;
        play_out(state, edge, &mut rng);

        let (score_a, score_b) = (state.score(Side::A), state.score(Side::B));
        let side_a = state.side(Side::A).pairing.key();
        let side_b = state.side(Side::B).pairing.key();

        let settlement = session.finish_match(&roster, &pairings)?;
        settlement.merge_into(&mut roster, &mut pairings);

        if json {
            continue;
        }
        let (delta_a, delta_b) = settlement.rating_deltas;
        println!(
            "#{:>3}  {:<10} {:>2} - {:<2} {:<10}  winner {}  ({:+} / {:+})",
            game, side_a, score_a, score_b, side_b, settlement.winner, delta_a, delta_b
        );
    }

    session.end_session();

    if json {
        let output = serde_json::json!({
            "session": session,
            "participants": roster,
            "pairings": pairings,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("\n=== Session Standings ===");
    for row in session.standings() {
        println!(
            "{:>3}. {:<6} {:>2}W {:>2}L  {:>5.1}%",
            row.rank,
            row.participant_id,
            row.wins,
            row.losses,
            row.win_rate * 100.0
        );
    }

    println!("\n=== Ratings ===");
    for row in leaderboard(&roster, 0) {
        let rating = row.rating.unwrap_or(0);
        println!(
            "{:>3}. {:<6} rating {:>3} (tier {})",
            row.rank,
            row.participant_id,
            rating,
            compute_tier(rating)
        );
    }

    let ranked = leaderboard(&roster, config.ranking.min_ranked_games);
    println!(
        "\n{} of {} players ranked (>= {} games)",
        ranked.len(),
        roster.len(),
        config.ranking.min_ranked_games
    );

    let busiest = pairings.iter().max_by_key(|p| p.games_played());
    if let Some(record) = busiest {
        println!(
            "Most played pairing: {} ({} games)",
            record.key,
            record.games_played()
        );
    }

    Ok(())
}

/// Chance that side A wins a rally, nudged by the average rating gap.
fn rally_edge(roster: &[Participant], side_a: &[&ParticipantId], side_b: &[&ParticipantId]) -> f64 {
    let average = |ids: &[&ParticipantId]| -> f64 {
        let ratings: Vec<f64> = ids
            .iter()
            .filter_map(|id| roster.iter().find(|p| &p.id == *id))
            .map(|p| f64::from(p.rating.min(100)))
            .collect();
        if ratings.is_empty() {
            50.0
        } else {
            ratings.iter().sum::<f64>() / ratings.len() as f64
        }
    };
    (0.5 + (average(side_a) - average(side_b)) / 400.0).clamp(0.1, 0.9)
}

fn play_out(state: &mut MatchState, edge: f64, rng: &mut StdRng) {
    while !state.is_complete() {
        let side = if rng.random_bool(edge) { Side::A } else { Side::B };
        state.score_point(side);
    }
}
