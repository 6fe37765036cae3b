// main.rs - Command-line runner for Conway boards
// Registers a seed pattern, advances it through the board service and prints the result

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use conway::patterns::{self, PATTERNS};
use conway::{BoardId, BoardService, GameRules, GridState, InMemoryBoardRepository};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "conway_coro", about = "Evolve a Game of Life board until it settles")]
struct Args {
    /// Seed pattern (glider, blinker, toad, beacon, pulsar, r-pentomino, gosper-glider-gun)
    #[arg(long, default_value = "glider", conflicts_with = "random")]
    pattern: String,

    /// Fill the board randomly from this seed instead of a pattern
    #[arg(long)]
    random: Option<u64>,

    #[arg(long, default_value_t = 50)]
    rows: usize,

    #[arg(long, default_value_t = 50)]
    cols: usize,

    /// Advance by this many generations instead of running to the final state
    #[arg(long)]
    steps: Option<u32>,

    /// Overrides CONWAY_MAX_EXECUTIONS_ALLOWED
    #[arg(long)]
    max_executions: Option<u32>,

    /// Overrides CONWAY_PARALLEL_THRESHOLD
    #[arg(long)]
    parallel_threshold: Option<usize>,

    /// Print every stored generation, not just the last one
    #[arg(long)]
    show: bool,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let rules = rules(&args)?;
    let initial = initial_grid(&args)?;
    tracing::info!(
        rows = initial.rows(),
        cols = initial.cols(),
        live = initial.live_cells(),
        ceiling = rules.max_executions_allowed,
        "starting board"
    );

    let service = BoardService::new(Arc::new(InMemoryBoardRepository::new()), rules);
    let name = match args.random {
        Some(seed) => format!("random-{seed}"),
        None => args.pattern.clone(),
    };
    let id = service.register(&name, &initial.to_rows()).await?;

    let advance = match args.steps {
        Some(steps) => service.advance_by(id, steps).await?,
        None => service.finalize(id).await?,
    };

    if args.show {
        print_history(&service, id, advance.snapshot.current_step).await?;
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&advance)?);
    } else {
        println!("{}", advance.snapshot.state);
        println!(
            "Generation: {}  Final: {}  Computed: {}  Live cells: {}",
            advance.snapshot.current_step,
            advance.snapshot.is_completed,
            advance.calculated_steps,
            advance.snapshot.state.live_cells()
        );
    }
    Ok(())
}

fn rules(args: &Args) -> Result<GameRules> {
    let mut rules = GameRules::from_env().context("reading game rules from the environment")?;
    if let Some(max) = args.max_executions {
        rules.max_executions_allowed = max;
    }
    if let Some(threshold) = args.parallel_threshold {
        rules.parallel_threshold = threshold;
    }
    rules.validate()?;
    Ok(rules)
}

fn initial_grid(args: &Args) -> Result<GridState> {
    if let Some(seed) = args.random {
        return Ok(patterns::apply_random_pattern(args.rows, args.cols, seed)?);
    }
    let Some(pattern) = patterns::find_pattern(&args.pattern) else {
        let known: Vec<&str> = PATTERNS.iter().map(|p| p.name).collect();
        bail!("unknown pattern {:?}; known patterns: {}", args.pattern, known.join(", "));
    };
    Ok(patterns::apply_pattern(args.rows, args.cols, pattern)?)
}

async fn print_history(
    service: &BoardService<InMemoryBoardRepository>,
    id: BoardId,
    last: u32,
) -> Result<()> {
    for step in 0..last {
        let snapshot = service.step(id, step).await?;
        println!("Generation {step}:\n{}", snapshot.state);
    }
    Ok(())
}
