use clap::Parser;
use npuzzle_solver::dispatch;
use npuzzle_solver::engine::PuzzleState;
use npuzzle_solver::heuristics;
use npuzzle_solver::solver::{self, Algorithm, GoalFn, HeuristicFn, Search};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board side length (3 to 5)
    #[clap(short, long, default_value_t = 3)]
    size: usize,

    /// Number of scrambled boards per strategy
    #[clap(short, long, default_value_t = 20)]
    boards: usize,

    /// Random-walk length per scramble
    #[clap(long, default_value_t = 25)]
    steps: usize,

    /// Seed of the first board; board i uses seed + i
    #[clap(long, default_value_t = 0)]
    seed: u64,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    assert!((3..=5).contains(&args.size), "size must be 3 to 5");

    println!(
        "Benchmarking {} strategies over {} {}x{} boards ({} scramble steps)...",
        Algorithm::ALL.len(),
        args.boards,
        args.size,
        args.size,
        args.steps
    );

    let solved = PuzzleState::solved(args.size);
    let boards: Vec<PuzzleState> = (0..args.boards)
        .map(|i| solved.scramble(args.steps, args.seed + i as u64))
        .collect();
    let limits = dispatch::limits_for(args.size);

    println!(
        "\n{:<20} {:>7} {:>12} {:>12}",
        "Strategy", "Solved", "Avg moves", "Elapsed"
    );
    for algorithm in Algorithm::ALL {
        let mut solved_count = 0usize;
        let mut total_moves = 0usize;
        let started = std::time::Instant::now();
        for board in &boards {
            let h: &HeuristicFn = &heuristics::manhattan_with_conflicts;
            let goal: &GoalFn = &|s: &PuzzleState| s.is_solved();
            let mut search = Search::new(h, goal);
            search.limits = limits.clone();
            if let Ok(moves) = solver::run(algorithm, &search, board) {
                solved_count += 1;
                total_moves += moves.len();
            }
        }
        let elapsed = started.elapsed();
        let avg_moves = if solved_count > 0 {
            format!("{:.1}", total_moves as f64 / solved_count as f64)
        } else {
            "-".to_string()
        };
        println!(
            "{:<20} {:>4}/{:<2} {:>12} {:>10.2}s",
            algorithm.name(),
            solved_count,
            boards.len(),
            avg_moves,
            elapsed.as_secs_f64()
        );
    }
}
