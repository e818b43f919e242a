use clap::Parser;
use npuzzle_solver::engine::PuzzleState;
use npuzzle_solver::utils::format_board;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Board side length (3 to 5)
    #[clap(short, long, default_value_t = 3)]
    size: usize,

    /// Random-walk length per scramble
    #[clap(long, default_value_t = 25)]
    steps: usize,

    /// Seed of the first scramble; board i uses seed + i
    #[clap(long, default_value_t = 514514)]
    seed: u64,

    /// How many scrambles to emit
    #[clap(short, long, default_value_t = 1)]
    count: usize,

    /// Also print each board as a grid
    #[clap(long)]
    pretty: bool,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    assert!((3..=5).contains(&args.size), "size must be 3 to 5");

    let solved = PuzzleState::solved(args.size);
    for i in 0..args.count {
        let board = solved.scramble(args.steps, args.seed + i as u64);
        let tiles: Vec<String> = board.key().iter().map(|t| t.to_string()).collect();
        println!("{}", tiles.join(","));
        if args.pretty {
            print!("{}", format_board(&board));
        }
    }
}
