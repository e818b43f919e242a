use clap::Parser;
use npuzzle_solver::stages::EngineConfig;
use npuzzle_solver::utils::{size_from_len, tiles_from_str};
use npuzzle_solver::worker::{spawn_solve, SolveMode, SolveRequest};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Inline tile list, e.g. "1,2,3,4,5,6,7,0,8" (0 = empty)
    #[clap(short, long, conflicts_with = "board_file")]
    tiles: Option<String>,

    /// Path to a board file (comma/whitespace separated tiles)
    board_file: Option<PathBuf>,

    /// Race all algorithms concurrently instead of trying them in order
    #[clap(long)]
    all: bool,

    /// Engine preset: standard, legacy or aggressive
    #[clap(long, default_value = "standard")]
    preset: String,

    /// Print the full response as JSON instead of plain text
    #[clap(long)]
    json: bool,
}

fn preset_config(name: &str) -> Result<EngineConfig, String> {
    match name {
        "standard" => Ok(EngineConfig::standard()),
        "legacy" => Ok(EngineConfig::legacy()),
        "aggressive" => Ok(EngineConfig::aggressive()),
        other => Err(format!("unknown preset '{}'", other)),
    }
}

fn read_tiles(args: &Args) -> Result<Vec<u8>, String> {
    if let Some(inline) = &args.tiles {
        return tiles_from_str(inline);
    }
    let path = args
        .board_file
        .as_ref()
        .ok_or_else(|| "either --tiles or a board file is required".to_string())?;
    let content = fs::read_to_string(path).map_err(|e| format!("Failed to read file: {}", e))?;
    tiles_from_str(&content)
}

fn main() {
    env_logger::init();
    let args = Args::parse();

    let config = preset_config(&args.preset).expect("invalid preset");
    let tiles = read_tiles(&args).expect("failed to read the board");
    let size = size_from_len(tiles.len()).expect("invalid board");

    let request = SolveRequest {
        tiles,
        size,
        mode: if args.all {
            SolveMode::HybridAll
        } else {
            SolveMode::HybridSequential
        },
    };
    let response = spawn_solve(config, request).wait();

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&response).expect("response serializes")
        );
        return;
    }

    println!("Method: {}", response.method);
    match &response.moves {
        Some(moves) if moves.is_empty() => println!("Already solved."),
        Some(moves) => {
            println!("Moves ({}):", moves.len());
            let rendered: Vec<String> = moves.iter().map(|t| t.to_string()).collect();
            println!("  {}", rendered.join(" "));
        }
        None => {
            println!("No solution found.");
            if let Some(error) = &response.error {
                println!("Error: {}", error);
            }
        }
    }
    if let Some(trace) = &response.trace {
        println!("Attempts:");
        for attempt in trace {
            let outcome = match &attempt.result {
                Some(moves) => format!("{} moves", moves.len()),
                None => "failed".to_string(),
            };
            println!("  {:<20} {}", attempt.algorithm, outcome);
        }
    }
}
