use std::env;

use anyhow::{ensure, Context, Result};
use chess_rules::Game;

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();
    ensure!(
        args.len() == 4,
        "usage: perft-debug <fen> <depth> <expected>"
    );
    let game = Game::from_fen(&args[1])?;
    let depth: u32 = args[2].parse().context("depth must be a number")?;
    let expected: u64 = args[3].parse().context("expected must be a number")?;
    let found = game.perft(depth);
    println!("perft({depth}) = {found}");
    ensure!(found == expected, "expected {expected} nodes, found {found}");
    Ok(())
}
