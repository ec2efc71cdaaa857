//! Caro in the terminal
//!
//! Moves are typed as `row col`. The board is printed after every change,
//! logs go to stderr.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use caro::{
    AiTier, GameEnd, GameMode, GameRule, MatchConfig, MatchController, MatchObserver, MatchSnapshot, MoveOutcome,
    Player, Pos,
};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "caro", about = "Five-in-a-row against a local or external AI", version)]
struct Args {
    /// JSON match configuration; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    rows: Option<usize>,

    #[arg(long)]
    cols: Option<usize>,

    /// freestyle, standard or renju
    #[arg(long)]
    rule: Option<GameRule>,

    /// easy, hard or professional
    #[arg(long)]
    tier: Option<AiTier>,

    /// External engine executable (selects the professional tier)
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Engine data file for the chosen rule
    #[arg(long)]
    engine_config: Option<PathBuf>,

    /// Side played by the human (x or o)
    #[arg(long)]
    human: Option<Player>,

    /// Two humans at one keyboard, no AI
    #[arg(long, conflicts_with = "human")]
    pvp: bool,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn build_config(args: &Args) -> Result<MatchConfig> {
    let mut config = match &args.config {
        Some(path) => MatchConfig::load(path)?,
        None => MatchConfig::default(),
    };

    if let Some(rows) = args.rows {
        config.rows = rows;
    }
    if let Some(cols) = args.cols {
        config.cols = cols;
    }
    if let Some(rule) = args.rule {
        config.rule = rule;
    }
    if let Some(engine) = &args.engine {
        config.engine.executable = engine.clone();
        config.ai_tier = AiTier::Professional;
    }
    if let Some(data) = &args.engine_config {
        config.engine.rule_config = Some(data.clone());
    }
    if let Some(tier) = args.tier {
        config.ai_tier = tier;
    }
    if args.pvp {
        config.mode = GameMode::PvP;
    } else if let Some(human) = args.human {
        config.mode = GameMode::PvE { human };
    }

    config.validate()?;
    Ok(config)
}

/// Prints controller events
struct TerminalObserver;

impl MatchObserver for TerminalObserver {
    fn stone_played(&mut self, pos: Pos, player: Player) {
        println!("{player} plays {} {}", pos.row, pos.col);
    }

    fn board_resized(&mut self, rows: usize, cols: usize) {
        println!("board is now {rows}x{cols}");
    }

    fn status(&mut self, message: &str) {
        println!("* {message}");
    }

    fn game_ended(&mut self, end: &GameEnd) -> bool {
        match end.winner {
            Some(winner) => println!("{winner} wins!"),
            None => println!("Draw."),
        }
        print!("Play again? [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().read_line(&mut answer) {
            Ok(_) => answer.trim().eq_ignore_ascii_case("y"),
            Err(_) => false,
        }
    }
}

/// One line of user input
#[derive(Debug, PartialEq)]
enum Input {
    Move(Pos),
    Pause,
    Resume,
    New,
    Board,
    Tier(AiTier),
    Save(PathBuf),
    Load(PathBuf),
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match word.to_ascii_lowercase().as_str() {
        "q" | "quit" | "exit" => Ok(Input::Quit),
        "pause" => Ok(Input::Pause),
        "resume" => Ok(Input::Resume),
        "new" => Ok(Input::New),
        "board" => Ok(Input::Board),
        "help" | "?" => Ok(Input::Help),
        "tier" => rest.parse().map(Input::Tier),
        "save" | "load" if rest.is_empty() => Err(format!("usage: {word} FILE")),
        "save" => Ok(Input::Save(PathBuf::from(rest))),
        "load" => Ok(Input::Load(PathBuf::from(rest))),
        _ => {
            let mut numbers = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|s| !s.is_empty())
                .map(str::parse::<usize>);
            match (numbers.next(), numbers.next(), numbers.next()) {
                (Some(Ok(row)), Some(Ok(col)), None) => Ok(Input::Move(Pos::new(row, col))),
                _ => Err(format!("unrecognized input '{line}', type help")),
            }
        }
    }
}

const HELP: &str = "\
  ROW COL      place a stone
  pause        stop accepting moves
  resume       continue
  new          start over
  tier T       easy, hard or professional
  save FILE    write the match to FILE
  load FILE    restore a match from FILE
  board        show the board
  quit         leave";

fn print_board(controller: &MatchController) {
    let board = controller.board();
    let last = controller.last_move();

    print!("    ");
    for col in 0..board.cols() {
        print!("{:>3}", col);
    }
    println!();
    for (pos, cell) in board.cells() {
        if pos.col == 0 {
            print!("{:>3} ", pos.row);
        }
        let mut symbol = match cell.occupant {
            Some(player) => player.symbol(),
            None if cell.blocked => '#',
            None => '.',
        };
        if cell.winning {
            symbol = symbol.to_ascii_lowercase();
        }
        if Some(pos) == last {
            print!(" [{symbol}");
        } else {
            print!("  {symbol}");
        }
        if pos.col + 1 == board.cols() {
            println!();
        }
    }
}

fn report(outcome: &MoveOutcome) {
    match outcome {
        MoveOutcome::Applied { .. } => {}
        MoveOutcome::RejectedForbidden { reason } => println!("rejected: {reason}"),
        MoveOutcome::RejectedOccupied => println!("that cell is taken"),
        MoveOutcome::Ignored => println!("move ignored"),
    }
}

/// Block until the AI has answered (engine failures may hand the move to
/// the local AI, which is another round)
fn settle_opponent(controller: &mut MatchController) {
    while controller.is_thinking() && !controller.is_paused() {
        controller.wait_for_opponent();
    }
}

fn save(controller: &MatchController, path: &Path) -> Result<()> {
    let json = controller.snapshot().to_json()?;
    fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
    Ok(())
}

fn load(controller: &mut MatchController, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    let snapshot = MatchSnapshot::from_json(&text).with_context(|| format!("{} is not a saved match", path.display()))?;
    controller.restore(&snapshot)?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = build_config(&args)?;
    info!(rows = config.rows, cols = config.cols, rule = %config.rule, tier = %config.ai_tier, "starting match");

    let mut controller = MatchController::new(config, Box::new(TerminalObserver));
    settle_opponent(&mut controller);
    print_board(&controller);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{} > ", controller.current_player());
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }

        match parse_input(&line) {
            Ok(Input::Quit) => break,
            Ok(Input::Move(pos)) => {
                let outcome = controller.play(pos);
                report(&outcome);
                settle_opponent(&mut controller);
                print_board(&controller);
            }
            Ok(Input::Pause) => controller.set_paused(true),
            Ok(Input::Resume) => {
                controller.set_paused(false);
                settle_opponent(&mut controller);
                print_board(&controller);
            }
            Ok(Input::New) => {
                controller.new_match();
                settle_opponent(&mut controller);
                print_board(&controller);
            }
            Ok(Input::Board) => print_board(&controller),
            Ok(Input::Tier(tier)) => {
                if let Err(err) = controller.set_tier(tier) {
                    println!("{err}");
                }
                println!("AI tier: {}", controller.tier());
                settle_opponent(&mut controller);
            }
            Ok(Input::Save(path)) => match save(&controller, &path) {
                Ok(()) => println!("saved to {}", path.display()),
                Err(err) => println!("{err:#}"),
            },
            Ok(Input::Load(path)) => {
                match load(&mut controller, &path) {
                    Ok(()) => println!("loaded {}", path.display()),
                    Err(err) => println!("{err:#}"),
                }
                settle_opponent(&mut controller);
                print_board(&controller);
            }
            Ok(Input::Help) => println!("{HELP}"),
            Err(message) => println!("{message}"),
        }
    }
    Ok(())
}
