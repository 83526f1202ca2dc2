//! Line-oriented text protocol in the spirit of UCI.
//!
//! ```text
//! hello                         -> id name draughts-ai / ok
//! isready                       -> readyok
//! newgame
//! position startpos [moves m1 m2 ...]
//! position diagram <rows> [w|b] [moves ...]
//! moves [square]                -> moves <move> <move> ...
//! play <move>                   -> played <move> [/ continue <square>] [/ result ...]
//! go [depth N] | go random      -> info ... / bestmove <move>
//! eval                          -> score <n>
//! board                         -> diagram, side to move, pending capture
//! quit
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::board::{Board, Coord};
use crate::config::EngineConfig;
use crate::game::{Game, GameStatus};
use crate::movegen::MoveGenerator;
use crate::notation::MoveText;
use crate::search::Search;

pub struct ProtocolHandler {
    game: Game,
    search: Search,
    move_generator: MoveGenerator,
    rng: StdRng,
}

impl ProtocolHandler {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let move_generator = config.move_generator();
        Ok(Self {
            game: Game::from_board(Board::new(), move_generator.clone()),
            search: config.build_search()?,
            move_generator,
            rng: StdRng::from_entropy(),
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        while reader.read_line(&mut line).context("failed to read stdin")? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }

            match self.handle_command(command) {
                Ok(response) => print!("{}", response),
                Err(e) => {
                    warn!("Command '{}' failed: {:#}", command, e);
                    println!("error {:#}", e);
                }
            }

            stdout.flush()?;
            line.clear();
        }
        info!("Protocol loop finished");
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let parts: Vec<&str> = command.split_whitespace().collect();
        if parts.is_empty() {
            return Ok(String::new());
        }

        match parts[0] {
            "hello" => Ok("id name draughts-ai\nok\n".to_string()),
            "isready" => Ok("readyok\n".to_string()),
            "newgame" => {
                self.game = Game::from_board(Board::new(), self.move_generator.clone());
                Ok(String::new())
            }
            "position" => self.handle_position(&parts[1..]),
            "moves" => self.handle_moves(&parts[1..]),
            "play" => self.handle_play(&parts[1..]),
            "go" => self.handle_go(&parts[1..]),
            "eval" => Ok(format!(
                "score {}\n",
                self.search.evaluator().evaluate(self.game.board())
            )),
            "board" => Ok(self.describe_board()),
            "quit" => Ok(String::new()),
            other => bail!("unknown command '{}'", other),
        }
    }

    fn handle_position(&mut self, parts: &[&str]) -> Result<String> {
        let (board, rest) = match parts.first() {
            Some(&"startpos") => (Board::new(), &parts[1..]),
            Some(&"diagram") => {
                let rows = parts.get(1).ok_or_else(|| anyhow!("diagram rows missing"))?;
                let mut board = Board::from_diagram(rows)?;
                let mut rest = &parts[2..];
                if let Some(side) = rest.first().filter(|s| **s != "moves") {
                    board.set_side_to_move(side.parse()?);
                    rest = &rest[1..];
                }
                (board, rest)
            }
            _ => bail!("expected 'startpos' or 'diagram'"),
        };

        let mut game = Game::from_board(board, self.move_generator.clone());
        if let Some((&"moves", moves)) = rest.split_first() {
            for text in moves {
                let mv = text.parse::<MoveText>()?.resolve(&game.legal_moves())?;
                game.play(&mv)
                    .with_context(|| format!("while replaying {}", text))?;
            }
        }
        self.game = game;
        Ok(String::new())
    }

    fn handle_moves(&self, parts: &[&str]) -> Result<String> {
        let mut moves = self.game.legal_moves();
        if let Some(square) = parts.first() {
            let from: Coord = square.parse()?;
            moves.retain(|mv| mv.from == from);
        }

        let listed: Vec<String> = moves.iter().map(|mv| mv.to_string()).collect();
        if listed.is_empty() {
            return Ok("moves\n".to_string());
        }
        Ok(format!("moves {}\n", listed.join(" ")))
    }

    fn handle_play(&mut self, parts: &[&str]) -> Result<String> {
        let text = parts.first().ok_or_else(|| anyhow!("play needs a move"))?;
        let mv = text.parse::<MoveText>()?.resolve(&self.game.legal_moves())?;
        let outcome = self.game.play(&mv)?;

        let mut response = format!("played {}\n", outcome.played);
        if outcome.continues {
            response.push_str(&format!("continue {}\n", outcome.played.to));
        }
        if let GameStatus::Won { winner } = outcome.status {
            response.push_str(&format!("result {} wins\n", winner));
        }
        Ok(response)
    }

    fn handle_go(&mut self, parts: &[&str]) -> Result<String> {
        if parts.first() == Some(&"random") {
            return match self.game.random_move(&mut self.rng) {
                Some(mv) => Ok(format!("bestmove {}\n", mv)),
                None => Ok("bestmove (none)\n".to_string()),
            };
        }

        let depth = match parts.iter().position(|p| *p == "depth") {
            Some(i) => parts
                .get(i + 1)
                .and_then(|s| s.parse::<u32>().ok())
                .ok_or_else(|| anyhow!("depth needs a positive number"))?,
            None => self.search.max_depth(),
        };

        let candidates = self.game.legal_moves();
        if candidates.is_empty() {
            return Ok("bestmove (none)\n".to_string());
        }

        let color = self.game.side_to_move();
        let outcome = self
            .search
            .search_among(self.game.board(), color, depth, candidates)?;
        Ok(format!(
            "info depth {} score {} nodes {}\nbestmove {}\n",
            depth, outcome.score, outcome.nodes, outcome.best_move
        ))
    }

    fn describe_board(&self) -> String {
        let mut out = self.game.board().to_string();
        out.push_str(&format!("side {}\n", self.game.side_to_move()));
        if let Some(square) = self.game.pending_continuation() {
            out.push_str(&format!("continue {}\n", square));
        }
        out
    }
}
