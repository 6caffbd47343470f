//! A headless play session: one generated board and its turn loop.

use anyhow::{Context, Result};
use arroyo_gameplay::{Agent, AgentKind, Board, MotionPlanner, PopulationSummary, TurnReport};
use arroyo_world::{WorldGenerator, ELEVATION_LEVELS};
use fastrand::Rng;
use tracing::{info, warn};

use crate::config::EngineConfig;

/// Totals over a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Turns simulated
    pub turns: u32,
    /// Successful moves
    pub moves: usize,
    /// Steps refused by terrain
    pub blocked: usize,
    /// Steps into another agent
    pub bumps: usize,
    /// Strikes landed on the player
    pub attacks: usize,
    /// Fatal strikes
    pub kills: usize,
    /// Dead agents taken off the board
    pub removed: usize,
    /// Player life when the run ended
    pub player_life: i32,
}

impl SessionSummary {
    fn record(&mut self, report: &TurnReport, board: &Board) {
        self.turns += 1;
        self.moves += report.moved;
        self.blocked += report.blocked;
        self.bumps += report.bumps.len();
        self.removed += report.removed;
        let player = board.player().map(Agent::id);
        self.attacks += report
            .strikes
            .iter()
            .filter(|strike| Some(strike.target) == player)
            .count();
        self.kills += report.strikes.iter().filter(|strike| strike.killed).count();
        self.player_life = board.player().map_or(0, Agent::life);
    }
}

/// Generated board plus everything needed to advance it.
#[derive(Debug)]
pub struct Session {
    board: Board,
    planner: MotionPlanner,
    rng: Rng,
    population: PopulationSummary,
    report_interval: u32,
}

impl Session {
    /// Generates, populates and places the player.
    pub fn new(config: &EngineConfig) -> Result<Self> {
        let mut generator =
            WorldGenerator::new(config.generation.clone()).context("invalid generation config")?;
        let mut rng = Rng::with_seed(config.generation.seed);
        let (grid, carve) = generator
            .generate_with_rng(&mut rng)
            .context("board generation failed")?;
        info!(
            rivers = carve.rivers.len(),
            unrouted = carve.unrouted,
            "Board generated"
        );

        let mut board = Board::new(grid);
        let population = board.populate(&mut rng).context("population failed")?;
        board
            .place_player(&mut rng)
            .context("could not place the player")?;

        Ok(Self {
            board,
            planner: MotionPlanner::new(config.motion.clone()),
            rng,
            population,
            report_interval: config.report_interval,
        })
    }

    /// The board.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Agents placed at startup.
    #[must_use]
    pub const fn population(&self) -> PopulationSummary {
        self.population
    }

    /// Advances one turn.
    pub fn step(&mut self) -> Result<TurnReport> {
        self.planner
            .run_turn(&mut self.board, &mut self.rng)
            .context("turn failed")
    }

    /// Runs up to `turns` turns, logging a summary at each report interval.
    ///
    /// The run ends early once the player has no life left.
    pub fn run(&mut self, turns: u32) -> Result<SessionSummary> {
        let mut summary = SessionSummary {
            player_life: self.board.player().map_or(0, Agent::life),
            ..SessionSummary::default()
        };
        for turn in 1..=turns {
            let report = self.step()?;
            summary.record(&report, &self.board);
            if self.report_interval > 0 && turn % self.report_interval == 0 {
                self.log_board(turn);
            }
            if !self.board.player().is_some_and(Agent::is_alive) {
                warn!(turn, "Player killed");
                break;
            }
        }
        self.log_board(summary.turns);
        Ok(summary)
    }

    /// Logs terrain composition and agent positions.
    pub fn log_board(&self, turn: u32) {
        let grid = self.board.grid();
        let histogram = grid.elevation_histogram();
        let total = grid.len().max(1) as f64;
        let shares: Vec<String> = (0..ELEVATION_LEVELS)
            .map(|level| format!("{level}:{:.1}%", histogram[level] as f64 * 100.0 / total))
            .collect();

        info!(
            turn,
            terrain = %shares.join(" "),
            cows = self.board.count(AgentKind::Cow),
            gila_monsters = self.board.count(AgentKind::GilaMonster),
            cacti = self.board.count(AgentKind::Cactus),
            player = ?self.board.player().map(Agent::location),
            life = self.board.player().map_or(0, Agent::life),
            "Board state"
        );
    }
}
