//! # Arroyo Gameplay
//!
//! Agents for Arroyo boards.
//!
//! This crate provides:
//! - Agent kinds and their behavior profiles
//! - The board: occupancy, atomic moves, population
//! - The turn-based motion planner (chase and wander)

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod board;
pub mod motion;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::board::*;
    pub use crate::motion::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use arroyo_world::{GenerationConfig, WorldGenerator};
    use fastrand::Rng;

    #[test]
    fn test_generated_board_session() {
        let config = GenerationConfig::with_seed(77);
        let mut generator = WorldGenerator::new(config).expect("config");
        let mut board = Board::new(generator.generate().expect("generate"));

        let mut rng = Rng::with_seed(77);
        let summary = board.populate(&mut rng).expect("populate");
        let player = board.place_player(&mut rng).expect("player");
        assert_eq!(board.len(), summary.total() + 1);

        let mut planner = MotionPlanner::default();
        for _ in 0..25 {
            planner.run_turn(&mut board, &mut rng).expect("turn");
        }
        assert_eq!(board.player().map(Agent::id), Some(player));
        assert!(board.player().is_some_and(Agent::is_alive));
        assert_eq!(board.count(AgentKind::Cactus), summary.cacti);
    }

    #[test]
    fn test_seeded_sessions_replay() {
        let run = || {
            let mut generator = WorldGenerator::with_seed(5).expect("config");
            let mut board = Board::new(generator.generate().expect("generate"));
            let mut rng = Rng::with_seed(5);
            board.populate(&mut rng).expect("populate");
            board.place_player(&mut rng).expect("player");
            let mut planner = MotionPlanner::default();
            for _ in 0..10 {
                planner.run_turn(&mut board, &mut rng).expect("turn");
            }
            board.agents().to_vec()
        };
        assert_eq!(run(), run());
    }
}
