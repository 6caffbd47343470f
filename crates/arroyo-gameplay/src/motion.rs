//! Turn-by-turn agent motion.
//!
//! Each turn an active, mobile agent rolls against its move probability.
//! Hostile agents re-plan toward the player on every successful roll; any
//! agent left without a route wanders toward a random cell. The agent then
//! takes exactly one step off the tail of its route. A hostile agent that
//! steps into another agent strikes it instead of moving.

use arroyo_common::{AgentId, Location};
use arroyo_world::{Grid, PathFinder};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::agent::{Activity, Agent};
use crate::board::{Board, BoardError, BoardResult, StepOutcome, Strike, STRIKE_DAMAGE};

/// Motion planner configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    /// Activation radius as a fraction of the grid's row count
    pub activation_fraction: f64,
    /// Random destinations tried when wandering
    pub wander_attempts: u32,
    /// Terrain weight multiplier for agent routes
    pub weight: f64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            activation_fraction: 0.5,
            wander_attempts: 3,
            weight: 1.0,
        }
    }
}

impl MotionConfig {
    /// Distance from the player inside which agents are active.
    #[must_use]
    pub fn activation_radius(&self, grid: &Grid) -> f64 {
        grid.rows() as f64 * self.activation_fraction
    }
}

/// Tally of one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnReport {
    /// Agents that changed cells
    pub moved: usize,
    /// Agents whose step was their own cell
    pub stayed: usize,
    /// Steps refused by terrain
    pub blocked: usize,
    /// Steps into another agent, as (mover, occupant)
    pub bumps: Vec<(AgentId, AgentId)>,
    /// Agents that did not step
    pub idle: usize,
    /// Agents active after the activity refresh
    pub active: usize,
    /// Blows dealt by hostile agents
    pub strikes: Vec<Strike>,
    /// Dead agents taken off the board
    pub removed: usize,
}

/// One agent's step and any strike it dealt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Action {
    /// Result of the step
    pub outcome: StepOutcome,
    /// Blow dealt when a hostile agent bumped another
    pub strike: Option<Strike>,
}

/// Plans and applies agent motion.
#[derive(Debug, Clone, Default)]
pub struct MotionPlanner {
    config: MotionConfig,
    finder: PathFinder,
}

impl MotionPlanner {
    /// Creates a planner.
    #[must_use]
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            finder: PathFinder::new(),
        }
    }

    /// Planner configuration.
    #[must_use]
    pub const fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Activates mobile agents near the player and deactivates the rest.
    ///
    /// Immobile agents are never toggled. Without a player nothing changes.
    /// Returns the number of active agents.
    pub fn update_activity(&self, board: &mut Board) -> usize {
        let Some(target) = board.player().map(Agent::location) else {
            return board.agents().iter().filter(|a| a.is_active()).count();
        };
        let radius = self.config.activation_radius(board.grid());

        let mut active = 0;
        for id in board.agent_ids() {
            let Some(agent) = board.agent_mut(id) else {
                continue;
            };
            if agent.is_mobile() && !agent.is_player() {
                let near = agent.location().euclidean_distance(target) < radius;
                agent.set_activity(if near {
                    Activity::Active
                } else {
                    Activity::Inactive
                });
            }
            if agent.is_active() {
                active += 1;
            }
        }
        active
    }

    /// Lets one agent act.
    ///
    /// Any step that does not land drops the whole route. Returns `None` if
    /// the agent did not attempt a step this turn.
    pub fn act(
        &mut self,
        board: &mut Board,
        id: AgentId,
        rng: &mut Rng,
    ) -> BoardResult<Option<Action>> {
        let agent = board.agent(id).ok_or(BoardError::AgentNotFound(id))?;
        if !agent.is_active() || !agent.is_mobile() {
            return Ok(None);
        }
        if f64::from(rng.u32(0..1000)) >= agent.move_probability() * 1000.0 {
            return Ok(None);
        }

        let from = agent.location();
        let hostile = agent.is_hostile();
        let mut route = agent.route().to_vec();

        if hostile {
            route = match board.player().map(Agent::location) {
                Some(target) => {
                    self.finder
                        .find_path(from, target, board.grid(), self.config.weight)
                }
                None => Vec::new(),
            };
        }
        if route.is_empty() {
            route = self.wander(from, board.grid(), rng);
        }

        let Some(next) = route.last().copied() else {
            trace!(agent = %id, at = %from, "No route");
            if let Some(agent) = board.agent_mut(id) {
                agent.clear_route();
            }
            return Ok(None);
        };

        let outcome = board.move_agent(id, next)?;
        let mut strike = None;
        match outcome {
            StepOutcome::Moved | StepOutcome::Stayed => {
                route.pop();
            }
            StepOutcome::Blocked => route.clear(),
            StepOutcome::Bumped(target) => {
                route.clear();
                if hostile {
                    strike = Some(board.strike(id, target, STRIKE_DAMAGE)?);
                }
            }
        }
        trace!(agent = %id, from = %from, to = %next, ?outcome, "Agent stepped");

        if let Some(agent) = board.agent_mut(id) {
            agent.set_route(route);
        }
        Ok(Some(Action { outcome, strike }))
    }

    /// Route toward a random cell, trying up to `wander_attempts`
    /// destinations.
    fn wander(&mut self, from: Location, grid: &Grid, rng: &mut Rng) -> Vec<Location> {
        for _ in 0..self.config.wander_attempts {
            let destination = Location::new(
                rng.i32(0..grid.cols() as i32),
                rng.i32(0..grid.rows() as i32),
            );
            let route = self
                .finder
                .find_path(from, destination, grid, self.config.weight);
            if !route.is_empty() {
                return route;
            }
        }
        Vec::new()
    }

    /// Clears dead agents, refreshes activity and lets every non-player
    /// agent act once, in spawn order.
    pub fn run_turn(&mut self, board: &mut Board, rng: &mut Rng) -> BoardResult<TurnReport> {
        let removed = board.remove_dead()?.len();
        let mut report = TurnReport {
            active: self.update_activity(board),
            removed,
            ..TurnReport::default()
        };

        for id in board.agent_ids() {
            if board.agent(id).map_or(true, Agent::is_player) {
                continue;
            }
            let Some(action) = self.act(board, id, rng)? else {
                report.idle += 1;
                continue;
            };
            match action.outcome {
                StepOutcome::Moved => report.moved += 1,
                StepOutcome::Stayed => report.stayed += 1,
                StepOutcome::Blocked => report.blocked += 1,
                StepOutcome::Bumped(other) => report.bumps.push((id, other)),
            }
            if let Some(strike) = action.strike {
                if strike.killed && board.agent(strike.target).is_none() {
                    report.removed += 1;
                }
                report.strikes.push(strike);
            }
        }

        debug!(
            active = report.active,
            moved = report.moved,
            blocked = report.blocked,
            bumps = report.bumps.len(),
            idle = report.idle,
            strikes = report.strikes.len(),
            removed = report.removed,
            "Turn complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentKind;
    use arroyo_world::MAX_ELEVATION;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn flat(rows: usize, cols: usize) -> Board {
        let mut grid = Grid::new(rows, cols).expect("grid");
        grid.fill(2).expect("fill");
        Board::new(grid)
    }

    fn eager(board: &mut Board, id: AgentId) {
        if let Some(agent) = board.agent_mut(id) {
            *agent = agent.clone().with_move_probability(1.0);
        }
    }

    #[test]
    fn test_activation_by_distance() {
        let mut board = flat(10, 40);
        board.spawn(AgentKind::Player, Location::new(0, 0)).expect("player");
        let near = board.spawn(AgentKind::Cow, Location::new(3, 0)).expect("cow");
        let far = board.spawn(AgentKind::Cow, Location::new(30, 0)).expect("cow");
        let cactus = board.spawn(AgentKind::Cactus, Location::new(1, 1)).expect("cactus");

        let planner = MotionPlanner::default();
        assert_eq!(planner.update_activity(&mut board), 1);
        assert_eq!(board.agent(near).map(Agent::activity), Some(Activity::Active));
        assert_eq!(board.agent(far).map(Agent::activity), Some(Activity::Inactive));
        assert_eq!(board.agent(cactus).map(Agent::activity), Some(Activity::Inactive));
    }

    #[test]
    fn test_inactive_agents_never_act() {
        let mut board = flat(8, 8);
        let cow = board.spawn(AgentKind::Cow, Location::new(3, 3)).expect("cow");
        eager(&mut board, cow);
        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(1);
        for _ in 0..20 {
            assert_eq!(planner.act(&mut board, cow, &mut rng), Ok(None));
        }
        assert_eq!(board.agent(cow).map(Agent::location), Some(Location::new(3, 3)));
    }

    #[test]
    fn test_hostile_closes_in_and_bumps_player() {
        let mut board = flat(12, 12);
        let player = board.spawn(AgentKind::Player, Location::new(2, 2)).expect("player");
        let gila = board
            .spawn(AgentKind::GilaMonster, Location::new(7, 2))
            .expect("gila");
        eager(&mut board, gila);

        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(4);
        let mut bumped = false;
        for _ in 0..10 {
            let report = planner.run_turn(&mut board, &mut rng).expect("turn");
            if report.bumps.contains(&(gila, player)) {
                bumped = true;
                break;
            }
        }
        assert!(bumped);
        let at = board.agent(gila).map(Agent::location).expect("gila");
        assert!(at.is_adjacent(Location::new(2, 2)));
        assert_eq!(board.player().map(Agent::location), Some(Location::new(2, 2)));
        assert_eq!(board.player().map(Agent::life), Some(99));
    }

    #[test]
    fn test_hostile_strike_kills_weak_player() {
        let mut board = flat(8, 8);
        let player = board.spawn(AgentKind::Player, Location::new(2, 2)).expect("player");
        let gila = board
            .spawn(AgentKind::GilaMonster, Location::new(3, 2))
            .expect("gila");
        eager(&mut board, gila);
        if let Some(agent) = board.agent_mut(player) {
            *agent = agent.clone().with_life(1);
        }

        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(2);
        let report = planner.run_turn(&mut board, &mut rng).expect("turn");
        assert_eq!(report.bumps, vec![(gila, player)]);
        assert_eq!(report.strikes.len(), 1);
        assert!(report.strikes[0].killed);
        assert_eq!(report.removed, 0);
        assert!(board.player().is_some_and(|p| !p.is_alive()));
        assert_eq!(board.agent(gila).map(Agent::kills), Some(1));
        assert_eq!(board.agent(gila).map(Agent::location), Some(Location::new(3, 2)));
    }

    #[test]
    fn test_cow_bump_deals_no_damage_and_drops_route() {
        let mut board = flat(10, 10);
        board.spawn(AgentKind::Player, Location::new(0, 3)).expect("player");
        let cow = board.spawn(AgentKind::Cow, Location::new(0, 0)).expect("cow");
        let cactus = board.spawn(AgentKind::Cactus, Location::new(1, 0)).expect("cactus");
        eager(&mut board, cow);
        if let Some(agent) = board.agent_mut(cow) {
            agent.set_route(vec![Location::new(3, 0), Location::new(2, 0), Location::new(1, 0)]);
        }

        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(6);
        let first = planner.run_turn(&mut board, &mut rng).expect("turn");
        assert_eq!(first.bumps, vec![(cow, cactus)]);
        assert!(first.strikes.is_empty());
        assert!(board.agent(cow).is_some_and(|a| a.route().is_empty()));
        assert_eq!(board.agent(cactus).map(Agent::life), Some(1));

        let mut last = Location::new(0, 0);
        for _ in 0..5 {
            planner.run_turn(&mut board, &mut rng).expect("turn");
            let now = board.agent(cow).map(Agent::location).expect("cow");
            assert!(now == last || now.is_adjacent(last));
            last = now;
        }
    }

    #[test]
    fn test_turn_sweeps_dead_agents() {
        let mut board = flat(8, 8);
        board.spawn(AgentKind::Player, Location::new(0, 0)).expect("player");
        let cow = board.spawn(AgentKind::Cow, Location::new(4, 4)).expect("cow");
        if let Some(agent) = board.agent_mut(cow) {
            agent.take_damage(1);
        }

        let mut planner = MotionPlanner::default();
        let report = planner
            .run_turn(&mut board, &mut Rng::with_seed(1))
            .expect("turn");
        assert_eq!(report.removed, 1);
        assert!(board.agent(cow).is_none());
        assert!(!board.grid()[Location::new(4, 4)].has_occupant());
    }

    #[test]
    fn test_wanderer_moves_one_step_per_turn() {
        let mut board = flat(16, 16);
        board.spawn(AgentKind::Player, Location::new(0, 0)).expect("player");
        let cow = board.spawn(AgentKind::Cow, Location::new(5, 5)).expect("cow");
        eager(&mut board, cow);

        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(9);
        let mut last = Location::new(5, 5);
        for _ in 0..15 {
            planner.run_turn(&mut board, &mut rng).expect("turn");
            let now = board.agent(cow).map(Agent::location).expect("cow");
            assert!(now == last || now.is_adjacent(last));
            last = now;
        }
    }

    #[test]
    fn test_blocked_step_discards_route() {
        let mut board = flat(6, 6);
        board.spawn(AgentKind::Player, Location::new(0, 0)).expect("player");
        let cow = board.spawn(AgentKind::Cow, Location::new(2, 2)).expect("cow");
        eager(&mut board, cow);
        board
            .grid_mut()
            .set_elevation(Location::new(3, 2), MAX_ELEVATION)
            .expect("set");
        if let Some(agent) = board.agent_mut(cow) {
            agent.set_route(vec![Location::new(4, 2), Location::new(3, 2)]);
        }

        let mut planner = MotionPlanner::default();
        planner.update_activity(&mut board);
        let mut rng = Rng::with_seed(0);
        let action = planner.act(&mut board, cow, &mut rng).expect("act");
        assert_eq!(action.map(|a| a.outcome), Some(StepOutcome::Blocked));
        assert!(board.agent(cow).is_some_and(|a| a.route().is_empty()));
    }

    #[test]
    fn test_stranded_agent_stays_put() {
        let mut board = flat(8, 8);
        board.spawn(AgentKind::Player, Location::new(0, 3)).expect("player");
        let cow = board.spawn(AgentKind::Cow, Location::new(3, 3)).expect("cow");
        eager(&mut board, cow);
        for dir in arroyo_common::Direction::NEIGHBORS {
            board
                .grid_mut()
                .set_elevation(Location::new(3, 3).step(dir), MAX_ELEVATION)
                .expect("set");
        }

        let mut planner = MotionPlanner::default();
        let mut rng = Rng::with_seed(3);
        for _ in 0..10 {
            let report = planner.run_turn(&mut board, &mut rng).expect("turn");
            assert_eq!(report.active, 1);
            assert_eq!(report.moved, 0);
        }
        assert_eq!(board.agent(cow).map(Agent::location), Some(Location::new(3, 3)));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_one_agent_per_cell(seed in any::<u64>()) {
            let mut board = flat(20, 20);
            let mut rng = Rng::with_seed(seed);
            board.place_player(&mut rng).expect("player");
            for _ in 0..12 {
                let loc = Location::new(rng.i32(0..20), rng.i32(0..20));
                let kind = if rng.bool() { AgentKind::Cow } else { AgentKind::GilaMonster };
                let _ = board.spawn(kind, loc);
            }

            let mut planner = MotionPlanner::default();
            for _ in 0..10 {
                planner.run_turn(&mut board, &mut rng).expect("turn");
                let cells: HashSet<Location> =
                    board.agents().iter().map(Agent::location).collect();
                prop_assert_eq!(cells.len(), board.len());
                for agent in board.agents() {
                    let occupant = board.grid().occupant(agent.location()).expect("cell");
                    prop_assert_eq!(occupant.map(|o| o.id), Some(agent.id()));
                }
            }
        }
    }
}
