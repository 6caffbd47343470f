//! Board: a grid plus the agents standing on it.
//!
//! The board is the only place agents move, so the one-occupant-per-cell
//! rule is enforced here. Agents are kept in spawn order; IDs are handed out
//! sequentially so a seeded run always produces the same IDs.

use arroyo_common::{AgentId, GridError, Location};
use arroyo_world::{Grid, Occupant};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::agent::{Agent, AgentKind};

/// Chance per mille of a cactus on a habitable cell.
pub const CACTUS_PER_MILLE: u32 = 20;

/// Chance per mille of fauna on a habitable cell without a cactus.
pub const FAUNA_PER_MILLE: u32 = 20;

/// Share per mille of fauna that are cows; the rest are gila monsters.
pub const COW_PER_MILLE: u32 = 900;

/// Life points taken by one strike.
pub const STRIKE_DAMAGE: i32 = 1;

/// Error types for board operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoardError {
    /// Agent not on this board
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),
    /// Cell already holds an agent
    #[error("cell {location} already holds {occupant}")]
    CellTaken {
        /// Requested cell
        location: Location,
        /// Agent already there
        occupant: AgentId,
    },
    /// Step target is not a neighbor of the agent's cell
    #[error("cannot step from {from} to {to}: not adjacent")]
    NotAdjacent {
        /// Agent's cell
        from: Location,
        /// Requested cell
        to: Location,
    },
    /// Cell terrain is impassable
    #[error("cell {0} is impassable")]
    Impassable(Location),
    /// Every cell is impassable or taken
    #[error("no free cell for {0}")]
    NoFreeCell(AgentKind),
    /// A player is already on the board
    #[error("board already has a player: {0}")]
    PlayerExists(AgentId),
    /// Grid access failed
    #[error("grid error: {0}")]
    Grid(#[from] GridError),
}

/// Result type for board operations.
pub type BoardResult<T> = Result<T, BoardError>;

/// What happened when an agent tried to step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Agent changed cells
    Moved,
    /// Target was the agent's own cell
    Stayed,
    /// Target is impassable terrain
    Blocked,
    /// Target holds another agent
    Bumped(AgentId),
}

/// Result of one agent striking another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Strike {
    /// Agent dealing the blow
    pub attacker: AgentId,
    /// Agent receiving it
    pub target: AgentId,
    /// Life points taken
    pub damage: i32,
    /// Target's life after the blow
    pub remaining: i32,
    /// Experience awarded to the attacker
    pub experience: u32,
    /// Whether the blow was fatal
    pub killed: bool,
}

/// Agents placed by [`Board::populate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PopulationSummary {
    /// Cacti placed
    pub cacti: usize,
    /// Cows placed
    pub cows: usize,
    /// Gila monsters placed
    pub gila_monsters: usize,
}

impl PopulationSummary {
    /// Total agents placed.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.cacti + self.cows + self.gila_monsters
    }
}

/// A grid and the agents on it.
#[derive(Debug, Clone)]
pub struct Board {
    grid: Grid,
    agents: Vec<Agent>,
    next_id: AgentId,
    player: Option<AgentId>,
}

impl Board {
    /// Creates an empty board over `grid`.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            agents: Vec::new(),
            next_id: AgentId::from_raw(1),
            player: None,
        }
    }

    /// The terrain grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable grid access for renderers clearing fresh flags.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// All agents in spawn order.
    #[must_use]
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Number of agents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns true if there are no agents.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// IDs of every agent in spawn order.
    #[must_use]
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.iter().map(Agent::id).collect()
    }

    fn position(&self, id: AgentId) -> BoardResult<usize> {
        self.agents
            .binary_search_by_key(&id, Agent::id)
            .map_err(|_| BoardError::AgentNotFound(id))
    }

    /// Looks up an agent.
    #[must_use]
    pub fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.position(id).ok().map(|i| &self.agents[i])
    }

    /// Looks up an agent mutably.
    pub fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.position(id).ok().map(|i| &mut self.agents[i])
    }

    /// The tracked target, if placed.
    #[must_use]
    pub fn player(&self) -> Option<&Agent> {
        self.player.and_then(|id| self.agent(id))
    }

    /// Counts agents of a kind.
    #[must_use]
    pub fn count(&self, kind: AgentKind) -> usize {
        self.agents.iter().filter(|a| a.kind() == kind).count()
    }

    /// Places a new agent on `location`.
    pub fn spawn(&mut self, kind: AgentKind, location: Location) -> BoardResult<AgentId> {
        let cell = self.grid.cell(location)?;
        if let Some(occupant) = cell.occupant() {
            return Err(BoardError::CellTaken {
                location,
                occupant: occupant.id,
            });
        }
        if cell.is_occupied() {
            return Err(BoardError::Impassable(location));
        }
        if kind == AgentKind::Player {
            if let Some(existing) = self.player {
                return Err(BoardError::PlayerExists(existing));
            }
        }

        let id = self.next_id;
        self.next_id = id.next();
        let occupant = if kind.is_solid() {
            Occupant::solid(id)
        } else {
            Occupant::passable(id)
        };
        self.grid.set_occupant(location, Some(occupant))?;
        self.agents.push(Agent::new(id, kind, location));
        if kind == AgentKind::Player {
            self.player = Some(id);
        }
        Ok(id)
    }

    /// Moves an agent onto `to`, updating both cells together.
    ///
    /// `to` must be the agent's own cell or one of its eight neighbors. A
    /// cell holding another agent is never entered; the caller gets
    /// [`StepOutcome::Bumped`] instead.
    pub fn move_agent(&mut self, id: AgentId, to: Location) -> BoardResult<StepOutcome> {
        let index = self.position(id)?;
        let from = self.agents[index].location();
        if from == to {
            return Ok(StepOutcome::Stayed);
        }
        if !from.is_adjacent(to) {
            return Err(BoardError::NotAdjacent { from, to });
        }

        let target = self.grid.cell(to)?;
        if let Some(occupant) = target.occupant() {
            return Ok(StepOutcome::Bumped(occupant.id));
        }
        if target.is_occupied() {
            return Ok(StepOutcome::Blocked);
        }

        let occupant = self.grid.set_occupant(from, None)?;
        self.grid.set_occupant(to, occupant)?;
        self.agents[index].set_location(to);
        Ok(StepOutcome::Moved)
    }

    /// Removes an agent and clears its cell.
    pub fn remove_agent(&mut self, id: AgentId) -> BoardResult<Agent> {
        let index = self.position(id)?;
        let agent = self.agents.remove(index);
        self.grid.set_occupant(agent.location(), None)?;
        if self.player == Some(id) {
            self.player = None;
        }
        debug!(agent = %id, kind = %agent.kind(), at = %agent.location(), "Removed agent");
        Ok(agent)
    }

    /// Lets `attacker` deal `damage` to `target`.
    ///
    /// A fatal blow credits the attacker with a kill and the target's
    /// experience. A dead non-player target is removed from the board at
    /// once; a dead player stays so the caller can end the session.
    pub fn strike(
        &mut self,
        attacker: AgentId,
        target: AgentId,
        damage: i32,
    ) -> BoardResult<Strike> {
        self.position(attacker)?;
        let index = self.position(target)?;
        let victim = &mut self.agents[index];
        let was_alive = victim.is_alive();
        let experience = victim.take_damage(damage);
        let remaining = victim.life();
        let killed = was_alive && !victim.is_alive();
        let is_player = victim.is_player();

        if killed {
            if let Some(agent) = self.agent_mut(attacker) {
                agent.record_kill(experience);
            }
            info!(attacker = %attacker, target = %target, experience, "Agent killed");
            if !is_player {
                self.remove_agent(target)?;
            }
        } else {
            debug!(attacker = %attacker, target = %target, remaining, "Agent struck");
        }

        Ok(Strike {
            attacker,
            target,
            damage,
            remaining,
            experience,
            killed,
        })
    }

    /// Removes every non-player agent with no life left.
    ///
    /// Returns the removed agents in spawn order.
    pub fn remove_dead(&mut self) -> BoardResult<Vec<Agent>> {
        let dead: Vec<AgentId> = self
            .agents
            .iter()
            .filter(|a| !a.is_alive() && !a.is_player())
            .map(Agent::id)
            .collect();
        dead.into_iter().map(|id| self.remove_agent(id)).collect()
    }

    /// Scatters flora and fauna over the mid-elevation cells.
    ///
    /// Each empty cell at level 2 or 3 gets a cactus with 2% probability,
    /// otherwise fauna with 2% probability: nine cows for every gila monster.
    pub fn populate(&mut self, rng: &mut Rng) -> BoardResult<PopulationSummary> {
        let mut summary = PopulationSummary::default();
        for index in 0..self.grid.len() {
            let cell = self.grid.cell_at(index);
            if !matches!(cell.elevation(), 2 | 3) || cell.has_occupant() {
                continue;
            }
            let kind = if rng.u32(0..1000) < CACTUS_PER_MILLE {
                AgentKind::Cactus
            } else if rng.u32(0..1000) < FAUNA_PER_MILLE {
                if rng.u32(0..1000) < COW_PER_MILLE {
                    AgentKind::Cow
                } else {
                    AgentKind::GilaMonster
                }
            } else {
                continue;
            };

            self.spawn(kind, self.grid.location_of(index))?;
            match kind {
                AgentKind::Cactus => summary.cacti += 1,
                AgentKind::Cow => summary.cows += 1,
                AgentKind::GilaMonster => summary.gila_monsters += 1,
                AgentKind::Player => {}
            }
        }

        info!(
            cacti = summary.cacti,
            cows = summary.cows,
            gila_monsters = summary.gila_monsters,
            "Populated board"
        );
        Ok(summary)
    }

    /// Places the player on a uniformly random unoccupied cell.
    pub fn place_player(&mut self, rng: &mut Rng) -> BoardResult<AgentId> {
        if let Some(existing) = self.player {
            return Err(BoardError::PlayerExists(existing));
        }
        let free: Vec<usize> = (0..self.grid.len())
            .filter(|&i| {
                let cell = self.grid.cell_at(i);
                !cell.is_occupied() && !cell.has_occupant()
            })
            .collect();
        if free.is_empty() {
            return Err(BoardError::NoFreeCell(AgentKind::Player));
        }

        let location = self.grid.location_of(free[rng.usize(0..free.len())]);
        let id = self.spawn(AgentKind::Player, location)?;
        info!(player = %id, at = %location, "Placed player");
        Ok(id)
    }
}
