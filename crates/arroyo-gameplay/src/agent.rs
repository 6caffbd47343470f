//! Agents: the player, flora and fauna on a board.

use arroyo_common::{AgentId, Location};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Movement probabilities at or below this are treated as immobile.
pub const MOBILITY_EPSILON: f64 = 1e-6;

/// Kind of agent determining its default behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentKind {
    /// The tracked target
    Player,
    /// Static flora
    Cactus,
    /// Wanders the valley
    Cow,
    /// Chases the player
    GilaMonster,
}

impl AgentKind {
    /// Returns whether this kind chases the player.
    #[must_use]
    pub const fn is_hostile(self) -> bool {
        matches!(self, Self::GilaMonster)
    }

    /// Chance per turn that the agent acts.
    #[must_use]
    pub const fn move_probability(self) -> f64 {
        match self {
            Self::Player | Self::Cactus => 0.0,
            Self::Cow => 0.9,
            Self::GilaMonster => 0.7,
        }
    }

    /// Starting life points.
    #[must_use]
    pub const fn life_points(self) -> i32 {
        match self {
            Self::Player => 100,
            Self::Cactus | Self::Cow | Self::GilaMonster => 1,
        }
    }

    /// Experience carried at spawn and handed to whoever kills the agent.
    #[must_use]
    pub const fn experience(self) -> u32 {
        match self {
            Self::Player => 0,
            Self::Cactus | Self::Cow | Self::GilaMonster => 5,
        }
    }

    /// Returns whether other agents are kept off this agent's cell by path
    /// searches. The player is not, so hostile agents can route onto it.
    #[must_use]
    pub const fn is_solid(self) -> bool {
        !matches!(self, Self::Player)
    }

    /// Map glyph.
    #[must_use]
    pub const fn glyph(self) -> char {
        match self {
            Self::Player => '@',
            Self::Cactus => 'c',
            Self::Cow => 'w',
            Self::GilaMonster => 'g',
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Player => "player",
            Self::Cactus => "cactus",
            Self::Cow => "cow",
            Self::GilaMonster => "gila monster",
        };
        f.write_str(name)
    }
}

/// Whether an agent takes turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Activity {
    /// Skipped every turn
    #[default]
    Inactive,
    /// Considered every turn
    Active,
}

/// One agent on a board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Handle
    id: AgentId,
    /// Kind
    kind: AgentKind,
    /// Current cell
    location: Location,
    /// Queued steps, destination first
    route: Vec<Location>,
    /// Turn participation
    activity: Activity,
    /// Chance per turn of acting
    move_probability: f64,
    /// Chases the player
    hostile: bool,
    /// Remaining life points; dead at zero or below
    life: i32,
    /// Experience gathered
    experience: u32,
    /// Agents this one has killed
    kills: u32,
}

impl Agent {
    /// Creates an inactive agent with its kind's defaults.
    #[must_use]
    pub fn new(id: AgentId, kind: AgentKind, location: Location) -> Self {
        Self {
            id,
            kind,
            location,
            route: Vec::new(),
            activity: Activity::Inactive,
            move_probability: kind.move_probability(),
            hostile: kind.is_hostile(),
            life: kind.life_points(),
            experience: kind.experience(),
            kills: 0,
        }
    }

    /// Overrides life points.
    #[must_use]
    pub const fn with_life(mut self, life: i32) -> Self {
        self.life = life;
        self
    }

    /// Overrides the move probability, clamped to `[0, 1]`.
    #[must_use]
    pub fn with_move_probability(mut self, probability: f64) -> Self {
        self.move_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Overrides hostility.
    #[must_use]
    pub const fn with_hostile(mut self, hostile: bool) -> Self {
        self.hostile = hostile;
        self
    }

    /// Agent handle.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Agent kind.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Current location.
    #[must_use]
    pub const fn location(&self) -> Location {
        self.location
    }

    pub(crate) fn set_location(&mut self, location: Location) {
        self.location = location;
    }

    /// Chance per turn of acting.
    #[must_use]
    pub const fn move_probability(&self) -> f64 {
        self.move_probability
    }

    /// Returns whether the agent chases the player.
    #[must_use]
    pub const fn is_hostile(&self) -> bool {
        self.hostile
    }

    /// Returns whether the agent ever moves.
    #[must_use]
    pub fn is_mobile(&self) -> bool {
        self.move_probability > MOBILITY_EPSILON
    }

    /// Returns whether the agent is the tracked target.
    #[must_use]
    pub const fn is_player(&self) -> bool {
        matches!(self.kind, AgentKind::Player)
    }

    /// Remaining life points.
    #[must_use]
    pub const fn life(&self) -> i32 {
        self.life
    }

    /// Returns whether the agent has life left.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.life > 0
    }

    /// Experience gathered.
    #[must_use]
    pub const fn experience(&self) -> u32 {
        self.experience
    }

    /// Agents killed.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Applies damage.
    ///
    /// Returns the experience yielded by the blow that kills the agent, and
    /// zero for any other hit, including hits on an already dead agent.
    pub fn take_damage(&mut self, damage: i32) -> u32 {
        if !self.is_alive() {
            return 0;
        }
        self.life = self.life.saturating_sub(damage);
        if self.is_alive() {
            0
        } else {
            self.experience
        }
    }

    pub(crate) fn record_kill(&mut self, experience: u32) {
        self.kills += 1;
        self.experience = self.experience.saturating_add(experience);
    }

    /// Turn participation.
    #[must_use]
    pub const fn activity(&self) -> Activity {
        self.activity
    }

    /// Returns whether the agent takes turns.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self.activity, Activity::Active)
    }

    /// Sets turn participation.
    pub fn set_activity(&mut self, activity: Activity) {
        self.activity = activity;
    }

    /// Queued steps, destination first.
    #[must_use]
    pub fn route(&self) -> &[Location] {
        &self.route
    }

    /// Replaces the queued route.
    pub fn set_route(&mut self, route: Vec<Location>) {
        self.route = route;
    }

    /// Drops the queued route.
    pub fn clear_route(&mut self) {
        self.route.clear();
    }

    /// The next step to take.
    #[must_use]
    pub fn next_step(&self) -> Option<Location> {
        self.route.last().copied()
    }

    /// Consumes the next step.
    pub fn advance_route(&mut self) -> Option<Location> {
        self.route.pop()
    }
}
