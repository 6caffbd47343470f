//! River carving.
//!
//! Rivers enter from distinct board edges and drain into the basin at the
//! center. Each channel follows the cheapest terrain-weighted route from the
//! basin to its mouth, then every cell along it is stamped with a square
//! window of shallow water (level 0) or wash (level 1). Mesa cells are never
//! lowered.

use arroyo_common::{ConfigError, Direction, Location};
use fastrand::Rng;
use tracing::{debug, warn};

use crate::config::RiverConfig;
use crate::grid::{Grid, MAX_ELEVATION};
use crate::pathfinding::PathFinder;

/// A river's entry point on the board edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct River {
    border: Direction,
    mouth: Location,
}

impl River {
    /// Places a mouth uniformly along `border`.
    ///
    /// `border` must be one of [`Direction::CARDINALS`]; anything else puts
    /// the mouth at the grid center.
    #[must_use]
    pub fn random(border: Direction, grid: &Grid, rng: &mut Rng) -> Self {
        let rows = grid.rows() as i32;
        let cols = grid.cols() as i32;
        let mouth = match border {
            Direction::North => Location::new(rng.i32(0..cols), 0),
            Direction::South => Location::new(rng.i32(0..cols), rows - 1),
            Direction::East => Location::new(cols - 1, rng.i32(0..rows)),
            Direction::West => Location::new(0, rng.i32(0..rows)),
            _ => grid.center(),
        };
        Self { border, mouth }
    }

    /// Edge the river enters from.
    #[must_use]
    pub const fn border(&self) -> Direction {
        self.border
    }

    /// Entry location on the edge.
    #[must_use]
    pub const fn mouth(&self) -> Location {
        self.mouth
    }
}

/// Result of one carving pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarveSummary {
    /// Rivers placed, in placement order
    pub rivers: Vec<River>,
    /// Rivers whose route search failed
    pub unrouted: usize,
    /// Channel centers stamped
    pub stamps: usize,
    /// Cells reset to a low level
    pub cells_lowered: usize,
}

/// Routes and carves rivers into a synthesized grid.
#[derive(Debug, Clone)]
pub struct HydrologyCarver {
    params: RiverConfig,
    finder: PathFinder,
}

impl HydrologyCarver {
    /// Creates a carver.
    pub fn new(params: RiverConfig) -> Result<Self, ConfigError> {
        params.validate()?;
        Ok(Self {
            params,
            finder: PathFinder::new(),
        })
    }

    /// River parameters.
    #[must_use]
    pub const fn params(&self) -> &RiverConfig {
        &self.params
    }

    /// Draws river borders without replacement and places their mouths.
    ///
    /// At most four rivers are produced.
    pub fn pick_sources(&self, grid: &Grid, rng: &mut Rng) -> Vec<River> {
        let mut available = Direction::CARDINALS.to_vec();
        let mut rivers = Vec::with_capacity(self.params.count.min(available.len()));
        for _ in 0..self.params.count {
            rng.shuffle(&mut available);
            let Some(border) = available.pop() else {
                break;
            };
            rivers.push(River::random(border, grid, rng));
        }
        rivers
    }

    /// Builds the carve queue: the basin, then each river's route followed
    /// by its mouth.
    ///
    /// Returns the queue and the number of rivers that could not be routed.
    pub fn plan_channels(&mut self, grid: &Grid, rivers: &[River]) -> (Vec<Location>, usize) {
        let basin = grid.center();
        let mut queue = vec![basin];
        let mut unrouted = 0;

        for river in rivers {
            match self
                .finder
                .find_route(basin, river.mouth, grid, self.params.weight)
            {
                Some(route) => {
                    debug!(
                        border = ?river.border,
                        mouth = %river.mouth,
                        steps = route.len(),
                        cost = route.cost(),
                        "Routed river"
                    );
                    queue.extend_from_slice(route.steps());
                    queue.push(river.mouth);
                }
                None => {
                    warn!(
                        border = ?river.border,
                        mouth = %river.mouth,
                        "No route from basin to river mouth, skipping"
                    );
                    unrouted += 1;
                }
            }
        }
        (queue, unrouted)
    }

    /// Carves rivers into `grid`.
    pub fn carve(&mut self, grid: &mut Grid, rng: &mut Rng) -> CarveSummary {
        let rivers = self.pick_sources(grid, rng);
        let (mut queue, unrouted) = self.plan_channels(grid, &rivers);

        let mut summary = CarveSummary {
            rivers,
            unrouted,
            ..CarveSummary::default()
        };
        while let Some(center) = queue.pop() {
            let width = rng.u32(self.params.width..self.params.width * 2);
            summary.cells_lowered += Self::carve_window(grid, center, width, rng);
            summary.stamps += 1;
        }

        debug!(
            rivers = summary.rivers.len(),
            unrouted = summary.unrouted,
            stamps = summary.stamps,
            lowered = summary.cells_lowered,
            "Carved rivers"
        );
        summary
    }

    /// Resets every non-mesa cell in the `width x width` window around
    /// `center` to level 0 or 1. Window coordinates clamp to the grid, so
    /// edge cells may be visited more than once.
    ///
    /// Returns the number of cells written.
    pub fn carve_window(grid: &mut Grid, center: Location, width: u32, rng: &mut Rng) -> usize {
        let width = width as i32;
        let start = -(width / 2);
        let mut lowered = 0;

        for dy in start..start + width {
            for dx in start..start + width {
                let loc = grid.clamp(Location::new(center.x + dx, center.y + dy));
                let Ok(level) = grid.elevation(loc) else {
                    continue;
                };
                if level < MAX_ELEVATION && grid.set_elevation(loc, rng.u8(0..=1)).is_ok() {
                    lowered += 1;
                }
            }
        }
        lowered
    }
}
