//! Terrain-weighted shortest paths over the 8-connected grid.
//!
//! Uniform-cost search: orthogonal steps cost 1.0 and diagonal steps 1.4,
//! each scaled by `weight ^ max(elevation - 1, 0)` of the cell being
//! entered. Levels 0 and 1 are free of penalty and every level above
//! compounds the multiplier, which is what pushes rivers into low ground and
//! agents onto flat terrain.
//!
//! Occupied cells are skipped unless their multiplier exceeds 1, so weighted
//! searches (river routing) may cross mesas and deep water at a price while
//! unweighted agent searches treat them as walls.
//!
//! Routes are returned destination-first with the origin left out, so a
//! mover pops from the back to take its next step.

use arroyo_common::{Direction, Location};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use tracing::trace;

use crate::grid::Grid;

/// Hard cap on node expansions per search.
pub const MAX_EXPANSIONS: usize = 1_000_000;

/// Cost of an orthogonal step.
pub const ORTHOGONAL_COST: f64 = 1.0;

/// Cost of a diagonal step (approximates sqrt 2).
pub const DIAGONAL_COST: f64 = 1.4;

/// Penalty for entering a cell at `elevation`.
#[must_use]
pub fn terrain_multiplier(elevation: u8, weight: f64) -> f64 {
    weight.powi(i32::from(elevation.saturating_sub(1)))
}

/// Cost of one step in `dir` onto a cell at `elevation`.
#[must_use]
pub fn step_cost(dir: Direction, elevation: u8, weight: f64) -> f64 {
    let base = if dir.is_diagonal() {
        DIAGONAL_COST
    } else {
        ORTHOGONAL_COST
    };
    base * terrain_multiplier(elevation, weight)
}

/// Total cost of walking `steps` (destination-first) starting at `origin`.
///
/// Returns `None` if a step is not adjacent to the previous one or leaves
/// the grid.
#[must_use]
pub fn route_cost(origin: Location, steps: &[Location], grid: &Grid, weight: f64) -> Option<f64> {
    let mut here = origin;
    let mut total = 0.0;
    for &next in steps.iter().rev() {
        if next == here {
            continue;
        }
        let dir = Direction::between(here, next)?;
        let elevation = grid.elevation(next).ok()?;
        total += step_cost(dir, elevation, weight);
        here = next;
    }
    Some(total)
}

/// A successful search result.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Destination first, first step last
    steps: Vec<Location>,
    /// Accumulated cost
    cost: f64,
}

impl Route {
    /// Steps from destination back to the first move.
    #[must_use]
    pub fn steps(&self) -> &[Location] {
        &self.steps
    }

    /// Accumulated search cost.
    #[must_use]
    pub const fn cost(&self) -> f64 {
        self.cost
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns true if there are no steps.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Final location.
    #[must_use]
    pub fn destination(&self) -> Option<Location> {
        self.steps.first().copied()
    }

    /// The move to make first.
    #[must_use]
    pub fn next_step(&self) -> Option<Location> {
        self.steps.last().copied()
    }

    /// Consumes the route, returning its steps.
    #[must_use]
    pub fn into_steps(self) -> Vec<Location> {
        self.steps
    }
}

/// Per-cell search state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum NodeStatus {
    #[default]
    Unseen,
    Frontier,
    Known,
}

/// Frontier entry. Ordered so the max-heap pops the cheapest node first,
/// with earlier insertions winning ties.
#[derive(Debug, Clone, Copy)]
struct SearchNode {
    index: usize,
    cost: f64,
    sequence: u64,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Counters from the most recent search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes finalized
    pub expansions: usize,
    /// Frontier insertions, including relaxations
    pub pushes: usize,
    /// The expansion cap ended the search
    pub hit_limit: bool,
}

/// Reusable shortest-path searcher.
///
/// Holds per-cell buffers sized to the last grid searched so repeated
/// searches (one per agent per turn) do not reallocate.
#[derive(Debug, Clone)]
pub struct PathFinder {
    status: Vec<NodeStatus>,
    cost: Vec<f64>,
    previous: Vec<usize>,
    frontier: BinaryHeap<SearchNode>,
    sequence: u64,
    max_expansions: usize,
    stats: SearchStats,
}

impl Default for PathFinder {
    fn default() -> Self {
        Self::new()
    }
}

impl PathFinder {
    /// Creates a searcher with the default expansion cap.
    #[must_use]
    pub fn new() -> Self {
        Self::with_expansion_limit(MAX_EXPANSIONS)
    }

    /// Creates a searcher with a custom expansion cap.
    #[must_use]
    pub fn with_expansion_limit(max_expansions: usize) -> Self {
        Self {
            status: Vec::new(),
            cost: Vec::new(),
            previous: Vec::new(),
            frontier: BinaryHeap::new(),
            sequence: 0,
            max_expansions,
            stats: SearchStats::default(),
        }
    }

    /// Stats from the last search.
    #[must_use]
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Shortest route from `from` to `to`, or `None` if unreachable.
    ///
    /// `from == to` yields a single-step "stay" route.
    ///
    /// # Panics
    ///
    /// Panics if either endpoint is off the grid.
    pub fn find_route(
        &mut self,
        from: Location,
        to: Location,
        grid: &Grid,
        weight: f64,
    ) -> Option<Route> {
        let origin = Self::endpoint_index(grid, from, "origin");
        let goal = Self::endpoint_index(grid, to, "destination");
        self.stats = SearchStats::default();

        if origin == goal {
            return Some(Route {
                steps: vec![from],
                cost: 0.0,
            });
        }

        self.reset(grid.len());
        self.status[origin] = NodeStatus::Known;
        self.cost[origin] = 0.0;
        self.previous[origin] = origin;
        self.expand(origin, grid, weight);

        while let Some(node) = self.frontier.pop() {
            if self.status[node.index] == NodeStatus::Known || node.cost > self.cost[node.index] {
                continue;
            }
            if self.stats.expansions >= self.max_expansions {
                self.stats.hit_limit = true;
                break;
            }
            self.status[node.index] = NodeStatus::Known;
            self.stats.expansions += 1;

            if node.index == goal {
                let route = self.reconstruct(origin, goal, grid);
                trace!(
                    %from, %to, weight,
                    expansions = self.stats.expansions,
                    steps = route.len(),
                    cost = route.cost,
                    "Path found"
                );
                return Some(route);
            }
            self.expand(node.index, grid, weight);
        }

        trace!(
            %from, %to, weight,
            expansions = self.stats.expansions,
            hit_limit = self.stats.hit_limit,
            "No path"
        );
        None
    }

    /// Route steps destination-first, or an empty vector if unreachable.
    pub fn find_path(
        &mut self,
        from: Location,
        to: Location,
        grid: &Grid,
        weight: f64,
    ) -> Vec<Location> {
        self.find_route(from, to, grid, weight)
            .map(Route::into_steps)
            .unwrap_or_default()
    }

    fn endpoint_index(grid: &Grid, loc: Location, role: &str) -> usize {
        match grid.index_of(loc) {
            Some(index) => index,
            None => panic!(
                "path {role} {loc} outside {}x{} grid",
                grid.cols(),
                grid.rows()
            ),
        }
    }

    fn reset(&mut self, len: usize) {
        self.status.clear();
        self.status.resize(len, NodeStatus::Unseen);
        self.cost.clear();
        self.cost.resize(len, f64::INFINITY);
        self.previous.clear();
        self.previous.resize(len, usize::MAX);
        self.frontier.clear();
        self.sequence = 0;
    }

    fn expand(&mut self, index: usize, grid: &Grid, weight: f64) {
        let here = grid.location_of(index);
        let base_cost = self.cost[index];

        for dir in Direction::NEIGHBORS {
            let Some(next) = grid.index_of(here.step(dir)) else {
                continue;
            };
            if self.status[next] == NodeStatus::Known {
                continue;
            }
            let cell = grid.cell_at(next);
            let multiplier = terrain_multiplier(cell.elevation(), weight);
            if cell.is_occupied() && multiplier <= 1.0 {
                continue;
            }

            let step = if dir.is_diagonal() {
                DIAGONAL_COST
            } else {
                ORTHOGONAL_COST
            };
            let candidate = base_cost + step * multiplier;
            if self.status[next] == NodeStatus::Unseen || candidate < self.cost[next] {
                self.status[next] = NodeStatus::Frontier;
                self.cost[next] = candidate;
                self.previous[next] = index;
                self.frontier.push(SearchNode {
                    index: next,
                    cost: candidate,
                    sequence: self.sequence,
                });
                self.sequence += 1;
                self.stats.pushes += 1;
            }
        }
    }

    fn reconstruct(&self, origin: usize, goal: usize, grid: &Grid) -> Route {
        let mut steps = Vec::new();
        let mut current = goal;
        while current != origin {
            steps.push(grid.location_of(current));
            current = self.previous[current];
        }
        Route {
            steps,
            cost: self.cost[goal],
        }
    }
}

/// One-off search with a fresh [`PathFinder`].
///
/// Returns steps destination-first; empty means no path.
#[must_use]
pub fn find_path(from: Location, to: Location, grid: &Grid, weight: f64) -> Vec<Location> {
    PathFinder::new().find_path(from, to, grid, weight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Passability, MAX_ELEVATION};
    use proptest::prelude::*;

    fn open_grid(rows: usize, cols: usize, level: u8) -> Grid {
        let mut grid = Grid::with_passability(rows, cols, Passability::open()).expect("grid");
        grid.fill(level).expect("fill");
        grid
    }

    fn replay(origin: Location, steps: &[Location]) -> Option<Location> {
        let mut here = origin;
        for &next in steps.iter().rev() {
            if !here.is_adjacent(next) {
                return None;
            }
            here = next;
        }
        Some(here)
    }

    #[test]
    fn test_same_location_is_stay() {
        let grid = open_grid(4, 4, 1);
        let loc = Location::new(2, 1);
        assert_eq!(find_path(loc, loc, &grid, 1.0), vec![loc]);
    }

    #[test]
    fn test_straight_line_path() {
        let grid = open_grid(1, 5, 1);
        let path = find_path(Location::new(0, 0), Location::new(4, 0), &grid, 1.0);
        assert_eq!(
            path,
            vec![
                Location::new(4, 0),
                Location::new(3, 0),
                Location::new(2, 0),
                Location::new(1, 0),
            ]
        );
    }

    #[test]
    fn test_diagonal_preferred_over_two_orthogonals() {
        let grid = open_grid(3, 3, 1);
        let mut finder = PathFinder::new();
        let route = finder
            .find_route(Location::new(0, 0), Location::new(2, 2), &grid, 1.0)
            .expect("route");
        assert_eq!(route.len(), 2);
        assert!((route.cost() - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_routes_around_high_cell() {
        let mut grid = Grid::with_passability(5, 5, Passability::blocking(&[MAX_ELEVATION]))
            .expect("grid");
        grid.fill(0).expect("fill");
        grid.set_elevation(Location::new(2, 2), MAX_ELEVATION).expect("set");

        let from = Location::new(0, 2);
        let to = Location::new(4, 2);
        let path = find_path(from, to, &grid, 10.0);

        assert!(!path.is_empty());
        assert!(!path.contains(&Location::new(2, 2)));
        assert_eq!(path[0], to);
        assert_eq!(replay(from, &path), Some(to));
    }

    #[test]
    fn test_surrounded_start_has_no_path() {
        let mut grid = Grid::new(5, 5).expect("grid");
        grid.fill(1).expect("fill");
        let start = Location::new(2, 2);
        for dir in Direction::NEIGHBORS {
            grid.set_elevation(start.step(dir), MAX_ELEVATION).expect("set");
        }
        assert!(find_path(start, Location::new(0, 0), &grid, 1.0).is_empty());
    }

    #[test]
    fn test_occupied_cells_block_unweighted_search() {
        // Default passability: level 0 is deep water.
        let mut grid = Grid::new(3, 3).expect("grid");
        grid.fill(1).expect("fill");
        for y in 0..3 {
            grid.set_elevation(Location::new(1, y), 0).expect("set");
        }
        let from = Location::new(0, 1);
        let to = Location::new(2, 1);
        assert!(find_path(from, to, &grid, 1.0).is_empty());
        // A weight does not help: level 0 has multiplier 1.
        assert!(find_path(from, to, &grid, 10.0).is_empty());
    }

    #[test]
    fn test_weighted_search_crosses_mesa() {
        let mut grid = Grid::new(3, 3).expect("grid");
        grid.fill(1).expect("fill");
        for y in 0..3 {
            grid.set_elevation(Location::new(1, y), MAX_ELEVATION).expect("set");
        }
        let from = Location::new(0, 1);
        let to = Location::new(2, 1);
        assert!(find_path(from, to, &grid, 1.0).is_empty());

        let path = find_path(from, to, &grid, 2.0);
        assert_eq!(path.len(), 2);
        assert_eq!(grid[path[1]].elevation(), MAX_ELEVATION);
    }

    #[test]
    fn test_expansion_limit_is_failure() {
        let grid = open_grid(20, 20, 1);
        let mut finder = PathFinder::with_expansion_limit(5);
        let route = finder.find_route(Location::new(0, 0), Location::new(19, 19), &grid, 1.0);
        assert!(route.is_none());
        assert!(finder.stats().hit_limit);
        assert_eq!(finder.stats().expansions, 5);
    }

    #[test]
    fn test_finder_reuse_across_grid_sizes() {
        let mut finder = PathFinder::new();
        let small = open_grid(3, 3, 1);
        let large = open_grid(10, 12, 1);
        assert_eq!(
            finder.find_path(Location::new(0, 0), Location::new(2, 0), &small, 1.0).len(),
            2
        );
        assert_eq!(
            finder.find_path(Location::new(0, 0), Location::new(11, 0), &large, 1.0).len(),
            11
        );
    }

    #[test]
    fn test_ties_resolve_deterministically() {
        let grid = open_grid(6, 6, 1);
        let mut finder = PathFinder::new();
        let first = finder.find_path(Location::new(0, 0), Location::new(5, 3), &grid, 1.0);
        for _ in 0..5 {
            let again = finder.find_path(Location::new(0, 0), Location::new(5, 3), &grid, 1.0);
            assert_eq!(again, first);
        }
    }

    #[test]
    fn test_route_cost_matches_search() {
        let mut grid = open_grid(6, 6, 1);
        grid.set_elevation(Location::new(2, 2), 3).expect("set");
        grid.set_elevation(Location::new(3, 3), 2).expect("set");
        let from = Location::new(0, 0);
        let to = Location::new(5, 5);
        let route = PathFinder::new()
            .find_route(from, to, &grid, 3.0)
            .expect("route");
        let cost = route_cost(from, route.steps(), &grid, 3.0).expect("adjacent");
        assert!((cost - route.cost()).abs() < 1e-9);
        assert_eq!(route_cost(from, &[Location::new(3, 0)], &grid, 1.0), None);
    }

    #[test]
    #[should_panic(expected = "path destination")]
    fn test_out_of_bounds_endpoint_panics() {
        let grid = open_grid(3, 3, 1);
        let _ = find_path(Location::new(0, 0), Location::new(3, 0), &grid, 1.0);
    }

    fn arb_grid() -> impl Strategy<Value = (Grid, Location, Location)> {
        (2usize..10, 2usize..10).prop_flat_map(|(rows, cols)| {
            (
                proptest::collection::vec(1u8..=MAX_ELEVATION, rows * cols),
                0..cols as i32,
                0..rows as i32,
                0..cols as i32,
                0..rows as i32,
            )
                .prop_map(move |(levels, ax, ay, bx, by)| {
                    let mut grid =
                        Grid::with_passability(rows, cols, Passability::open()).expect("grid");
                    for (index, level) in levels.into_iter().enumerate() {
                        let loc = grid.location_of(index);
                        grid.set_elevation(loc, level).expect("set");
                    }
                    (grid, Location::new(ax, ay), Location::new(bx, by))
                })
        })
    }

    proptest! {
        #[test]
        fn prop_paths_stay_on_grid_and_replay((grid, from, to) in arb_grid()) {
            let path = find_path(from, to, &grid, 1.0);
            prop_assert!(!path.is_empty());
            prop_assert!(path.iter().all(|&loc| grid.contains(loc)));
            if from == to {
                prop_assert_eq!(path, vec![from]);
            } else {
                prop_assert_eq!(path[0], to);
                prop_assert_eq!(replay(from, &path), Some(to));
            }
        }

        #[test]
        fn prop_weight_never_lowers_cost((grid, from, to) in arb_grid(), weight in 1.0f64..20.0) {
            let mut finder = PathFinder::new();
            let base = finder.find_route(from, to, &grid, 1.0).expect("open grid");
            let weighted = finder.find_route(from, to, &grid, weight).expect("open grid");
            prop_assert!(weighted.cost() + 1e-9 >= base.cost());
        }
    }
}
