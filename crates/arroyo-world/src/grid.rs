//! Terrain grid and cell storage.
//!
//! The grid is a single flat buffer of [`Cell`]s indexed `row * cols + col`.
//! Locations use `x` for the column and `y` for the row.

use arroyo_common::{AgentId, GridError, GridResult, Location};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Highest quantized elevation level (mesa / mountain).
pub const MAX_ELEVATION: u8 = 4;

/// Number of distinct elevation levels.
pub const ELEVATION_LEVELS: usize = MAX_ELEVATION as usize + 1;

/// Set of elevation levels treated as occupied terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Passability {
    /// Bit `n` set means level `n` is impassable
    blocked: u8,
}

impl Passability {
    /// Creates a policy blocking the given levels. Levels above
    /// [`MAX_ELEVATION`] are ignored.
    #[must_use]
    pub fn blocking(levels: &[u8]) -> Self {
        let blocked = levels
            .iter()
            .filter(|&&level| level <= MAX_ELEVATION)
            .fold(0u8, |mask, &level| mask | (1 << level));
        Self { blocked }
    }

    /// Policy where every level is passable.
    #[must_use]
    pub const fn open() -> Self {
        Self { blocked: 0 }
    }

    /// Returns true if `level` is impassable.
    #[must_use]
    pub const fn blocks(self, level: u8) -> bool {
        level <= MAX_ELEVATION && self.blocked & (1 << level) != 0
    }

    /// Impassable levels in ascending order.
    #[must_use]
    pub fn levels(self) -> Vec<u8> {
        (0..=MAX_ELEVATION).filter(|&l| self.blocks(l)).collect()
    }
}

impl Default for Passability {
    /// Deep water (0) and mesa (4).
    fn default() -> Self {
        Self::blocking(&[0, MAX_ELEVATION])
    }
}

/// An agent standing on a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Occupant {
    /// Agent handle
    pub id: AgentId,
    /// Solid occupants make the cell occupied for path searches
    pub solid: bool,
}

impl Occupant {
    /// Creates a solid occupant.
    #[must_use]
    pub const fn solid(id: AgentId) -> Self {
        Self { id, solid: true }
    }

    /// Creates an occupant other agents may route onto.
    #[must_use]
    pub const fn passable(id: AgentId) -> Self {
        Self { id, solid: false }
    }
}

/// One grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Quantized elevation level
    elevation: u8,
    /// Elevation level is in the impassable set
    terrain_blocked: bool,
    /// Agent on this cell
    occupant: Option<Occupant>,
    /// Needs redraw
    fresh: bool,
}

impl Cell {
    fn new(elevation: u8, passability: Passability) -> Self {
        Self {
            elevation,
            terrain_blocked: passability.blocks(elevation),
            occupant: None,
            fresh: true,
        }
    }

    /// Elevation level in `[0, MAX_ELEVATION]`.
    #[must_use]
    pub const fn elevation(&self) -> u8 {
        self.elevation
    }

    /// Returns true if the cell cannot be entered by ordinary movement.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        if self.terrain_blocked {
            return true;
        }
        match self.occupant {
            Some(occupant) => occupant.solid,
            None => false,
        }
    }

    /// Returns the occupant, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<Occupant> {
        self.occupant
    }

    /// Returns true if an agent stands here.
    #[must_use]
    pub const fn has_occupant(&self) -> bool {
        self.occupant.is_some()
    }

    /// Returns true if the cell changed since it was last drawn.
    #[must_use]
    pub const fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Clears the redraw flag.
    pub fn mark_drawn(&mut self) {
        self.fresh = false;
    }
}

/// Rectangular terrain grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    passability: Passability,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates a grid at elevation 0 with the default passability.
    pub fn new(rows: usize, cols: usize) -> GridResult<Self> {
        Self::with_passability(rows, cols, Passability::default())
    }

    /// Creates a grid at elevation 0 with the given passability.
    pub fn with_passability(
        rows: usize,
        cols: usize,
        passability: Passability,
    ) -> GridResult<Self> {
        if rows == 0 || cols == 0 || i32::try_from(rows.max(cols)).is_err() {
            return Err(GridError::EmptyDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            passability,
            cells: vec![Cell::new(0, passability); rows * cols],
        })
    }

    /// Number of rows.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Total number of cells.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; grids have at least one cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Terrain passability policy.
    #[must_use]
    pub const fn passability(&self) -> Passability {
        self.passability
    }

    /// The basin: `(cols / 2, rows / 2)`.
    #[must_use]
    pub const fn center(&self) -> Location {
        Location::new((self.cols / 2) as i32, (self.rows / 2) as i32)
    }

    /// Returns true if `loc` is on the grid.
    #[must_use]
    pub const fn contains(&self, loc: Location) -> bool {
        loc.x >= 0 && loc.y >= 0 && (loc.x as usize) < self.cols && (loc.y as usize) < self.rows
    }

    /// Flat index of `loc`, or `None` if off-grid.
    #[must_use]
    pub const fn index_of(&self, loc: Location) -> Option<usize> {
        if self.contains(loc) {
            Some(loc.y as usize * self.cols + loc.x as usize)
        } else {
            None
        }
    }

    /// Location of a flat index.
    #[must_use]
    pub const fn location_of(&self, index: usize) -> Location {
        Location::new((index % self.cols) as i32, (index / self.cols) as i32)
    }

    /// Snaps `loc` onto the nearest in-bounds location.
    #[must_use]
    pub fn clamp(&self, loc: Location) -> Location {
        Location::new(
            loc.x.clamp(0, self.cols as i32 - 1),
            loc.y.clamp(0, self.rows as i32 - 1),
        )
    }

    fn checked_index(&self, loc: Location) -> GridResult<usize> {
        self.index_of(loc).ok_or(GridError::OutOfBounds {
            x: loc.x,
            y: loc.y,
            cols: self.cols,
            rows: self.rows,
        })
    }

    /// Cell at `(row, col)`.
    pub fn get(&self, row: usize, col: usize) -> GridResult<&Cell> {
        self.cell(Location::new(col as i32, row as i32))
    }

    /// Cell at `loc`.
    pub fn cell(&self, loc: Location) -> GridResult<&Cell> {
        let index = self.checked_index(loc)?;
        Ok(&self.cells[index])
    }

    /// Mutable cell at `loc`, for renderer bookkeeping.
    pub fn cell_mut(&mut self, loc: Location) -> GridResult<&mut Cell> {
        let index = self.checked_index(loc)?;
        Ok(&mut self.cells[index])
    }

    /// Cell at a flat index. Panics if out of range.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// All cells in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Elevation level at `loc`.
    pub fn elevation(&self, loc: Location) -> GridResult<u8> {
        self.cell(loc).map(Cell::elevation)
    }

    /// Sets the elevation level at `loc` and refreshes its occupancy.
    pub fn set_elevation(&mut self, loc: Location, level: u8) -> GridResult<()> {
        if level > MAX_ELEVATION {
            return Err(GridError::InvalidElevation {
                level,
                max: MAX_ELEVATION,
            });
        }
        let index = self.checked_index(loc)?;
        let blocked = self.passability.blocks(level);
        let cell = &mut self.cells[index];
        cell.elevation = level;
        cell.terrain_blocked = blocked;
        cell.fresh = true;
        Ok(())
    }

    /// Sets every cell to `level`.
    pub fn fill(&mut self, level: u8) -> GridResult<()> {
        if level > MAX_ELEVATION {
            return Err(GridError::InvalidElevation {
                level,
                max: MAX_ELEVATION,
            });
        }
        let blocked = self.passability.blocks(level);
        for cell in &mut self.cells {
            cell.elevation = level;
            cell.terrain_blocked = blocked;
            cell.fresh = true;
        }
        Ok(())
    }

    /// Returns true if `loc` is occupied by terrain or a solid agent.
    pub fn is_occupied(&self, loc: Location) -> GridResult<bool> {
        self.cell(loc).map(Cell::is_occupied)
    }

    /// Occupant at `loc`.
    pub fn occupant(&self, loc: Location) -> GridResult<Option<Occupant>> {
        self.cell(loc).map(Cell::occupant)
    }

    /// Replaces the occupant at `loc`, returning the previous one.
    ///
    /// This does not check the one-agent-per-cell rule; callers that move
    /// agents go through the board, which does.
    pub fn set_occupant(
        &mut self,
        loc: Location,
        occupant: Option<Occupant>,
    ) -> GridResult<Option<Occupant>> {
        let index = self.checked_index(loc)?;
        let cell = &mut self.cells[index];
        cell.fresh = true;
        Ok(std::mem::replace(&mut cell.occupant, occupant))
    }

    /// Flags every cell for redraw.
    pub fn mark_all_fresh(&mut self) {
        for cell in &mut self.cells {
            cell.fresh = true;
        }
    }

    /// Row-major elevation levels.
    #[must_use]
    pub fn elevations(&self) -> Vec<u8> {
        self.cells.iter().map(Cell::elevation).collect()
    }

    /// Number of cells at each elevation level.
    #[must_use]
    pub fn elevation_histogram(&self) -> [usize; ELEVATION_LEVELS] {
        let mut counts = [0; ELEVATION_LEVELS];
        for cell in &self.cells {
            counts[usize::from(cell.elevation)] += 1;
        }
        counts
    }

    /// Iterates over all locations in row-major order.
    pub fn locations(&self) -> impl Iterator<Item = Location> + '_ {
        (0..self.cells.len()).map(|i| self.location_of(i))
    }

    /// Copies a `rows x cols` window starting at `origin` into a new grid.
    ///
    /// Elevation and passability carry over; occupants do not.
    pub fn section(&self, origin: Location, rows: usize, cols: usize) -> GridResult<Self> {
        let mut section = Self::with_passability(rows, cols, self.passability)?;
        let far_corner = Location::new(
            origin.x + cols as i32 - 1,
            origin.y + rows as i32 - 1,
        );
        self.checked_index(origin)?;
        self.checked_index(far_corner)?;

        for (index, cell) in section.cells.iter_mut().enumerate() {
            let local = Location::new((index % cols) as i32, (index / cols) as i32);
            let source = self.cells[self.checked_index(origin + local)?];
            *cell = Cell::new(source.elevation, self.passability);
        }
        Ok(section)
    }
}

impl Index<Location> for Grid {
    type Output = Cell;

    /// Panics if `loc` is off-grid.
    fn index(&self, loc: Location) -> &Cell {
        match self.index_of(loc) {
            Some(index) => &self.cells[index],
            None => panic!(
                "location {loc} outside {}x{} grid",
                self.cols, self.rows
            ),
        }
    }
}
