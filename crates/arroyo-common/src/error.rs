//! Error types for Arroyo.

use thiserror::Error;

/// Top-level error type for Arroyo operations.
#[derive(Debug, Error)]
pub enum ArroyoError {
    /// Grid access errors
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Grid construction and access errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Coordinate outside `[0, cols) x [0, rows)`
    #[error("Location ({x}, {y}) is outside the {cols}x{rows} grid")]
    OutOfBounds {
        /// Column
        x: i32,
        /// Row
        y: i32,
        /// Grid width
        cols: usize,
        /// Grid height
        rows: usize,
    },

    /// Zero-sized grid
    #[error("Grid dimensions must be at least 1x1, got {rows}x{cols}")]
    EmptyDimensions {
        /// Requested rows
        rows: usize,
        /// Requested columns
        cols: usize,
    },

    /// Elevation level above the maximum
    #[error("Elevation level {level} exceeds maximum {max}")]
    InvalidElevation {
        /// Requested level
        level: u8,
        /// Highest allowed level
        max: u8,
    },
}

/// Generation configuration errors, reported before any generation runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Zero rows or columns
    #[error("Invalid dimensions {rows}x{cols}")]
    InvalidDimensions {
        /// Rows
        rows: usize,
        /// Columns
        cols: usize,
    },

    /// Log-fit falloff divisor evaluates to zero or below
    #[error("Falloff divisor {divisor} is not positive for {rows} rows")]
    DegenerateDivisor {
        /// Rows
        rows: usize,
        /// Computed divisor
        divisor: f64,
    },

    /// Thresholds out of order or outside `[0, 1]`
    #[error("Elevation thresholds must be ascending fractions in [0, 1]: {0:?}")]
    InvalidThresholds([f64; 4]),

    /// River width of zero
    #[error("River width must be at least 1")]
    InvalidRiverWidth,

    /// River width above what the board can hold
    #[error("River width {width} exceeds the limit of {max}")]
    RiverTooWide {
        /// Configured width
        width: u32,
        /// Largest accepted width
        max: u32,
    },

    /// Non-positive or non-finite terrain weight
    #[error("Terrain weight must be a positive finite number, got {0}")]
    InvalidWeight(f64),

    /// Bad noise parameters
    #[error("Invalid noise parameters: {0}")]
    InvalidNoise(String),

    /// Impassable level above the maximum elevation level
    #[error("Impassable level {0} is not a valid elevation level")]
    InvalidImpassableLevel(u8),
}

/// Result type alias for Arroyo operations.
pub type ArroyoResult<T> = Result<T, ArroyoError>;

/// Result type alias for grid operations.
pub type GridResult<T> = Result<T, GridError>;
