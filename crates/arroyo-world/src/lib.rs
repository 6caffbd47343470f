//! # Arroyo World
//!
//! Board terrain for Arroyo.
//!
//! This crate handles:
//! - The elevation grid and its occupancy rule
//! - Noise-driven elevation synthesis
//! - River carving
//! - Terrain-weighted pathfinding
//! - Generation configuration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod generation;
pub mod grid;
pub mod hydrology;
pub mod noise_field;
pub mod pathfinding;
pub mod synthesis;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::generation::*;
    pub use crate::grid::*;
    pub use crate::hydrology::*;
    pub use crate::noise_field::*;
    pub use crate::pathfinding::*;
    pub use crate::synthesis::*;
}

pub use prelude::*;
