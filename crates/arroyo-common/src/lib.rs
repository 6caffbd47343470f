//! # Arroyo Common
//!
//! Common types shared by the Arroyo crates:
//! - Board locations and compass directions
//! - Agent IDs
//! - Error taxonomy
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod coords;
pub mod error;
pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::coords::*;
    pub use crate::error::*;
    pub use crate::ids::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_agent_id_sequence() {
        let first = AgentId::from_raw(1);
        assert_eq!(first.next().raw(), 2);
        assert_ne!(first, first.next());
    }

    #[test]
    fn test_error_conversion() {
        let err: ArroyoError = GridError::EmptyDimensions { rows: 0, cols: 3 }.into();
        assert!(matches!(err, ArroyoError::Grid(_)));
        assert!(err.to_string().contains("0x3"));
    }

    proptest! {
        #[test]
        fn prop_add_sub_inverse(ax in -1000i32..1000, ay in -1000i32..1000,
                                bx in -1000i32..1000, by in -1000i32..1000) {
            let a = Location::new(ax, ay);
            let b = Location::new(bx, by);
            prop_assert_eq!((a + b) - b, a);
            prop_assert_eq!(a.manhattan_distance(b), b.manhattan_distance(a));
        }
    }
}
