//! # Game State
//!
//! Read-only snapshots of the game world handed to the narrative layer on every
//! call. The engine owns and mutates the real state; this crate only describes
//! what a snapshot looks like and normalizes it at the boundary.

pub mod entities;
pub mod error;
pub mod keyed;
pub mod mechanics;
pub mod world_state;

pub use entities::*;
pub use error::*;
pub use keyed::Keyed;
pub use mechanics::*;
pub use world_state::*;
