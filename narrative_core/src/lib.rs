//! # Narrative Core (The Cortex)
//!
//! The layer between the game engine and an external text generator. It keeps
//! a bounded memory of what happened in a session, turns the current game
//! state plus that memory into a deterministic prompt context, and checks the
//! generated text before the player sees it.
//!
//! ## Core Components
//!
//! - **history**: Per-domain bounded logs (narrative, location, combat)
//! - **context_assembler**: Builds ordered, toggleable context sections
//! - **validation**: Independent checkers plus a scored verdict
//! - **suggester**: Advisory correction notes for flagged responses
//! - **session**: One self-contained set of the above per running game
//!
//! ## Design Philosophy
//!
//! - **Read-only state**: Snapshots come in per call and are never kept or mutated
//! - **Never abort a turn**: Missing data degrades output, bad records are dropped
//! - **Deterministic**: Same store state and snapshot, same context string

pub mod config;
pub mod context_assembler;
pub mod error;
pub mod generation;
pub mod history;
pub mod session;
pub mod suggester;
pub mod validation;

pub use config::*;
pub use context_assembler::*;
pub use error::*;
pub use generation::*;
pub use history::*;
pub use session::*;
pub use suggester::*;
pub use validation::*;
