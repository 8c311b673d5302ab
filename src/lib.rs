//! # Peg Solitaire Solver Library
//!
//! This library searches the state space of 37-hole peg solitaire (a 7×7
//! board with three cells cut from each corner) from a given starting
//! configuration. It either looks for the configuration with the fewest
//! marbles, stopping once a threshold is reached, or for one exact target
//! configuration, and reconstructs the moves that lead there.
//!
//! It is used by the `peg_solver` binary, which takes a start board and a
//! goal on the command line and prints the solution chain.
//!
//! ## Modules
//! - `engine`: the bit-packed board (`Configuration`), jump directions and
//!   moves, and the deterministic legal-move generator.
//! - `arena`: the fixed-capacity node sequence that serves as the explicit
//!   depth-first stack, and solution chain reconstruction.
//! - `solver`: the iterative search driver, its goals, settings and statistics.
//! - `utils`: parsing configurations from strings.
//! - `error`: error types shared by the modules above.

pub mod arena;
pub mod engine;
pub mod error;
pub mod solver;
pub mod utils;

pub use error::{ConfigurationError, SearchError};
