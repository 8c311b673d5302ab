//! Board model and move generator for 37-hole peg solitaire.
//!
//! This module defines the fundamental components of the puzzle:
//! - `Configuration`: a bit-packed 7×7 board state (one bit per cell) together
//!   with its cached marble count.
//! - `Direction` and `Move`: the four jump directions and a single jump keyed
//!   by the cell it is made at.
//! - Move generation: legality testing, move application and enumeration of
//!   all child configurations in a fixed, deterministic order.
//!
//! The board is the French (European) layout: a 7×7 grid with three cells cut
//! from each corner, leaving 37 holes.
use crate::error::ConfigurationError;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::fmt;

/// Width and height of the square grid the board is cut from.
pub const BOARD_SIZE: usize = 7;

/// Number of cells in the grid, i.e. the number of significant bits of a configuration.
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Mask of all 49 significant bits.
pub const BOARD_MASK: u64 = (1 << CELL_COUNT) - 1;

/// Every playable hole holding a marble. Row 0 occupies the highest seven bits.
pub const FULL_BOARD_BITS: u64 = 0b0011100_0111110_1111111_1111111_1111111_0111110_0011100;

/// Number of playable holes on the board.
pub const FULL_BOARD_COUNT: u32 = 37;

/// Mask of the twelve cells cut from the corners. These bits are always clear.
pub const CORNER_BITS: u64 = BOARD_MASK & !FULL_BOARD_BITS;

/// Inclusive lower index limit of the cells a move can be made at, per row
/// (column limit) and per column (row limit).
pub const MOVABLE_MIN: [usize; BOARD_SIZE] = [3, 2, 1, 0, 1, 2, 3];

/// Inclusive upper counterpart of [`MOVABLE_MIN`].
pub const MOVABLE_MAX: [usize; BOARD_SIZE] = [3, 4, 5, 6, 5, 4, 3];

/// Returns the single-bit mask of the cell at `(row, col)`.
#[inline]
fn cell_bit(row: usize, col: usize) -> u64 {
    1u64 << (CELL_COUNT - 1 - (row * BOARD_SIZE + col))
}

/// Moves `index` by `delta`. Callers guarantee the result stays on the grid.
#[inline]
fn shift(index: usize, delta: isize) -> usize {
    index.wrapping_add_signed(delta)
}

/// Returns `true` if `(row, col)` is one of the 37 holes of the board.
///
/// # Examples
/// ```
/// use peg_solver::engine::is_playable;
/// assert!(is_playable(3, 3));
/// assert!(is_playable(1, 1));
/// assert!(!is_playable(0, 1));
/// assert!(!is_playable(7, 0));
/// ```
pub fn is_playable(row: usize, col: usize) -> bool {
    row < BOARD_SIZE && col < BOARD_SIZE && FULL_BOARD_BITS & cell_bit(row, col) != 0
}

/// One of the four directions a marble can jump in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// All directions, in move generation order.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns the `(row, col)` offsets added to an index when stepping in this direction.
    pub fn offsets(self) -> (isize, isize) {
        match self {
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
        }
    }

    /// Returns a lowercase name, used for display.
    pub fn name(self) -> &'static str {
        match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Up => "up",
            Direction::Down => "down",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single jump, keyed by the cell `(row, col)` it is made at and its direction.
///
/// The move empties `(row, col)` and the cell behind it (opposite to `dir`),
/// and places a marble in the cell ahead of it (one step along `dir`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub row: usize,
    pub col: usize,
    pub dir: Direction,
}

impl Move {
    pub fn new(row: usize, col: usize, dir: Direction) -> Self {
        Move { row, col, dir }
    }

    /// Applies this move to `config`, returning `None` if it is not legal there.
    pub fn apply(&self, config: &Configuration) -> Option<Configuration> {
        config.attempt_move(self.row, self.col, self.dir)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}", self.row, self.col, self.dir)
    }
}

/// Iterates over every `(row, col, dir)` combination in generation order:
/// direction outermost, then row ascending, then column ascending.
fn candidate_moves() -> impl Iterator<Item = Move> {
    Direction::ALL.into_iter().flat_map(|dir| {
        (0..BOARD_SIZE)
            .flat_map(move |row| (0..BOARD_SIZE).map(move |col| Move::new(row, col, dir)))
    })
}

/// An immutable board state.
///
/// Bit `48 - (7 * row + col)` holds the cell at `(row, col)`, so the most
/// significant of the 49 bits is row 0, column 0. Corner bits are always clear.
/// The marble count is cached alongside the bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Configuration {
    bits: u64,
    count: u32,
}

impl Configuration {
    /// Builds a configuration from raw bits, rejecting bits beyond the board
    /// and marbles placed on cut corner cells.
    ///
    /// # Examples
    /// ```
    /// use peg_solver::engine::{Configuration, FULL_BOARD_BITS};
    /// let full = Configuration::from_bits(FULL_BOARD_BITS).unwrap();
    /// assert_eq!(full.marble_count(), 37);
    ///
    /// // Row 0, column 0 is a cut corner.
    /// assert!(Configuration::from_bits(1 << 48).is_err());
    /// // Only 49 bits are significant.
    /// assert!(Configuration::from_bits(1 << 49).is_err());
    /// ```
    pub fn from_bits(bits: u64) -> Result<Self, ConfigurationError> {
        if bits & !BOARD_MASK != 0 {
            return Err(ConfigurationError::OutOfRange { bits });
        }
        if bits & CORNER_BITS != 0 {
            return Err(ConfigurationError::CornerCell { bits });
        }
        Ok(Configuration::from_valid_bits(bits))
    }

    #[inline]
    fn from_valid_bits(bits: u64) -> Self {
        Configuration {
            bits,
            count: bits.count_ones(),
        }
    }

    /// A board with every hole filled (37 marbles).
    pub fn full_board() -> Self {
        Configuration {
            bits: FULL_BOARD_BITS,
            count: FULL_BOARD_COUNT,
        }
    }

    /// A board with no marbles.
    pub fn empty() -> Self {
        Configuration { bits: 0, count: 0 }
    }

    /// Builds a reproducible start position from a seed.
    ///
    /// Starts from the full board with one randomly chosen hole emptied, then
    /// plays up to `moves` random legal moves. Fewer moves are played if a
    /// position without legal moves is reached first. The same seed always
    /// produces the same configuration.
    ///
    /// # Examples
    /// ```
    /// use peg_solver::engine::Configuration;
    /// let a = Configuration::random_playout(7, 10);
    /// let b = Configuration::random_playout(7, 10);
    /// assert_eq!(a, b);
    /// assert!(a.marble_count() >= 26);
    /// ```
    pub fn random_playout(seed: u64, moves: usize) -> Self {
        let mut rng = SmallRng::seed_from_u64(seed);

        let holes: Vec<(usize, usize)> = (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| (row, col)))
            .filter(|&(row, col)| is_playable(row, col))
            .collect();
        let (hole_row, hole_col) = holes[rng.gen_range(0..holes.len())];
        let mut config = Configuration::full_board().without_marble(hole_row, hole_col);

        for _ in 0..moves {
            let legal = config.legal_moves();
            if legal.is_empty() {
                break;
            }
            let mv = legal[rng.gen_range(0..legal.len())];
            if let Some(next) = mv.apply(&config) {
                config = next;
            }
        }
        config
    }

    /// Returns the raw 49-bit mask.
    pub fn bits(&self) -> u64 {
        self.bits
    }

    /// Returns the number of marbles on the board.
    pub fn marble_count(&self) -> u32 {
        self.count
    }

    /// Returns `true` if the board holds no marbles.
    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Returns `true` if the cell at `(row, col)` holds a marble.
    ///
    /// `row` and `col` must be within `0..BOARD_SIZE`.
    pub fn is_marble(&self, row: usize, col: usize) -> bool {
        self.bits & cell_bit(row, col) != 0
    }

    /// Returns a copy of this configuration with a marble at `(row, col)`.
    ///
    /// A cut corner cell cannot hold a marble, so placing one there returns
    /// the configuration unchanged.
    pub fn with_marble(&self, row: usize, col: usize) -> Self {
        Configuration::from_valid_bits((self.bits | cell_bit(row, col)) & FULL_BOARD_BITS)
    }

    /// Returns a copy of this configuration with `(row, col)` emptied.
    pub fn without_marble(&self, row: usize, col: usize) -> Self {
        Configuration::from_valid_bits(self.bits & !cell_bit(row, col))
    }

    /// Checks whether a jump at `(row, col)` in direction `dir` is legal.
    ///
    /// A move is legal when all of the following hold:
    /// 1. `(row, col)` lies within the movable index limits, which exclude the
    ///    cells around a cut corner that no jump can pass through;
    /// 2. it does not point off the grid from a boundary row or column;
    /// 3. `(row, col)` holds a marble;
    /// 4. the cell behind `(row, col)` (opposite to `dir`) holds a marble;
    /// 5. the cell ahead of `(row, col)` (along `dir`) is empty.
    ///
    /// Indices outside the grid are never legal.
    pub fn is_legal_move(&self, row: usize, col: usize, dir: Direction) -> bool {
        if row >= BOARD_SIZE || col >= BOARD_SIZE {
            return false;
        }
        if row < MOVABLE_MIN[col]
            || row > MOVABLE_MAX[col]
            || col < MOVABLE_MIN[row]
            || col > MOVABLE_MAX[row]
        {
            return false;
        }

        let (dr, dc) = dir.offsets();
        let last = BOARD_SIZE - 1;
        if ((row == 0 || row == last) && dr != 0) || ((col == 0 || col == last) && dc != 0) {
            return false;
        }

        if !self.is_marble(row, col) {
            return false;
        }
        self.is_marble(shift(row, -dr), shift(col, -dc))
            && !self.is_marble(shift(row, dr), shift(col, dc))
    }

    /// Attempts a jump at `(row, col)` in direction `dir`.
    ///
    /// # Returns
    /// * `Some(config)` with `(row, col)` and the cell behind it cleared and the
    ///   cell ahead of it set, if the move is legal. The result always has
    ///   exactly one marble fewer and is never empty.
    /// * `None` if any legality condition fails.
    ///
    /// # Examples
    /// ```
    /// use peg_solver::engine::{Configuration, Direction};
    /// let start = Configuration::full_board().without_marble(3, 3);
    /// // The marble at (3, 5) jumps over (3, 4) into the centre.
    /// let next = start.attempt_move(3, 4, Direction::Left).unwrap();
    /// assert!(next.is_marble(3, 3));
    /// assert!(!next.is_marble(3, 4));
    /// assert!(!next.is_marble(3, 5));
    /// assert_eq!(next.marble_count(), 35);
    ///
    /// assert!(start.attempt_move(3, 4, Direction::Right).is_none());
    /// ```
    pub fn attempt_move(&self, row: usize, col: usize, dir: Direction) -> Option<Configuration> {
        if !self.is_legal_move(row, col, dir) {
            return None;
        }
        let (dr, dc) = dir.offsets();
        let cleared = cell_bit(row, col) | cell_bit(shift(row, -dr), shift(col, -dc));
        let landing = cell_bit(shift(row, dr), shift(col, dc));
        let next = Configuration {
            bits: (self.bits & !cleared) | landing,
            count: self.count - 1,
        };
        debug_assert_eq!(next.bits & CORNER_BITS, 0);
        debug_assert!(!next.is_empty());
        Some(next)
    }

    /// Returns every legal move, in generation order.
    pub fn legal_moves(&self) -> Vec<Move> {
        candidate_moves()
            .filter(|mv| self.is_legal_move(mv.row, mv.col, mv.dir))
            .collect()
    }

    /// Returns `true` if at least one legal move exists.
    pub fn has_moves(&self) -> bool {
        candidate_moves().any(|mv| self.is_legal_move(mv.row, mv.col, mv.dir))
    }

    /// Enumerates the configuration reached by every legal move.
    ///
    /// The order is fixed: direction outermost (left, right, up, down), then
    /// row ascending, then column ascending.
    pub fn children(&self) -> impl Iterator<Item = Configuration> {
        let config = *self;
        candidate_moves().filter_map(move |mv| mv.apply(&config))
    }

    /// Finds the first move, in generation order, that turns `self` into `next`.
    pub fn move_to(&self, next: &Configuration) -> Option<Move> {
        candidate_moves().find(|mv| mv.apply(self).as_ref() == Some(next))
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration::empty()
    }
}

impl fmt::Display for Configuration {
    /// Formats the board as seven lines: `o` for a marble, `.` for an empty
    /// hole and a space for a cut corner cell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                let c = if !is_playable(row, col) {
                    ' '
                } else if self.is_marble(row, col) {
                    'o'
                } else {
                    '.'
                };
                write!(f, "{}", c)?;
            }
            if row < BOARD_SIZE - 1 {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
