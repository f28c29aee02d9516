use std::fmt;

use arrayvec::ArrayVec;
use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

/// Static geometry of every piece kind in each of its four rotations.
///
/// The catalog is a process-wide constant: it is built at compile time,
/// never mutated, and shared by `&'static` reference between the session,
/// the collision checks and the state encoder.
///
/// Offsets are `(dx, dy)` pairs relative to the piece anchor, where `dx` grows
/// rightward (columns) and `dy` grows downward (rows).
///
/// # Example
///
/// ```
/// use qtris_engine::{PieceCatalog, PieceKind, Rotation};
///
/// let catalog = PieceCatalog::standard();
/// let offsets = catalog.shape(PieceKind::O, Rotation::Deg0);
/// assert_eq!(offsets.len(), 4);
/// assert_eq!(catalog.distinct_rotations(PieceKind::O).len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PieceCatalog {
    shapes: [[PieceShape; 4]; PieceKind::LEN],
}

/// The four block offsets of one piece kind in one rotation.
pub type PieceShape = [BlockOffset; 4];

static STANDARD_CATALOG: PieceCatalog = PieceCatalog::STANDARD;

impl PieceCatalog {
    pub const STANDARD: Self = {
        const fn o(dx: u8, dy: u8) -> BlockOffset {
            BlockOffset { dx, dy }
        }
        const fn same4(shape: PieceShape) -> [PieceShape; 4] {
            [shape, shape, shape, shape]
        }
        Self {
            shapes: [
                // I-piece
                [
                    [o(0, 0), o(1, 0), o(2, 0), o(3, 0)],
                    [o(1, 0), o(1, 1), o(1, 2), o(1, 3)],
                    [o(3, 0), o(2, 0), o(1, 0), o(0, 0)],
                    [o(1, 3), o(1, 2), o(1, 1), o(1, 0)],
                ],
                // O-piece
                same4([o(1, 0), o(2, 0), o(1, 1), o(2, 1)]),
                // S-piece
                [
                    [o(2, 0), o(1, 0), o(1, 1), o(0, 1)],
                    [o(0, 0), o(0, 1), o(1, 1), o(1, 2)],
                    [o(0, 1), o(1, 1), o(1, 0), o(2, 0)],
                    [o(1, 2), o(1, 1), o(0, 1), o(0, 0)],
                ],
                // Z-piece
                [
                    [o(0, 0), o(1, 0), o(1, 1), o(2, 1)],
                    [o(0, 2), o(0, 1), o(1, 1), o(1, 0)],
                    [o(2, 1), o(1, 1), o(1, 0), o(0, 0)],
                    [o(1, 0), o(1, 1), o(0, 1), o(0, 2)],
                ],
                // J-piece
                [
                    [o(1, 0), o(1, 1), o(1, 2), o(0, 2)],
                    [o(0, 1), o(1, 1), o(2, 1), o(2, 2)],
                    [o(1, 2), o(1, 1), o(1, 0), o(2, 0)],
                    [o(2, 1), o(1, 1), o(0, 1), o(0, 0)],
                ],
                // L-piece
                [
                    [o(1, 0), o(1, 1), o(1, 2), o(2, 2)],
                    [o(0, 1), o(1, 1), o(2, 1), o(2, 0)],
                    [o(1, 2), o(1, 1), o(1, 0), o(0, 0)],
                    [o(2, 1), o(1, 1), o(0, 1), o(0, 2)],
                ],
                // T-piece
                [
                    [o(1, 0), o(0, 1), o(1, 1), o(2, 1)],
                    [o(0, 1), o(1, 2), o(1, 1), o(1, 0)],
                    [o(1, 2), o(2, 1), o(1, 1), o(0, 1)],
                    [o(2, 1), o(1, 0), o(1, 1), o(1, 2)],
                ],
            ],
        }
    };

    /// Returns the shared standard catalog.
    #[must_use]
    pub fn standard() -> &'static Self {
        &STANDARD_CATALOG
    }

    /// Returns the four relative block offsets of `kind` in `rotation`.
    #[must_use]
    pub fn shape(&self, kind: PieceKind, rotation: Rotation) -> &PieceShape {
        &self.shapes[kind as usize][rotation.index()]
    }

    /// Returns the rotations of `kind` that occupy geometrically distinct cell sets.
    ///
    /// The O-piece has a single distinct rotation; I, S and Z have two. Searching
    /// only these is an optimization: trying all four rotations is always correct.
    #[must_use]
    pub fn distinct_rotations(&self, kind: PieceKind) -> ArrayVec<Rotation, 4> {
        let mut seen: ArrayVec<PieceShape, 4> = ArrayVec::new();
        let mut rotations = ArrayVec::new();
        for rotation in Rotation::ALL {
            let mut cells = *self.shape(kind, rotation);
            cells.sort_unstable();
            if !seen.contains(&cells) {
                seen.push(cells);
                rotations.push(rotation);
            }
        }
        rotations
    }
}

/// Offset of one block relative to its piece anchor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct BlockOffset {
    pub dx: u8,
    pub dy: u8,
}

/// Absolute board coordinate of a block.
///
/// Signed so that candidate positions past the left wall can be represented
/// and rejected by the collision check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub row: i16,
    pub col: i16,
}

impl Position {
    #[must_use]
    pub const fn new(row: i16, col: i16) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn offset(self, d_row: i16, d_col: i16) -> Self {
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

/// A piece in play: kind, rotation, anchor and the four absolute cells.
///
/// Pieces are immutable values. Movement and rotation return new `Piece`
/// instances, so a candidate move never aliases the committed piece.
///
/// # Example
///
/// ```
/// use qtris_engine::{Piece, PieceCatalog, PieceKind};
///
/// let catalog = PieceCatalog::standard();
/// let piece = Piece::spawn(catalog, PieceKind::T, 10);
/// let moved = piece.right();
/// let rotated = moved.rotated_right(catalog);
/// assert_eq!(piece.anchor().col + 1, rotated.anchor().col);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    kind: PieceKind,
    rotation: Rotation,
    anchor: Position,
    cells: [Position; 4],
}

impl Piece {
    #[must_use]
    pub fn new(
        catalog: &PieceCatalog,
        kind: PieceKind,
        rotation: Rotation,
        anchor: Position,
    ) -> Self {
        let shape = *catalog.shape(kind, rotation);
        let cells = shape.map(|o| anchor.offset(i16::from(o.dy), i16::from(o.dx)));
        Self {
            kind,
            rotation,
            anchor,
            cells,
        }
    }

    /// Creates a piece at the spawn anchor: top row, horizontally centered.
    #[must_use]
    pub fn spawn(catalog: &PieceCatalog, kind: PieceKind, board_width: usize) -> Self {
        Self::new(catalog, kind, Rotation::Deg0, spawn_anchor(board_width))
    }

    #[must_use]
    pub fn kind(&self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[must_use]
    pub fn anchor(&self) -> Position {
        self.anchor
    }

    #[must_use]
    pub fn cells(&self) -> &[Position; 4] {
        &self.cells
    }

    #[must_use]
    pub fn occupies(&self, row: i16, col: i16) -> bool {
        self.cells.contains(&Position::new(row, col))
    }

    /// Row index of the lowest block.
    #[must_use]
    pub fn bottom_row(&self) -> i16 {
        self.cells.iter().map(|p| p.row).max().unwrap_or(self.anchor.row)
    }

    /// Leftmost and rightmost occupied columns (inclusive).
    #[must_use]
    pub fn column_span(&self) -> (i16, i16) {
        let min = self.cells.iter().map(|p| p.col).min().unwrap_or(0);
        let max = self.cells.iter().map(|p| p.col).max().unwrap_or(0);
        (min, max)
    }

    #[must_use]
    pub fn moved(&self, d_row: i16, d_col: i16) -> Self {
        Self {
            kind: self.kind,
            rotation: self.rotation,
            anchor: self.anchor.offset(d_row, d_col),
            cells: self.cells.map(|p| p.offset(d_row, d_col)),
        }
    }

    #[must_use]
    pub fn left(&self) -> Self {
        self.moved(0, -1)
    }

    #[must_use]
    pub fn right(&self) -> Self {
        self.moved(0, 1)
    }

    #[must_use]
    pub fn down(&self) -> Self {
        self.moved(1, 0)
    }

    /// Rotates 90° clockwise around the same anchor. No wall kicks are attempted.
    #[must_use]
    pub fn rotated_right(&self, catalog: &PieceCatalog) -> Self {
        Self::new(catalog, self.kind, self.rotation.rotated_right(), self.anchor)
    }
}

impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "kind#degrees@row,col" (e.g., "S#90@4,3")
        write!(
            f,
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.rotation.degrees(),
            self.anchor.row,
            self.anchor.col
        )
    }
}

fn spawn_anchor(board_width: usize) -> Position {
    let col = i16::try_from(board_width / 2).unwrap_or(i16::MAX) - 2;
    Position::new(0, col.max(0))
}

/// Rotation state of a piece, in 90° clockwise steps from the spawn orientation.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    pub const ALL: [Self; 4] = [Self::Deg0, Self::Deg90, Self::Deg180, Self::Deg270];

    #[must_use]
    pub const fn rotated_right(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }

    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    #[must_use]
    pub const fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        PieceKind::ALL[rng.random_range(0..PieceKind::LEN)]
    }
}

/// RGB color used by renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        Self::I,
        Self::O,
        Self::S,
        Self::Z,
        Self::J,
        Self::L,
        Self::T,
    ];

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use qtris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::I.as_char(), 'I');
    /// assert_eq!(PieceKind::T.as_char(), 'T');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use qtris_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('I'), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }

    /// Display color of the piece kind.
    #[must_use]
    pub const fn color(self) -> Rgb {
        match self {
            PieceKind::I => Rgb(0, 255, 255),
            PieceKind::O => Rgb(248, 222, 126),
            PieceKind::S => Rgb(11, 218, 81),
            PieceKind::Z => Rgb(226, 6, 44),
            PieceKind::J => Rgb(0, 47, 167),
            PieceKind::L => Rgb(226, 88, 34),
            PieceKind::T => Rgb(143, 0, 255),
        }
    }
}
