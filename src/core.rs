//! Primitives shared between the table and its callers: the 64-bit position
//! fingerprint and a compact move representation.
//!
//! The table never interprets a move; it stores the value it was given and
//! hands it back on a probe hit. Keeping the representation a packed integer
//! (rather than a reference into the search tree) means a cached move stays
//! valid for as long as the record does.

use std::fmt::{self, Write as _};
use std::mem;

use anyhow::bail;
use itertools::Itertools;

#[allow(missing_docs)]
pub const BOARD_WIDTH: u8 = 8;
#[allow(missing_docs)]
pub const BOARD_SIZE: u8 = BOARD_WIDTH * BOARD_WIDTH;

/// Position fingerprints are 64-bit unsigned integers deterministically
/// derived from a game position (e.g. by Zobrist hashing). They are computed
/// by the caller and opaque to the table: the low bits select a bucket, the
/// full value disambiguates entries within it.
///
/// Key `0` is reserved as the empty-slot sentinel, see
/// [`crate::transposition::TranspositionTable`].
pub type Key = u64;

bitflags::bitflags! {
    /// Kind bits of a packed [`Move`], following a common [Move Encoding]
    /// technique:
    ///
    /// | Index | Promotion | Capture | MSB Special | LSB Special | Move Kind |
    /// | ----- | --------- | ------- | ----------- | ----------- | --------- |
    /// | 0  | 0 | 0 | 0 | 0 | Quiet move |
    /// | 1  | 0 | 0 | 0 | 1 | Double pawn push |
    /// | 2  | 0 | 0 | 1 | 0 | Kingside castle (short castle or O-O) |
    /// | 3  | 0 | 0 | 1 | 1 | Queenside castle (long castle or O-O-O) |
    /// | 4  | 0 | 1 | 0 | 0 | Capture |
    /// | 5  | 0 | 1 | 0 | 1 | En Passant capture |
    /// | 8  | 1 | 0 | 0 | 0 | Knight promotion |
    /// | 9  | 1 | 0 | 0 | 1 | Bishop promotion |
    /// | 10 | 1 | 0 | 1 | 0 | Rook promotion |
    /// | 11 | 1 | 0 | 1 | 1 | Queen promotion |
    /// | 12 | 1 | 1 | 0 | 0 | Capture and knight promotion |
    /// | 13 | 1 | 1 | 0 | 1 | Capture and bishop promotion |
    /// | 14 | 1 | 1 | 1 | 0 | Capture and rook promotion |
    /// | 15 | 1 | 1 | 1 | 1 | Capture and queen promotion |
    ///
    /// The nibble occupies the upper 4 bits of the packed move. Flags other
    /// than promotion are set by the move generator and carried verbatim.
    ///
    /// [Move Encoding]: https://www.chessprogramming.org/Encoding_Moves
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct MoveAttributes: u8 {
        /// Moves that do not change the material balance.
        const QUIET = 0;

        /// Implementation detail.
        const MSB_SPECIAL = 0b0010;
        /// Implementation detail.
        const LSB_SPECIAL = 0b0001;

        /// Pawn advancement by 2 squares from the original rank.
        const DOUBLE_PAWN_PUSH = Self::LSB_SPECIAL.bits();
        /// Short castle or O-O.
        const KINGSIDE_CASTLE = Self::MSB_SPECIAL.bits();
        /// Long castle or O-O-O.
        const QUEENSIDE_CASTLE = Self::MSB_SPECIAL.bits() | Self::LSB_SPECIAL.bits();

        /// Moves that change the material balance.
        const CAPTURE = 0b0100;

        /// Pawn move to the opponent's "home" rank.
        const PROMOTION = 0b1000;

        /// Pawn promotion to a knight.
        const KNIGHT_PROMOTION = Self::PROMOTION.bits();
        /// Pawn promotion to a bishop.
        const BISHOP_PROMOTION = Self::PROMOTION.bits() | Self::LSB_SPECIAL.bits();
        /// Pawn promotion to a rook.
        const ROOK_PROMOTION = Self::PROMOTION.bits() | Self::MSB_SPECIAL.bits();
        /// Pawn promotion to a queen.
        const QUEEN_PROMOTION = Self::PROMOTION.bits()
            | Self::MSB_SPECIAL.bits()
            | Self::LSB_SPECIAL.bits();
    }
}

/// A move packed into 16 bits: 6 bits for the origin square, 6 bits for the
/// destination square and a 4-bit [`MoveAttributes`] nibble.
///
/// This is a value type with no ties to the position or the search tree the
/// move was found in. A [`TranspositionTable`] record stores it by value and
/// a probed move must therefore be legality-checked by the caller before use:
/// the record it came from may describe a colliding position.
///
/// [`TranspositionTable`]: crate::transposition::TranspositionTable
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Move(u16);

impl Move {
    const ATTRIBUTES_SHIFT: u16 = 12;
    const SQUARE_MASK: u16 = 0b11_1111;
    const TO_SHIFT: u16 = 6;

    /// Packs origin, destination and an optional promotion into a quiet move.
    /// Capture and castle bits are the move generator's business; use
    /// [`Move::with_attributes`] to carry them.
    #[must_use]
    pub const fn new(from: Square, to: Square, promotion: Option<Promotion>) -> Self {
        let attributes = match promotion {
            Some(Promotion::Knight) => MoveAttributes::KNIGHT_PROMOTION,
            Some(Promotion::Bishop) => MoveAttributes::BISHOP_PROMOTION,
            Some(Promotion::Rook) => MoveAttributes::ROOK_PROMOTION,
            Some(Promotion::Queen) => MoveAttributes::QUEEN_PROMOTION,
            None => MoveAttributes::QUIET,
        };
        Self::with_attributes(from, to, attributes)
    }

    /// Packs origin, destination and a full attribute nibble.
    #[must_use]
    pub const fn with_attributes(from: Square, to: Square, attributes: MoveAttributes) -> Self {
        Self(
            from as u16
                | ((to as u16) << Self::TO_SHIFT)
                | ((attributes.bits() as u16) << Self::ATTRIBUTES_SHIFT),
        )
    }

    /// Parses a move in [UCI format], e.g. `e2e4` or `e7e8q`. Capture and
    /// castle attributes cannot be recovered from the string and are left
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid UCI move.
    ///
    /// [UCI format]: http://wbec-ridderkerk.nl/html/UCIProtocol.html
    pub fn from_uci(uci: &str) -> anyhow::Result<Self> {
        if !uci.is_ascii() || (uci.len() != 4 && uci.len() != 5) {
            bail!(
                "UCI move should be 4 or 5 ASCII chars, got {} in '{uci}'",
                uci.len()
            );
        }
        let from = Square::try_from(&uci[0..2])?;
        let to = Square::try_from(&uci[2..4])?;
        let promotion = match uci.chars().nth(4) {
            Some(promotion) => Some(Promotion::try_from(promotion)?),
            None => None,
        };
        Ok(Self::new(from, to, promotion))
    }

    /// Origin square.
    #[must_use]
    pub fn from(self) -> Square {
        Square::try_from((self.0 & Self::SQUARE_MASK) as u8)
            .expect("6 bits always hold a valid square index")
    }

    /// Destination square.
    #[must_use]
    pub fn to(self) -> Square {
        Square::try_from(((self.0 >> Self::TO_SHIFT) & Self::SQUARE_MASK) as u8)
            .expect("6 bits always hold a valid square index")
    }

    /// Attribute nibble.
    #[must_use]
    pub const fn attributes(self) -> MoveAttributes {
        MoveAttributes::from_bits_truncate((self.0 >> Self::ATTRIBUTES_SHIFT) as u8)
    }

    /// Promotion piece decoded from the attribute nibble, if any.
    #[must_use]
    pub fn promotion(self) -> Option<Promotion> {
        let attributes = self.attributes();
        if !attributes.contains(MoveAttributes::PROMOTION) {
            return None;
        }
        let special = attributes & (MoveAttributes::MSB_SPECIAL | MoveAttributes::LSB_SPECIAL);
        Some(match special.bits() {
            0b0000 => Promotion::Knight,
            0b0001 => Promotion::Bishop,
            0b0010 => Promotion::Rook,
            _ => Promotion::Queen,
        })
    }

    /// Raw packed representation.
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Move {
    /// Serializes a move in UCI format.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from(), self.to())?;
        if let Some(promotion) = self.promotion() {
            write!(f, "{promotion}")?;
        }
        Ok(())
    }
}

/// Board squares: from left to right, from bottom to the top:
///
/// ```
/// use ttable::core::Square;
///
/// assert_eq!(Square::A1 as u8, 0);
/// assert_eq!(Square::E1 as u8, 4);
/// assert_eq!(Square::H1 as u8, 7);
/// assert_eq!(Square::A4 as u8, 8 * 3);
/// assert_eq!(Square::H8 as u8, 63);
/// ```
///
/// Square is a compact representation using only one byte.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[rustfmt::skip]
#[allow(missing_docs)]
pub enum Square {
    A1, B1, C1, D1, E1, F1, G1, H1,
    A2, B2, C2, D2, E2, F2, G2, H2,
    A3, B3, C3, D3, E3, F3, G3, H3,
    A4, B4, C4, D4, E4, F4, G4, H4,
    A5, B5, C5, D5, E5, F5, G5, H5,
    A6, B6, C6, D6, E6, F6, G6, H6,
    A7, B7, C7, D7, E7, F7, G7, H7,
    A8, B8, C8, D8, E8, F8, G8, H8,
}

impl Square {
    /// Connects file (column) and rank (row) to form a full square.
    #[must_use]
    pub const fn new(file: File, rank: Rank) -> Self {
        unsafe { mem::transmute(file as u8 + (rank as u8) * BOARD_WIDTH) }
    }

    /// Returns file (column) on which the square is located.
    #[must_use]
    pub const fn file(self) -> File {
        unsafe { mem::transmute(self as u8 % BOARD_WIDTH) }
    }

    /// Returns rank (row) on which the square is located.
    #[must_use]
    pub const fn rank(self) -> Rank {
        unsafe { mem::transmute(self as u8 / BOARD_WIDTH) }
    }
}

impl TryFrom<u8> for Square {
    type Error = anyhow::Error;

    /// Creates a square given its position on the board.
    ///
    /// # Errors
    ///
    /// If given square index is outside 0..[`BOARD_SIZE`] range.
    fn try_from(square_index: u8) -> anyhow::Result<Self> {
        // Exclusive range patterns are not allowed:
        // https://github.com/rust-lang/rust/issues/37854
        const MAX_INDEX: u8 = BOARD_SIZE - 1;
        match square_index {
            0..=MAX_INDEX => Ok(unsafe { mem::transmute::<u8, Self>(square_index) }),
            _ => bail!("square index should be in 0..BOARD_SIZE, got {square_index}"),
        }
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;

    fn try_from(square: &str) -> anyhow::Result<Self> {
        let (file, rank) = match square.chars().collect_tuple() {
            Some((file, rank)) => (file, rank),
            None => bail!(
                "square should be two-char, got {square} with {} chars",
                square.bytes().len()
            ),
        };
        Ok(Self::new(file.try_into()?, rank.try_into()?))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file(), self.rank())
    }
}

/// Represents a column (vertical row) of the chessboard. In chess notation,
/// it is normally represented with a lowercase letter.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum File {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
}

impl TryFrom<char> for File {
    type Error = anyhow::Error;

    fn try_from(file: char) -> anyhow::Result<Self> {
        match file {
            'a'..='h' => Ok(unsafe { mem::transmute::<u8, Self>(file as u8 - b'a') }),
            _ => bail!("file should be within 'a'..='h', got '{file}'"),
        }
    }
}

impl fmt::Display for File {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char((b'a' + *self as u8) as char)
    }
}

/// Represents a horizontal row of the chessboard, numbered from White's side.
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum Rank {
    One = 0,
    Two = 1,
    Three = 2,
    Four = 3,
    Five = 4,
    Six = 5,
    Seven = 6,
    Eight = 7,
}

impl TryFrom<char> for Rank {
    type Error = anyhow::Error;

    fn try_from(rank: char) -> anyhow::Result<Self> {
        match rank {
            '1'..='8' => Ok(unsafe { mem::transmute::<u8, Self>(rank as u8 - b'1') }),
            _ => bail!("rank should be within '1'..='8', got '{rank}'"),
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8 + 1)
    }
}

/// Pieces a pawn can promote to.
#[allow(missing_docs)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Promotion {
    Knight,
    Bishop,
    Rook,
    Queen,
}

impl TryFrom<char> for Promotion {
    type Error = anyhow::Error;

    fn try_from(promotion: char) -> anyhow::Result<Self> {
        match promotion {
            'n' => Ok(Self::Knight),
            'b' => Ok(Self::Bishop),
            'r' => Ok(Self::Rook),
            'q' => Ok(Self::Queen),
            _ => bail!("promotion should be one of 'nbrq', got '{promotion}'"),
        }
    }
}

impl fmt::Display for Promotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char(match self {
            Self::Knight => 'n',
            Self::Bishop => 'b',
            Self::Rook => 'r',
            Self::Queen => 'q',
        })
    }
}
