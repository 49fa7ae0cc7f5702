//! # Text Styling Model
//!
//! Print mode flags, character sizes and justification, plus the glyph
//! geometry each combination implies.
//!
//! ## Print Mode Byte (ESC ! n)
//!
//! | Bit | Flag | Effect |
//! |-----|------|--------|
//! | 1 | Inverse | White on black |
//! | 2 | Upside down | 180° rotation |
//! | 3 | Bold | Emphasized |
//! | 4 | Double height | 48-dot glyphs |
//! | 5 | Double width | 16 columns per line |
//! | 6 | Strike | Strike-through |
//! | 7 | Underline | Underlined |
//!
//! ## Geometry
//!
//! ```text
//! normal          24 dots tall, 32 columns
//! double height   48 dots tall, 32 columns
//! double width    24 dots tall, 16 columns
//! ```

use std::ops::{BitOr, BitOrAssign};

use crate::error::TermicaError;

/// Glyph height in normal mode (dots)
pub const CHAR_HEIGHT: u8 = 24;

/// Glyph height with double height (dots)
pub const DOUBLE_CHAR_HEIGHT: u8 = 48;

/// Columns per line in normal mode
pub const MAX_COLUMN: u8 = 32;

/// Columns per line with double width
pub const DOUBLE_WIDTH_MAX_COLUMN: u8 = 16;

// ============================================================================
// PRINT MODE
// ============================================================================

/// Set of print mode flags, sent as one `ESC ! n` byte.
///
/// ```
/// use termica::protocol::text::PrintMode;
///
/// let mode = PrintMode::BOLD | PrintMode::DOUBLE_WIDTH;
/// assert!(mode.contains(PrintMode::BOLD));
/// assert_eq!(mode.bits(), 0b0010_1000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrintMode(u8);

impl PrintMode {
    pub const INVERSE: Self = Self(1 << 1);
    pub const UPSIDE_DOWN: Self = Self(1 << 2);
    pub const BOLD: Self = Self(1 << 3);
    pub const DOUBLE_HEIGHT: Self = Self(1 << 4);
    pub const DOUBLE_WIDTH: Self = Self(1 << 5);
    pub const STRIKE: Self = Self(1 << 6);
    pub const UNDERLINE: Self = Self(1 << 7);

    /// No flags set
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every defined flag
    #[inline]
    pub const fn all() -> Self {
        Self(0b1111_1110)
    }

    /// Build from a raw mode byte, dropping the unused bit 0.
    #[inline]
    pub const fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::all().0)
    }

    /// The mode byte as sent to the printer
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    #[inline]
    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for PrintMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for PrintMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Glyph height and wrap column implied by a print mode.
///
/// Returns `(char_height, max_column)`.
///
/// ```
/// use termica::protocol::text::{derive_geometry, PrintMode};
///
/// assert_eq!(derive_geometry(PrintMode::empty()), (24, 32));
/// assert_eq!(derive_geometry(PrintMode::DOUBLE_HEIGHT | PrintMode::DOUBLE_WIDTH), (48, 16));
/// ```
pub fn derive_geometry(mode: PrintMode) -> (u8, u8) {
    let char_height = if mode.contains(PrintMode::DOUBLE_HEIGHT) {
        DOUBLE_CHAR_HEIGHT
    } else {
        CHAR_HEIGHT
    };
    let max_column = if mode.contains(PrintMode::DOUBLE_WIDTH) {
        DOUBLE_WIDTH_MAX_COLUMN
    } else {
        MAX_COLUMN
    };
    (char_height, max_column)
}

// ============================================================================
// CHARACTER SIZE
// ============================================================================

/// Character sizes selectable with `GS ! n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Size {
    /// Normal glyphs
    #[default]
    Small,
    /// Double height
    Medium,
    /// Double height and double width
    Large,
}

impl Size {
    /// Device size code
    pub const fn code(self) -> u8 {
        match self {
            Self::Small => 0x00,
            Self::Medium => 0x01,
            Self::Large => 0x11,
        }
    }

    /// `(char_height, max_column)` after selecting this size
    pub const fn geometry(self) -> (u8, u8) {
        match self {
            Self::Small => (CHAR_HEIGHT, MAX_COLUMN),
            Self::Medium => (DOUBLE_CHAR_HEIGHT, MAX_COLUMN),
            Self::Large => (DOUBLE_CHAR_HEIGHT, DOUBLE_WIDTH_MAX_COLUMN),
        }
    }

    /// Parse a size letter: `L`, `M` or `S` (any case).
    pub fn from_code(code: char) -> Result<Self, TermicaError> {
        match code.to_ascii_uppercase() {
            'L' => Ok(Self::Large),
            'M' => Ok(Self::Medium),
            'S' => Ok(Self::Small),
            other => Err(TermicaError::InvalidCommand(format!(
                "Unknown size '{}', expected L, M or S",
                other
            ))),
        }
    }
}

impl std::str::FromStr for Size {
    type Err = TermicaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_code(c),
            _ => Err(TermicaError::InvalidCommand(format!(
                "Unknown size '{}', expected L, M or S",
                s
            ))),
        }
    }
}

// ============================================================================
// JUSTIFICATION
// ============================================================================

/// Line justification for `ESC a n`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justify {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Justify {
    /// Parse a justification letter: `L`, `C` or `R` (any case).
    pub fn from_code(code: char) -> Result<Self, TermicaError> {
        match code.to_ascii_uppercase() {
            'L' => Ok(Self::Left),
            'C' => Ok(Self::Center),
            'R' => Ok(Self::Right),
            other => Err(TermicaError::InvalidCommand(format!(
                "Unknown justification '{}', expected L, C or R",
                other
            ))),
        }
    }
}

impl std::str::FromStr for Justify {
    type Err = TermicaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self::from_code(c),
            _ => Err(TermicaError::InvalidCommand(format!(
                "Unknown justification '{}', expected L, C or R",
                s
            ))),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
