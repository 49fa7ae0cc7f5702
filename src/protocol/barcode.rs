//! # Barcode Symbologies
//!
//! Symbology ids accepted by `GS k m`. The payload itself is sent as-is;
//! checking it against each symbology's alphabet is left to the printer.
//!
//! | Id | Symbology |
//! |----|-----------|
//! | 0 | UPC-A |
//! | 1 | UPC-E |
//! | 2 | EAN-13 |
//! | 3 | EAN-8 |
//! | 4 | Code 39 |
//! | 5 | Interleaved 2 of 5 |
//! | 6 | Codabar |
//! | 7 | Code 93 |
//! | 8 | Code 128 |
//! | 9 | Code 11 |
//! | 10 | MSI |

use crate::error::TermicaError;

/// Barcode symbology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BarcodeType {
    UpcA = 0,
    UpcE = 1,
    Ean13 = 2,
    Ean8 = 3,
    Code39 = 4,
    Itf = 5,
    Codabar = 6,
    Code93 = 7,
    Code128 = 8,
    Code11 = 9,
    Msi = 10,
}

impl BarcodeType {
    /// Every symbology, in id order
    pub const ALL: [Self; 11] = [
        Self::UpcA,
        Self::UpcE,
        Self::Ean13,
        Self::Ean8,
        Self::Code39,
        Self::Itf,
        Self::Codabar,
        Self::Code93,
        Self::Code128,
        Self::Code11,
        Self::Msi,
    ];

    /// Device id sent after `GS k`
    #[inline]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Short lowercase name, as accepted by [`BarcodeType::from_name`]
    pub const fn name(self) -> &'static str {
        match self {
            Self::UpcA => "upc-a",
            Self::UpcE => "upc-e",
            Self::Ean13 => "ean13",
            Self::Ean8 => "ean8",
            Self::Code39 => "code39",
            Self::Itf => "itf",
            Self::Codabar => "codabar",
            Self::Code93 => "code93",
            Self::Code128 => "code128",
            Self::Code11 => "code11",
            Self::Msi => "msi",
        }
    }

    /// Look up a symbology by name (case-insensitive).
    pub fn from_name(name: &str) -> Result<Self, TermicaError> {
        let lower = name.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == lower)
            .ok_or_else(|| {
                TermicaError::InvalidCommand(format!("Unknown barcode type '{}'", name))
            })
    }
}

impl TryFrom<u8> for BarcodeType {
    type Error = TermicaError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL.get(id as usize).copied().ok_or_else(|| {
            TermicaError::InvalidCommand(format!(
                "Barcode type {} out of range (0-{})",
                id,
                Self::ALL.len() - 1
            ))
        })
    }
}

impl std::str::FromStr for BarcodeType {
    type Err = TermicaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.parse::<u8>() {
            Ok(id) => Self::try_from(id),
            Err(_) => Self::from_name(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_position() {
        for (i, kind) in BarcodeType::ALL.iter().enumerate() {
            assert_eq!(kind.id() as usize, i);
        }
    }

    #[test]
    fn test_try_from_range() {
        assert_eq!(BarcodeType::try_from(8).unwrap(), BarcodeType::Code128);
        assert_eq!(BarcodeType::try_from(10).unwrap(), BarcodeType::Msi);
        assert!(matches!(
            BarcodeType::try_from(11),
            Err(TermicaError::InvalidCommand(_))
        ));
    }

    #[test]
    fn test_parse_name_or_id() {
        assert_eq!("CODE39".parse::<BarcodeType>().unwrap(), BarcodeType::Code39);
        assert_eq!("2".parse::<BarcodeType>().unwrap(), BarcodeType::Ean13);
        assert!("qr".parse::<BarcodeType>().is_err());
        assert!("200".parse::<BarcodeType>().is_err());
    }
}
