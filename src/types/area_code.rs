use std::sync::Arc;

/// Administrative hierarchy levels addressable by a code prefix.
///
/// Prefix lengths follow JIS X 0401/0402 and the e-Stat small-area key:
/// 2-digit prefecture, 5-digit municipality, then 4 more digits for the
/// town/aza block and 2 more for the chome.
///
/// Variants are declared broadest-first, so the derived order runs from
/// `Prefecture` down to `District`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AreaLevel {
    Prefecture, // Highest-level entity
    City,       // City/ward -> Prefecture
    SubArea,    // Town/aza -> City
    District,   // Chome -> SubArea
}

impl AreaLevel {
    /// Code prefix length for this level.
    pub fn prefix_len(self) -> usize {
        match self {
            AreaLevel::Prefecture => 2,
            AreaLevel::City => 5,
            AreaLevel::SubArea => 9,
            AreaLevel::District => 11,
        }
    }

    /// The level whose prefix length matches `len` exactly.
    pub fn from_len(len: usize) -> Option<AreaLevel> {
        match len {
            2 => Some(AreaLevel::Prefecture),
            5 => Some(AreaLevel::City),
            9 => Some(AreaLevel::SubArea),
            11 => Some(AreaLevel::District),
            _ => None,
        }
    }
}

/// Stable key for an administrative area at any level.
/// Keeps the original code text (with leading zeros) but avoids repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AreaCode {
    pub level: AreaLevel,
    pub code: Arc<str>, // e.g., "13101" for a ward, "131010010" for a town block
}

impl AreaCode {
    pub fn new(level: AreaLevel, code: &str) -> Self {
        Self { level, code: Arc::from(code) }
    }

    /// Parse a bare code string, inferring the level from its length.
    /// Returns `None` for lengths that match no administrative level.
    pub fn from_code(code: &str) -> Option<Self> {
        AreaLevel::from_len(code.len()).map(|level| Self::new(level, code))
    }

    /// Returns a new `AreaCode` corresponding to the enclosing `AreaLevel`
    /// by truncating this code to the parent prefix length.
    pub fn to_parent(&self, parent_level: AreaLevel) -> AreaCode {
        let len = parent_level.prefix_len();

        // If the code is shorter than expected, just take the full code.
        let prefix: Arc<str> = Arc::from(&self.code[..self.code.len().min(len)]);

        AreaCode { level: parent_level, code: prefix }
    }
}

/// Restore leading zeros a numeric CSV parse may have stripped, padding the
/// code up to the nearest valid prefix length ("1101" -> "01101").
/// Codes already at a valid length pass through untouched.
pub fn pad_code(code: &str) -> String {
    let len = code.len();
    if AreaLevel::from_len(len).is_some() {
        return code.to_string();
    }
    let target = [2usize, 5, 9, 11].into_iter().find(|&t| t > len);
    match target {
        Some(width) => format!("{code:0>width$}"),
        None => code.to_string(),
    }
}
