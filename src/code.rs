//! Filename-embedded category codes.
//!
//! Images and labels carry their cap group in the filename as `_b<digit>_`,
//! e.g. `cap_b4_017.jpg`. This module extracts that code and maps it onto the
//! fixed set of split categories.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `_b<digit>_` with an ASCII digit.
static CODE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_b([0-9])_").expect("Invalid b-code regex"));

/// A single-digit code (`b0`..`b9`) extracted from a filename.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BCode(u8);

impl BCode {
    /// Creates a code from a digit in `0..=9`.
    pub fn new(digit: u8) -> Option<Self> {
        (digit <= 9).then_some(Self(digit))
    }

    /// The digit carried by this code.
    pub fn digit(self) -> u8 {
        self.0
    }
}

impl fmt::Display for BCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "b{}", self.0)
    }
}

impl FromStr for BCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.as_bytes() {
            [b'b', d] if d.is_ascii_digit() => Ok(Self(d - b'0')),
            _ => Err(format!("invalid b-code '{s}'; expected 'b' followed by one digit")),
        }
    }
}

impl Serialize for BCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Extract the first `_b<digit>_` code from a filename.
///
/// Returns `None` when the pattern is absent.
pub fn extract_code(file_name: &str) -> Option<BCode> {
    let digit = CODE_REGEX.captures(file_name)?.get(1)?;
    digit.as_str().parse().ok().and_then(BCode::new)
}

/// The fixed split categories.
///
/// Declaration order is the order buckets are processed and reported in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    OtherB2,
    OtherB3,
    LightblueB4,
    DarkblueB5,
}

impl Category {
    /// All categories in processing order.
    pub const ALL: [Category; 4] = [
        Category::OtherB2,
        Category::OtherB3,
        Category::LightblueB4,
        Category::DarkblueB5,
    ];

    /// Map a code onto its category, if it has one.
    pub fn from_code(code: BCode) -> Option<Self> {
        match code.digit() {
            2 => Some(Category::OtherB2),
            3 => Some(Category::OtherB3),
            4 => Some(Category::LightblueB4),
            5 => Some(Category::DarkblueB5),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::OtherB2 => "other_b2",
            Category::OtherB3 => "other_b3",
            Category::LightblueB4 => "lightblue_b4",
            Category::DarkblueB5 => "darkblue_b5",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_code_finds_first_match() {
        assert_eq!(extract_code("img_b2_123.txt"), BCode::new(2));
        assert_eq!(extract_code("abc_b5_.txt"), BCode::new(5));
        assert_eq!(extract_code("test_b9_1.txt"), BCode::new(9));
        assert_eq!(extract_code("x_b3_y_b4_z.jpg"), BCode::new(3));
    }

    #[test]
    fn extract_code_rejects_non_matching_names() {
        assert_eq!(extract_code("wrongpattern.txt"), None);
        assert_eq!(extract_code("cap_b12_1.txt"), None);
        assert_eq!(extract_code("cap_B2_1.txt"), None);
        assert_eq!(extract_code("cap_b2.txt"), None);
        assert_eq!(extract_code(""), None);
    }

    #[test]
    fn extract_code_accepts_only_ascii_digits() {
        assert_eq!(extract_code("cap_b\u{0663}_1.jpg"), None);
        assert_eq!(extract_code("cap_b\u{FF14}_1.jpg"), None);
        assert_eq!(extract_code("cap_b\u{0663}_x_b4_1.jpg"), BCode::new(4));
    }

    #[test]
    fn code_displays_with_prefix() {
        let code = extract_code("img_b2_123.txt").expect("code present");
        assert_eq!(code.to_string(), "b2");
    }

    #[test]
    fn code_parses_from_display_form() {
        assert_eq!("b7".parse::<BCode>(), Ok(BCode(7)));
        assert!("b".parse::<BCode>().is_err());
        assert!("b10".parse::<BCode>().is_err());
        assert!("x2".parse::<BCode>().is_err());
    }

    #[test]
    fn only_four_codes_have_categories() {
        let mapped: Vec<_> = (0..=9)
            .filter_map(BCode::new)
            .filter_map(Category::from_code)
            .collect();
        assert_eq!(mapped, Category::ALL.to_vec());
        assert_eq!(Category::LightblueB4.to_string(), "lightblue_b4");
    }
}
