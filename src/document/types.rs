//! Document data types

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// 1-based page number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageNumber(NonZeroU32);

/// Why a raw page string was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageNumberError {
    /// Not an integer at all
    NotANumber,
    /// An integer, but below 1
    BelowOne,
    /// A positive integer beyond any addressable page
    TooLarge,
}

impl PageNumber {
    pub fn new(page: u32) -> Option<Self> {
        NonZeroU32::new(page).map(Self)
    }

    /// Parse a page number as it arrives from a URL path segment
    pub fn parse(raw: &str) -> Result<Self, PageNumberError> {
        let raw = raw.trim();
        let digits = raw.strip_prefix('+').unwrap_or(raw);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return match raw.strip_prefix('-') {
                Some(rest) if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) => {
                    Err(PageNumberError::BelowOne)
                }
                _ => Err(PageNumberError::NotANumber),
            };
        }
        match digits.parse::<u32>() {
            Ok(value) => Self::new(value).ok_or(PageNumberError::BelowOne),
            Err(_) => Err(PageNumberError::TooLarge),
        }
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }

    /// 0-based index for engine calls
    pub fn index(self) -> usize {
        (self.get() - 1) as usize
    }
}

impl fmt::Display for PageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Natural page size in PDF points (72 per inch)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_number() {
        assert_eq!(PageNumber::parse("1").unwrap().get(), 1);
        assert_eq!(PageNumber::parse(" 42 ").unwrap().index(), 41);
        assert_eq!(PageNumber::parse("abc"), Err(PageNumberError::NotANumber));
        assert_eq!(PageNumber::parse("1.5"), Err(PageNumberError::NotANumber));
        assert_eq!(PageNumber::parse(""), Err(PageNumberError::NotANumber));
        assert_eq!(PageNumber::parse("0"), Err(PageNumberError::BelowOne));
        assert_eq!(PageNumber::parse("-3"), Err(PageNumberError::BelowOne));
        assert_eq!(PageNumber::parse("-99999999999"), Err(PageNumberError::BelowOne));
        assert_eq!(PageNumber::parse("99999999999"), Err(PageNumberError::TooLarge));
        assert_eq!(PageNumber::parse("4294967296"), Err(PageNumberError::TooLarge));
        assert_eq!(PageNumber::parse("4294967295").unwrap().get(), u32::MAX);
    }

    #[test]
    fn test_page_number_display() {
        assert_eq!(PageNumber::new(7).unwrap().to_string(), "7");
        assert!(PageNumber::new(0).is_none());
    }
}
