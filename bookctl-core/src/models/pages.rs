//! Page count with its external text form: `"<n> pages"`.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

/// Exactly one ASCII digit run, one space, then the literal unit.
static PAGES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+) pages$").expect("invalid pages regex"));

/// Decoding a `Pages` value from anything other than `"<n> pages"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid pages format")]
pub struct InvalidPagesFormat;

/// Number of pages in a book.
///
/// Stored as a plain integer; rendered as `"<n> pages"` whenever it leaves
/// the process as text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pages(i32);

impl Pages {
    pub const fn new(count: i32) -> Self {
        Self(count)
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl From<i32> for Pages {
    fn from(count: i32) -> Self {
        Self(count)
    }
}

impl fmt::Display for Pages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} pages", self.0)
    }
}

impl FromStr for Pages {
    type Err = InvalidPagesFormat;

    /// Accepts only `"<digits> pages"`. Signs, extra whitespace, a missing
    /// space, the singular unit, and counts beyond `i32::MAX` are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = PAGES_RE.captures(s).ok_or(InvalidPagesFormat)?;
        caps[1]
            .parse::<i32>()
            .map(Self)
            .map_err(|_| InvalidPagesFormat)
    }
}

impl Serialize for Pages {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct PagesVisitor;

impl Visitor<'_> for PagesVisitor {
    type Value = Pages;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string of the form \"<n> pages\"")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Pages, E> {
        v.parse().map_err(E::custom)
    }

    fn visit_i64<E: de::Error>(self, _: i64) -> Result<Pages, E> {
        Err(E::custom(InvalidPagesFormat))
    }

    fn visit_u64<E: de::Error>(self, _: u64) -> Result<Pages, E> {
        Err(E::custom(InvalidPagesFormat))
    }

    fn visit_f64<E: de::Error>(self, _: f64) -> Result<Pages, E> {
        Err(E::custom(InvalidPagesFormat))
    }
}

impl<'de> Deserialize<'de> for Pages {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PagesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_with_unit() {
        assert_eq!(Pages::new(321).to_string(), "321 pages");
    }

    #[test]
    fn parses_exact_form() {
        assert_eq!("10 pages".parse::<Pages>(), Ok(Pages::new(10)));
        assert_eq!("0 pages".parse::<Pages>(), Ok(Pages::new(0)));
    }

    #[test]
    fn rejects_malformed_text() {
        for bad in [
            "10pages",
            "10 page",
            "10  pages",
            " 10 pages",
            "10 pages ",
            "-3 pages",
            "+3 pages",
            "ten pages",
            "1.5 pages",
            "pages",
            "",
            "99999999999 pages",
        ] {
            assert_eq!(bad.parse::<Pages>(), Err(InvalidPagesFormat), "{:?}", bad);
        }
    }

    #[test]
    fn json_is_a_quoted_string() {
        let json = serde_json::to_string(&Pages::new(42)).unwrap();
        assert_eq!(json, r#""42 pages""#);

        let back: Pages = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Pages::new(42));
    }

    #[test]
    fn json_rejects_bare_numbers() {
        let err = serde_json::from_str::<Pages>("42").unwrap_err();
        assert!(err.to_string().contains("invalid pages format"));
    }
}
