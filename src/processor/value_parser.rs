//! Free-text to number conversions.
//!
//! Two families live here. The listing parsers run on raw page text while
//! scraping and only strip separators. The dataset parsers run on CSV columns
//! before training and also understand magnitude words.

use regex::Regex;
use std::str::FromStr;
use std::sync::LazyLock;

static DECIMAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("decimal pattern"));

// A number followed by the unit token, or standing at the very end.
static LISTING_AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)(?:\s*м2|\s*$)").expect("listing area pattern")
});

static DATASET_AREA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*м[2²]?").expect("dataset area pattern")
});

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("digits pattern"));

const MILLION_WORD: &str = "сая";
const CURRENCY_WORD: &str = "төгрөг";

fn first_decimal(pattern: &Regex, text: &str) -> Option<f64> {
    pattern
        .captures(text)
        .and_then(|captures| captures.get(1))
        .and_then(|number| f64::from_str(number.as_str()).ok())
}

fn strip_separators(text: &str) -> String {
    text.replace(',', "").replace('₮', "").trim().to_string()
}

/// Price as shown on a listing page, e.g. `"1,234,500₮"`
pub fn parse_listing_price(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    first_decimal(&DECIMAL, &strip_separators(text))
}

/// Value of the area field on a listing page, e.g. `"80 мкв"`
pub fn parse_listing_area(text: &str) -> Option<f64> {
    if text.is_empty() {
        return None;
    }
    let unified = text
        .to_lowercase()
        .replace("мкв", "м2")
        .replace("м.кв", "м2")
        .replace("м²", "м2");
    first_decimal(&LISTING_AREA, &unified)
}

/// Price cell from a dataset; `сая` multiplies by a million
pub fn parse_price(text: &str) -> Option<f64> {
    let mut cleaned = strip_separators(text).to_lowercase();
    if cleaned.is_empty() {
        return None;
    }

    let mut multiplier = 1.0;
    if cleaned.contains(MILLION_WORD) {
        multiplier = 1_000_000.0;
        cleaned = cleaned.replace(MILLION_WORD, "").trim().to_string();
    } else if cleaned.contains(CURRENCY_WORD) {
        cleaned = cleaned.replace(CURRENCY_WORD, "").trim().to_string();
    }

    first_decimal(&DECIMAL, &cleaned).map(|value| value * multiplier)
}

/// Area cell from a dataset: the number right before an `м` unit
pub fn parse_area(text: &str) -> Option<f64> {
    first_decimal(&DATASET_AREA, &text.to_lowercase())
}

/// First run of digits, e.g. floor counts or the year built
pub fn parse_int(text: &str) -> Option<i64> {
    DIGITS
        .find(text)
        .and_then(|digits| i64::from_str(digits.as_str()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_price() {
        assert_eq!(parse_listing_price("1,234,500₮"), Some(1_234_500.0));
        assert_eq!(parse_listing_price("  350,000,000 ₮ "), Some(350_000_000.0));
        assert_eq!(parse_listing_price("2.5 сая ₮"), Some(2.5));
        assert_eq!(parse_listing_price("Үнэ тохиролцоно"), None);
        assert_eq!(parse_listing_price(""), None);
    }

    #[test]
    fn test_listing_area_unit_spellings() {
        assert_eq!(parse_listing_area("80 мкв"), Some(80.0));
        assert_eq!(parse_listing_area("80м.кв"), Some(80.0));
        assert_eq!(parse_listing_area("80м²"), Some(80.0));
        assert_eq!(parse_listing_area("65.5 М2"), Some(65.5));
    }

    #[test]
    fn test_listing_area_rejects_text_without_unit() {
        assert_eq!(parse_listing_area("2 өрөө байр"), None);
        assert_eq!(parse_listing_area(""), None);
    }

    #[test]
    fn test_listing_area_accepts_bare_trailing_number() {
        // No unit token at all: the end-of-string branch still matches.
        // Kept as-is; datasets already rely on it.
        assert_eq!(parse_listing_area("80"), Some(80.0));
        assert_eq!(parse_listing_area("талбай 72.4"), Some(72.4));
    }

    #[test]
    fn test_listing_area_skips_numbers_not_followed_by_unit() {
        assert_eq!(parse_listing_area("3 давхар, 95 мкв"), Some(95.0));
    }

    #[test]
    fn test_dataset_price() {
        assert_eq!(parse_price("1,234,500₮"), Some(1_234_500.0));
        assert_eq!(parse_price("2.5 сая"), Some(2_500_000.0));
        assert_eq!(parse_price("180 САЯ ₮"), Some(180_000_000.0));
        assert_eq!(parse_price("95000 төгрөг"), Some(95_000.0));
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("   "), None);
        assert_eq!(parse_price("тохиролцоно"), None);
    }

    #[test]
    fn test_dataset_area() {
        assert_eq!(parse_area("80 мкв"), Some(80.0));
        assert_eq!(parse_area("80м.кв"), Some(80.0));
        assert_eq!(parse_area("80м²"), Some(80.0));
        assert_eq!(parse_area("45.5 М2"), Some(45.5));
        assert_eq!(parse_area("80"), None);
        assert_eq!(parse_area("тодорхойгүй"), None);
    }

    #[test]
    fn test_int() {
        assert_eq!(parse_int("12 давхар"), Some(12));
        assert_eq!(parse_int("2015 он"), Some(2015));
        assert_eq!(parse_int("5.0"), Some(5));
        assert_eq!(parse_int("байхгүй"), None);
        assert_eq!(parse_int(""), None);
    }
}
