//! Declarative rule tables for reading a star rating out of OCR text
//!
//! Categories are consulted in a fixed order and the first one that yields a
//! result wins:
//! 1. definite five-star patterns, then review-section headings
//! 2. five or more star glyphs
//! 3. numeric ratings (1-5)
//! 4. one to four star glyphs
//! 5. other app-store review-screen context markers
//!
//! A review-section heading ("Ratings & Reviews", "Tap to Rate") qualifies the
//! screenshot on its own and pre-empts any rating read further down, but is
//! reported as a context-only detection.
//!
//! Word boundaries are ASCII (`(?-u:\b)`): an accented letter next to a
//! digit does not hide the rating.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::Detection;

/// Filled star (U+2605)
pub const SOLID_STAR: char = '\u{2605}';

/// Star emoji (U+2B50), optionally followed by a variation selector
pub const EMOJI_STAR: char = '\u{2B50}';

/// One named pattern in a rule table
#[derive(Debug)]
pub struct RatingRule {
    pub name: &'static str,
    pub pattern: Regex,
}

fn rule(name: &'static str, pattern: &str) -> RatingRule {
    RatingRule {
        name,
        pattern: Regex::new(pattern).unwrap_or_else(|e| panic!("invalid rule {}: {}", name, e)),
    }
}

/// Any match means the screenshot shows five stars
pub static FIVE_STAR_RULES: Lazy<Vec<RatingRule>> = Lazy::new(|| {
    vec![
        rule("five_out_of_five", r"(?i)5\s*(?:out of|/)\s*5"),
        rule("five_point_zero", r"(?-u:\b)5\.0(?-u:\b)"),
        // OCR reads 0 as O
        rule("five_point_o", r"(?i)(?-u:\b)5\.O(?-u:\b)"),
        // OCR reads 5 as S
        rule("s_point_zero", r"(?-u:\b)S\.0(?-u:\b)"),
        rule("five_solid_stars", r"\x{2605}{5}"),
        rule("five_emoji_stars", r"(?:\x{2B50}\x{FE0F}?){5}"),
        rule("five_stars_words", r"(?i)(?-u:\b)five\s*stars?(?-u:\b)"),
        rule("five_stars_digits", r"(?i)(?:^|\s)5\s*stars?(?-u:\b)"),
        rule("rating_five", r"(?i)rating[:\s]*5"),
        rule("parenthesized_five", r"\(5\)"),
    ]
});

/// Review-section headings; any match qualifies as a context-only detection
pub static REVIEW_SECTION_RULES: Lazy<Vec<RatingRule>> = Lazy::new(|| {
    vec![
        rule("ratings_and_reviews", r"(?i)ratings?\s*[&\n]\s*reviews?"),
        rule("tap_to_rate", r"(?i)tap\s*to\s*rate"),
    ]
});

/// Capture group 1 holds the rating digit
pub static NUMERIC_RATING_RULES: Lazy<Vec<RatingRule>> = Lazy::new(|| {
    vec![
        rule("out_of_five", r"(?i)([0-9])\s*(?:out of|/)\s*5"),
        rule("point_zero", r"(?-u:\b)([0-9])\.0(?-u:\b)"),
        rule("point_o", r"(?i)(?-u:\b)([0-9])\.O(?-u:\b)"),
        rule("rating_label", r"(?i)rating[:\s]*([0-9])"),
        rule("parenthesized", r"\(([0-9])\)"),
    ]
});

/// Text that only appears on an app-store review screen
pub static APP_STORE_CONTEXT_RULES: Lazy<Vec<RatingRule>> = Lazy::new(|| {
    vec![
        rule("write_a_review", r"(?i)write\s*a\s*review"),
        rule("app_support", r"(?i)app\s*support"),
        rule("app_privacy", r"(?i)app\s*privacy"),
        rule("rating_count", r"(?i)[0-9]+\s*rating"),
    ]
});

/// Larger of the solid-star and star-emoji counts
pub fn count_star_glyphs(text: &str) -> usize {
    let solid = text.chars().filter(|&c| c == SOLID_STAR).count();
    let emoji = text.chars().filter(|&c| c == EMOJI_STAR).count();
    solid.max(emoji)
}

/// First five-star rule matching the text
pub fn match_five_star(text: &str) -> Option<&'static str> {
    FIVE_STAR_RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.name)
}

/// First review-section heading found in the text
pub fn match_review_section(text: &str) -> Option<&'static str> {
    REVIEW_SECTION_RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.name)
}

/// First numeric rule whose first match carries a digit in 1..=5
///
/// Only the first match of each rule is inspected; an out-of-range digit
/// moves on to the next rule.
pub fn match_numeric_rating(text: &str) -> Option<(u8, &'static str)> {
    NUMERIC_RATING_RULES.iter().find_map(|r| {
        r.pattern
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse::<u8>().ok())
            .filter(|rating| (1..=5).contains(rating))
            .map(|rating| (rating, r.name))
    })
}

/// First context marker found in the text
pub fn match_app_store_context(text: &str) -> Option<&'static str> {
    APP_STORE_CONTEXT_RULES
        .iter()
        .find(|r| r.pattern.is_match(text))
        .map(|r| r.name)
}

/// Run every category in priority order
pub fn detect_rating(text: &str) -> Detection {
    if let Some(rule) = match_five_star(text) {
        return Detection::FiveStarPattern { rule: rule.to_string() };
    }

    if let Some(marker) = match_review_section(text) {
        return Detection::ContextOnly {
            marker: marker.to_string(),
        };
    }

    let glyphs = count_star_glyphs(text);
    if glyphs >= 5 {
        return Detection::StarGlyphs { count: glyphs };
    }

    if let Some((rating, rule)) = match_numeric_rating(text) {
        return Detection::NumericRating {
            rating,
            rule: rule.to_string(),
        };
    }

    if glyphs > 0 {
        return Detection::PartialStarGlyphs { count: glyphs };
    }

    if let Some(marker) = match_app_store_context(text) {
        return Detection::ContextOnly {
            marker: marker.to_string(),
        };
    }

    Detection::Nothing
}

#[cfg(test)]
mod tests {
    use super::*;

    fn five_star_rule(text: &str) -> Option<String> {
        match detect_rating(text) {
            Detection::FiveStarPattern { rule } => Some(rule),
            _ => None,
        }
    }

    #[test]
    fn five_star_patterns_each_match() {
        let cases = [
            ("Rated 5 out of 5", "five_out_of_five"),
            ("5/5 would recommend", "five_out_of_five"),
            ("Nyxa 5.0 Sleep", "five_point_zero"),
            ("Nyxa 5.O Sleep", "five_point_o"),
            ("Nyxa S.0 Sleep", "s_point_zero"),
            ("★★★★★", "five_solid_stars"),
            ("\u{2B50}\u{FE0F}\u{2B50}\u{FE0F}\u{2B50}\u{FE0F}\u{2B50}\u{FE0F}\u{2B50}\u{FE0F}", "five_emoji_stars"),
            ("I give it five stars", "five_stars_words"),
            ("5 stars", "five_stars_digits"),
            ("Rating: 5", "rating_five"),
            ("Nyxa (5)", "parenthesized_five"),
        ];
        for (text, expected) in cases {
            assert_eq!(five_star_rule(text).as_deref(), Some(expected), "{}", text);
        }
    }

    #[test]
    fn five_point_zero_needs_word_boundaries() {
        assert_eq!(five_star_rule("version 15.03"), None);
    }

    #[test]
    fn glyph_count_takes_larger_kind() {
        assert_eq!(count_star_glyphs("★★ ⭐⭐⭐"), 3);
        assert_eq!(count_star_glyphs("no stars here"), 0);
    }

    #[test]
    fn scattered_glyphs_count_as_five() {
        assert_eq!(
            detect_rating("★ ★ ★ ★ ★"),
            Detection::StarGlyphs { count: 5 }
        );
    }

    #[test]
    fn numeric_rating_is_extracted() {
        assert_eq!(
            detect_rating("3 out of 5"),
            Detection::NumericRating { rating: 3, rule: "out_of_five".into() }
        );
        assert_eq!(
            detect_rating("Average 4.0"),
            Detection::NumericRating { rating: 4, rule: "point_zero".into() }
        );
        assert_eq!(
            detect_rating("rating 2"),
            Detection::NumericRating { rating: 2, rule: "rating_label".into() }
        );
    }

    #[test]
    fn out_of_range_digit_falls_through() {
        // "8 out of 5" is out of range; "(2)" is picked up by a later rule
        assert_eq!(
            detect_rating("4.8 out of 5 (2)"),
            Detection::NumericRating { rating: 2, rule: "parenthesized".into() }
        );
        assert_eq!(detect_rating("0.0"), Detection::Nothing);
    }

    #[test]
    fn four_emoji_stars_are_partial() {
        assert_eq!(
            detect_rating("⭐⭐⭐⭐"),
            Detection::PartialStarGlyphs { count: 4 }
        );
    }

    #[test]
    fn numeric_rating_beats_partial_glyphs() {
        assert_eq!(
            detect_rating("★★ 2.0"),
            Detection::NumericRating { rating: 2, rule: "point_zero".into() }
        );
    }

    #[test]
    fn context_markers_are_detected() {
        for (text, marker) in [
            ("Tap to Rate", "tap_to_rate"),
            ("Ratings & Reviews", "ratings_and_reviews"),
            ("Ratings\nReviews", "ratings_and_reviews"),
            ("Write a Review", "write_a_review"),
            ("App Support", "app_support"),
            ("App Privacy", "app_privacy"),
            ("12 Ratings", "rating_count"),
        ] {
            assert_eq!(
                detect_rating(text),
                Detection::ContextOnly { marker: marker.to_string() },
                "{}",
                text
            );
        }
    }

    #[test]
    fn review_heading_preempts_lower_ratings() {
        for (text, marker) in [
            ("Ratings & Reviews\n4.3\nout of 5", "ratings_and_reviews"),
            ("Ratings & Reviews\n3 out of 5", "ratings_and_reviews"),
            ("Ratings & Reviews\n(2)", "ratings_and_reviews"),
            ("Tap to Rate\n★★★★", "tap_to_rate"),
        ] {
            assert_eq!(
                detect_rating(text),
                Detection::ContextOnly { marker: marker.to_string() },
                "{}",
                text
            );
        }
    }

    #[test]
    fn five_star_pattern_wins_over_review_heading() {
        assert_eq!(
            five_star_rule("Ratings & Reviews\n5.0").as_deref(),
            Some("five_point_zero")
        );
    }

    #[test]
    fn other_context_markers_do_not_override_a_rating() {
        assert_eq!(
            detect_rating("Write a Review\n3 out of 5"),
            Detection::NumericRating { rating: 3, rule: "out_of_five".into() }
        );
    }

    #[test]
    fn word_boundaries_are_ascii() {
        assert_eq!(five_star_rule("é5.0").as_deref(), Some("five_point_zero"));
        assert_eq!(
            detect_rating("note é4.0"),
            Detection::NumericRating { rating: 4, rule: "point_zero".into() }
        );
    }

    #[test]
    fn unrelated_text_detects_nothing() {
        assert_eq!(detect_rating("Good morning! Your alarm is set."), Detection::Nothing);
        assert_eq!(detect_rating(""), Detection::Nothing);
    }
}
