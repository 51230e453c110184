use crate::domain::model::SubEntry;
use crate::utils::error::ParseError;
use regex::Regex;
use std::sync::LazyLock;

static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]+").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    FullDay,
    HalfDay,
    Night,
}

// Tested in order; the first marker contained in a token decides its category.
const CATEGORY_MARKERS: [(&str, Category); 3] = [
    ("全日", Category::FullDay),
    ("半日", Category::HalfDay),
    ("夜間", Category::Night),
];

/// Parses `organization/counts/site`.
///
/// Only the segment count is strict. Count tokens without a known marker are
/// skipped and a marker without digits counts as 0.
pub fn parse_sub_entry(content: &str) -> Result<SubEntry, ParseError> {
    let parts: Vec<&str> = content.split('/').collect();
    let &[organization, count_info, site_name] = parts.as_slice() else {
        return Err(ParseError::InvalidReportFormat);
    };

    let mut entry = SubEntry {
        organization: organization.trim().to_string(),
        site_name: site_name.trim().to_string(),
        ..Default::default()
    };

    for token in count_info.split(',') {
        let Some(category) = CATEGORY_MARKERS
            .iter()
            .find(|(marker, _)| token.contains(marker))
            .map(|(_, category)| *category)
        else {
            continue;
        };

        let count = first_number(token);
        match category {
            Category::FullDay => entry.full_day_count = count,
            Category::HalfDay => entry.half_day_count = count,
            Category::Night => entry.night_count = count,
        }
    }

    Ok(entry)
}

/// First ASCII digit run in `token`, saturating at `u32::MAX`; 0 when there is none.
fn first_number(token: &str) -> u32 {
    DIGITS
        .find(token)
        .map(|m| m.as_str().parse().unwrap_or(u32::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_categories() {
        let entry = parse_sub_entry(" 協力会社X /全日2,半日1,夜間3/ 支店A ").unwrap();
        assert_eq!(
            entry,
            SubEntry {
                organization: "協力会社X".to_string(),
                full_day_count: 2,
                half_day_count: 1,
                night_count: 3,
                site_name: "支店A".to_string(),
            }
        );
    }

    #[test]
    fn test_wrong_segment_count_fails() {
        assert_eq!(parse_sub_entry("X/Y"), Err(ParseError::InvalidReportFormat));
        assert_eq!(
            parse_sub_entry("X/全日1/Y/Z"),
            Err(ParseError::InvalidReportFormat)
        );
        assert_eq!(parse_sub_entry("no slashes"), Err(ParseError::InvalidReportFormat));
    }

    #[test]
    fn test_missing_categories_default_to_zero() {
        let entry = parse_sub_entry("A/半日4/B").unwrap();
        assert_eq!(entry.full_day_count, 0);
        assert_eq!(entry.half_day_count, 4);
        assert_eq!(entry.night_count, 0);
    }

    #[test]
    fn test_marker_without_digits_counts_zero() {
        let entry = parse_sub_entry("A/全日,夜間なし/B").unwrap();
        assert_eq!(entry.full_day_count, 0);
        assert_eq!(entry.night_count, 0);
    }

    #[test]
    fn test_marker_is_matched_anywhere_in_token() {
        let entry = parse_sub_entry("A/ 作業員 全日 12名 /B").unwrap();
        assert_eq!(entry.full_day_count, 12);
    }

    #[test]
    fn test_first_digit_run_is_used() {
        let entry = parse_sub_entry("A/全日2人3時間/B").unwrap();
        assert_eq!(entry.full_day_count, 2);
    }

    #[test]
    fn test_repeated_category_last_wins() {
        let entry = parse_sub_entry("A/全日1,全日5/B").unwrap();
        assert_eq!(entry.full_day_count, 5);
    }

    #[test]
    fn test_first_marker_decides_mixed_token() {
        let entry = parse_sub_entry("A/半日2全日/B").unwrap();
        assert_eq!(entry.full_day_count, 2);
        assert_eq!(entry.half_day_count, 0);
    }

    #[test]
    fn test_unknown_tokens_are_ignored() {
        let entry = parse_sub_entry("A/応援3,全日1/B").unwrap();
        assert_eq!(entry.full_day_count, 1);
        assert_eq!(entry.half_day_count, 0);
        assert_eq!(entry.night_count, 0);
    }

    #[test]
    fn test_overflowing_count_saturates() {
        let entry = parse_sub_entry("A/全日99999999999,夜間4294967295/B").unwrap();
        assert_eq!(entry.full_day_count, u32::MAX);
        assert_eq!(entry.night_count, u32::MAX);
    }

    #[test]
    fn test_parse_is_repeatable() {
        let content = "org/全日2,半日1/site";
        assert_eq!(parse_sub_entry(content), parse_sub_entry(content));
    }
}
