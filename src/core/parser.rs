use crate::core::sub_entry::parse_sub_entry;
use crate::domain::model::Report;
use crate::utils::error::ParseError;
use regex::Regex;
use std::sync::LazyLock;

static NUMBERING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[0-9]+\.\s*").unwrap());

type FieldSetter = fn(&mut Report, &str);

/// Label prefixes in match order. Only the date value is trimmed.
const LABELS: [(&str, FieldSetter); 6] = [
    ("識別子：", |report, value| report.identifier = value.to_string()),
    ("出向日：", |report, value| report.date = Some(value.trim().to_string())),
    ("氏名：", |report, value| report.name = value.to_string()),
    ("出向内容：", |report, value| {
        report.assignment_type = value.to_string()
    }),
    ("現場名：", |report, value| report.site_name = value.to_string()),
    ("他の出向報告：", |report, value| {
        report.has_other_reports = value.to_string()
    }),
];

/// Parses a report message line by line.
///
/// Label lines overwrite their field (last occurrence wins), numbered lines
/// become sub entries in document order and every other line is ignored.
/// A malformed numbered line fails the whole message.
pub fn parse_message(raw: &str) -> Result<Report, ParseError> {
    if raw.is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let mut report = Report::default();

    for line in raw.lines() {
        if let Some((value, setter)) = LABELS
            .iter()
            .find_map(|(prefix, setter)| line.strip_prefix(prefix).map(|value| (value, setter)))
        {
            setter(&mut report, value);
        } else if let Some(numbering) = NUMBERING.find(line) {
            let entry = parse_sub_entry(&line[numbering.end()..])?;
            report.sub_entries.push(entry);
        } else {
            tracing::trace!("Ignoring unrecognized line: {:?}", line);
        }
    }

    Ok(report)
}
