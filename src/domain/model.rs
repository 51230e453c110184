use serde::{Deserialize, Serialize};

/// One submitted shift report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub identifier: String,
    /// Opaque date text, trimmed. `None` when the message has no date line.
    pub date: Option<String>,
    pub name: String,
    pub assignment_type: String,
    pub site_name: String,
    pub has_other_reports: String,
    pub sub_entries: Vec<SubEntry>,
}

/// One numbered "organization/counts/site" line of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubEntry {
    pub organization: String,
    pub full_day_count: u32,
    pub half_day_count: u32,
    pub night_count: u32,
    pub site_name: String,
}

/// Answer to "are there other reports" that enables the report sheet.
pub const OTHER_REPORTS_YES: &str = "はい";

impl Report {
    pub fn has_other_reports(&self) -> bool {
        self.has_other_reports == OTHER_REPORTS_YES
    }
}

/// Message text pulled out of a webhook event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub text: String,
    pub reply_token: Option<String>,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_token: None,
        }
    }
}

/// Row appended to the main sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MainRow {
    pub received_at: String,
    pub identifier: String,
    pub date: String,
    pub name: String,
    pub assignment_type: String,
    pub site_name: String,
}

/// Row appended to the report sheet, one per sub entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubEntryRow {
    pub received_at: String,
    pub identifier: String,
    pub date: String,
    pub organization: String,
    pub full_day_count: u32,
    pub half_day_count: u32,
    pub night_count: u32,
    pub site_name: String,
}

/// A row type with a fixed sheet header matching its serialized field order.
pub trait SheetRow: Serialize {
    const HEADER: &'static [&'static str];
}

impl SheetRow for MainRow {
    const HEADER: &'static [&'static str] = &[
        "received_at",
        "identifier",
        "date",
        "name",
        "assignment_type",
        "site_name",
    ];
}

impl SheetRow for SubEntryRow {
    const HEADER: &'static [&'static str] = &[
        "received_at",
        "identifier",
        "date",
        "organization",
        "full_day_count",
        "half_day_count",
        "night_count",
        "site_name",
    ];
}

#[derive(Debug, Clone)]
pub struct TransformResult {
    pub report: Report,
    pub main_row: MainRow,
    pub sub_entry_rows: Vec<SubEntryRow>,
}

impl TransformResult {
    /// Builds the sheet rows for `report`, sharing one `received_at` stamp.
    pub fn new(report: Report, received_at: String) -> Self {
        let date = report.date.clone().unwrap_or_default();

        let main_row = MainRow {
            received_at: received_at.clone(),
            identifier: report.identifier.clone(),
            date: date.clone(),
            name: report.name.clone(),
            assignment_type: report.assignment_type.clone(),
            site_name: report.site_name.clone(),
        };

        let sub_entry_rows = if report.has_other_reports() {
            report
                .sub_entries
                .iter()
                .map(|entry| SubEntryRow {
                    received_at: received_at.clone(),
                    identifier: report.identifier.clone(),
                    date: date.clone(),
                    organization: entry.organization.clone(),
                    full_day_count: entry.full_day_count,
                    half_day_count: entry.half_day_count,
                    night_count: entry.night_count,
                    site_name: entry.site_name.clone(),
                })
                .collect()
        } else {
            Vec::new()
        };

        Self {
            report,
            main_row,
            sub_entry_rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    pub main_sheet: String,
    pub report_sheet: String,
    pub main_rows: usize,
    pub sub_entry_rows: usize,
}
