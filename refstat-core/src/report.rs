// Report generation from the visit log

use crate::data::{LogStore, VisitFilter};
use crate::error::Result;
use crate::model::VisitRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Placeholder key for a blank referrer or type
pub const NOT_AVAILABLE: &str = "N/A";

/// How many unknown hosts the reports list
pub const UNKNOWN_REFERRER_LIMIT: usize = 100;

pub const EMPTY_REPORT_MESSAGE: &str = "No data to report yet.";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }
}

/// Visits attributed to one referrer display key. Metadata comes from the
/// first record seen for that key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferrerTally {
    pub name: String,
    pub count: usize,
    pub primary_url: String,
    pub referrer_type: String,
    pub flagged: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSummary {
    pub referrers: HashMap<String, ReferrerTally>,
    pub types: HashMap<String, usize>,
    pub destinations: HashMap<String, usize>,
}

impl LogSummary {
    pub fn is_empty(&self) -> bool {
        self.referrers.is_empty() && self.types.is_empty() && self.destinations.is_empty()
    }

    /// Referrers by descending count, ties broken by key.
    pub fn top_referrers(&self, n: usize) -> Vec<(&str, &ReferrerTally)> {
        let mut entries: Vec<(&str, &ReferrerTally)> = self
            .referrers
            .iter()
            .map(|(key, tally)| (key.as_str(), tally))
            .collect();
        entries.sort_by(|a, b| b.1.count.cmp(&a.1.count).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }
}

/// Display key for a record: its name, else its host, else `N/A`.
pub fn referrer_key(record: &VisitRecord) -> &str {
    if !record.referrer_name.is_empty() {
        &record.referrer_name
    } else if !record.referrer_host.is_empty() {
        &record.referrer_host
    } else {
        NOT_AVAILABLE
    }
}

/// Tallies records by referrer, by type and by destination in a single pass.
pub fn summarize(records: &[VisitRecord]) -> LogSummary {
    let mut summary = LogSummary::default();

    for record in records {
        let key = referrer_key(record);
        let referrer_type = record
            .referrer_type
            .map(|t| t.as_str())
            .unwrap_or(NOT_AVAILABLE);

        summary
            .referrers
            .entry(key.to_string())
            .and_modify(|tally| tally.count += 1)
            .or_insert_with(|| ReferrerTally {
                name: key.to_string(),
                count: 1,
                primary_url: record.referrer_primary_url.clone(),
                referrer_type: referrer_type.to_string(),
                flagged: record.flagged,
            });

        *summary.types.entry(referrer_type.to_string()).or_insert(0) += 1;
        *summary
            .destinations
            .entry(record.destination_url.clone())
            .or_insert(0) += 1;
    }

    summary
}

/// Hosts of records without a referrer name, most frequent first.
pub fn unknown_referrers(records: &[VisitRecord], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for record in records.iter().filter(|r| r.referrer_name.is_empty()) {
        *counts.entry(record.referrer_host.as_str()).or_insert(0) += 1;
    }

    let mut unknown: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(host, count)| (host.to_string(), count))
        .collect();
    sort_counts(&mut unknown);
    unknown.truncate(limit);
    unknown
}

/// Sorted view of a count map, descending by count then ascending by key.
pub fn top(counts: &HashMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> = counts
        .iter()
        .map(|(key, count)| (key.clone(), *count))
        .collect();
    sort_counts(&mut entries);
    entries.truncate(n);
    entries
}

fn sort_counts(entries: &mut [(String, usize)]) {
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub generated_at: String,
    pub total_visits: usize,
    /// Rows shown per section
    pub top: usize,
    pub summary: LogSummary,
    pub unknown: Vec<(String, usize)>,
}

impl ReportData {
    /// `top` is raised to at least one row per section.
    pub fn from_records(records: &[VisitRecord], top: usize) -> Self {
        let top = top.max(1);
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            total_visits: records.len(),
            top,
            summary: summarize(records),
            unknown: unknown_referrers(records, UNKNOWN_REFERRER_LIMIT.min(top)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_visits == 0
    }
}

pub fn gather_report_data<S: LogStore + ?Sized>(
    store: &S,
    filter: &VisitFilter,
    top: usize,
) -> Result<ReportData> {
    let records = store.visits(filter)?;
    Ok(ReportData::from_records(&records, top))
}

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

fn push_section(report: &mut String, title: &str) {
    report.push_str(RULE);
    report.push_str(title);
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                          REFSTAT REFERRER REPORT\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("Generated:    {}\n", data.generated_at));
    report.push_str(&format!("Visits:       {}\n", data.total_visits));
    report.push_str(&format!("Referrers:    {}\n", data.summary.referrers.len()));
    report.push('\n');

    if data.is_empty() {
        report.push_str(EMPTY_REPORT_MESSAGE);
        report.push('\n');
        return report;
    }

    push_section(&mut report, "TOP REFERRERS");
    for (idx, (key, tally)) in data.summary.top_referrers(data.top).iter().enumerate() {
        let flag = if tally.flagged { " [FLAGGED]" } else { "" };
        report.push_str(&format!(
            "{:>4}. {:<40} {:<10} {:>8}{}\n",
            idx + 1,
            truncate(key, 40),
            tally.referrer_type,
            tally.count,
            flag
        ));
    }
    report.push('\n');

    push_section(&mut report, "VISITS BY TYPE");
    for (referrer_type, count) in top(&data.summary.types, data.top) {
        report.push_str(&format!("  {:<20} {:>8}\n", referrer_type, count));
    }
    report.push('\n');

    push_section(&mut report, "TOP DESTINATIONS");
    for (destination, count) in top(&data.summary.destinations, data.top) {
        report.push_str(&format!("  {:>8}  {}\n", count, destination));
    }
    report.push('\n');

    push_section(&mut report, "TOP UNKNOWN REFERRERS");
    if data.unknown.is_empty() {
        report.push_str(EMPTY_REPORT_MESSAGE);
        report.push('\n');
    }
    for (idx, (host, count)) in data.unknown.iter().enumerate() {
        let host = if host.is_empty() { NOT_AVAILABLE } else { host.as_str() };
        report.push_str(&format!("{:>4}. {:<50} {:>8}\n", idx + 1, host, count));
    }
    report.push('\n');

    report
}

pub fn generate_json_report(data: &ReportData) -> std::result::Result<String, serde_json::Error> {
    let referrers: Vec<serde_json::Value> = data
        .summary
        .top_referrers(data.top)
        .into_iter()
        .map(|(key, tally)| {
            serde_json::json!({
                "key": key,
                "count": tally.count,
                "type": tally.referrer_type,
                "primary_url": tally.primary_url,
                "flagged": tally.flagged,
            })
        })
        .collect();

    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "refstat",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at,
                "format": "json"
            },
            "summary": {
                "total_visits": data.total_visits,
                "total_referrers": data.summary.referrers.len(),
                "empty": data.is_empty()
            },
            "referrers": referrers,
            "types": counts_to_json(&top(&data.summary.types, data.top)),
            "destinations": counts_to_json(&top(&data.summary.destinations, data.top)),
            "unknown_referrers": counts_to_json(&data.unknown)
        }
    });

    serde_json::to_string_pretty(&json_report)
}

fn counts_to_json(counts: &[(String, usize)]) -> serde_json::Value {
    serde_json::Value::Array(
        counts
            .iter()
            .map(|(key, count)| serde_json::json!({ "key": key, "count": count }))
            .collect(),
    )
}

pub fn generate_csv_report(data: &ReportData) -> String {
    let mut report = String::from("section,key,type,count\n");

    for (key, tally) in data.summary.top_referrers(data.top) {
        report.push_str(&format!(
            "referrer,{},{},{}\n",
            csv_escape(key),
            csv_escape(&tally.referrer_type),
            tally.count
        ));
    }
    for (referrer_type, count) in top(&data.summary.types, data.top) {
        report.push_str(&format!("type,{},,{}\n", csv_escape(&referrer_type), count));
    }
    for (destination, count) in top(&data.summary.destinations, data.top) {
        report.push_str(&format!("destination,{},,{}\n", csv_escape(&destination), count));
    }
    for (host, count) in &data.unknown {
        report.push_str(&format!("unknown,{},,{}\n", csv_escape(host), count));
    }

    report
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::from("# Referrer Report\n\n");
    report.push_str(&format!("- Generated: {}\n", data.generated_at));
    report.push_str(&format!("- Visits: {}\n\n", data.total_visits));

    if data.is_empty() {
        report.push_str(EMPTY_REPORT_MESSAGE);
        report.push('\n');
        return report;
    }

    report.push_str("## Top Referrers\n\n| # | Referrer | Type | Visits |\n|---|---|---|---|\n");
    for (idx, (key, tally)) in data.summary.top_referrers(data.top).iter().enumerate() {
        let name = if tally.primary_url.is_empty() {
            markdown_escape(key)
        } else {
            format!("[{}]({})", markdown_escape(key), tally.primary_url)
        };
        report.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            idx + 1,
            name,
            tally.referrer_type,
            tally.count
        ));
    }

    report.push_str("\n## Visits by Type\n\n| Type | Visits |\n|---|---|\n");
    for (referrer_type, count) in top(&data.summary.types, data.top) {
        report.push_str(&format!("| {} | {} |\n", referrer_type, count));
    }

    report.push_str("\n## Top Destinations\n\n| Destination | Visits |\n|---|---|\n");
    for (destination, count) in top(&data.summary.destinations, data.top) {
        report.push_str(&format!("| {} | {} |\n", markdown_escape(&destination), count));
    }

    report.push_str("\n## Top Unknown Referrers\n\n");
    if data.unknown.is_empty() {
        report.push_str(EMPTY_REPORT_MESSAGE);
        report.push('\n');
    } else {
        report.push_str("| Host | Visits |\n|---|---|\n");
        for (host, count) in &data.unknown {
            report.push_str(&format!("| {} | {} |\n", markdown_escape(host), count));
        }
    }

    report
}

pub fn generate_report(data: &ReportData, format: &ReportFormat) -> Result<String> {
    Ok(match format {
        ReportFormat::Text => generate_text_report(data),
        ReportFormat::Json => generate_json_report(data)?,
        ReportFormat::Csv => generate_csv_report(data),
        ReportFormat::Markdown => generate_markdown_report(data),
    })
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn markdown_escape(text: &str) -> String {
    text.replace('|', "\\|")
}
