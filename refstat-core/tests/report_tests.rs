// Tests for report aggregation and rendering

use refstat_core::data::{Database, LogStore, VisitFilter};
use refstat_core::model::{NewVisit, ReferrerType, VisitRecord};
use refstat_core::report::{
    EMPTY_REPORT_MESSAGE, NOT_AVAILABLE, ReportData, ReportFormat, gather_report_data,
    generate_csv_report, generate_json_report, generate_markdown_report, generate_report,
    generate_text_report, referrer_key, save_report, summarize, top, unknown_referrers,
};
use tempfile::TempDir;

fn record(id: i64, name: &str, host: &str, referrer_type: Option<ReferrerType>, destination: &str) -> VisitRecord {
    VisitRecord {
        id,
        recorded_at: "2024-05-01 10:00:00".to_string(),
        referrer_url: format!("https://{}/", host),
        referrer_primary_url: String::new(),
        referrer_host: host.to_string(),
        referrer_type,
        referrer_name: name.to_string(),
        visitor_ip: String::new(),
        user_id: 0,
        destination_url: destination.to_string(),
        flagged: false,
    }
}

fn sample_records() -> Vec<VisitRecord> {
    vec![
        record(1, "Google", "-", Some(ReferrerType::Organic), "https://example.com/"),
        record(2, "", "unknownhost.com", None, "https://example.com/a"),
        record(3, "Google", "-", Some(ReferrerType::Organic), "https://example.com/"),
        record(4, "Bing", "-", Some(ReferrerType::Organic), "https://example.com/a"),
    ]
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv)));
    assert!(matches!(
        ReportFormat::from_str("markdown"),
        Some(ReportFormat::Markdown)
    ));
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("html").is_none());
    assert!(ReportFormat::from_str("pdf").is_none());
}

// ============================================================================
// Aggregation Tests
// ============================================================================

#[test]
fn test_referrer_key_fallbacks() {
    assert_eq!(referrer_key(&record(1, "Google", "www.google.com", None, "/")), "Google");
    assert_eq!(referrer_key(&record(1, "", "unknownhost.com", None, "/")), "unknownhost.com");
    assert_eq!(referrer_key(&record(1, "", "", None, "/")), NOT_AVAILABLE);
}

#[test]
fn test_summarize_by_referrer() {
    let summary = summarize(&sample_records());

    assert_eq!(summary.referrers.len(), 3);
    assert_eq!(summary.referrers["Google"].count, 2);
    assert_eq!(summary.referrers["Bing"].count, 1);
    // Empty names fall back to the host
    assert_eq!(summary.referrers["unknownhost.com"].count, 1);
    assert!(!summary.referrers.contains_key(NOT_AVAILABLE));
}

#[test]
fn test_summarize_by_type() {
    let summary = summarize(&sample_records());

    assert_eq!(summary.types["organic"], 3);
    assert_eq!(summary.types[NOT_AVAILABLE], 1);
    assert_eq!(summary.referrers["unknownhost.com"].referrer_type, NOT_AVAILABLE);
}

#[test]
fn test_summarize_by_destination() {
    let summary = summarize(&sample_records());

    assert_eq!(summary.destinations.len(), 2);
    assert_eq!(summary.destinations["https://example.com/"], 2);
    assert_eq!(summary.destinations["https://example.com/a"], 2);
}

#[test]
fn test_summarize_is_order_insensitive() {
    let mut reversed = sample_records();
    reversed.reverse();

    let forward = summarize(&sample_records());
    let backward = summarize(&reversed);

    assert_eq!(forward.types, backward.types);
    assert_eq!(forward.destinations, backward.destinations);
    for (key, tally) in &forward.referrers {
        assert_eq!(backward.referrers[key].count, tally.count);
    }
}

#[test]
fn test_summarize_empty() {
    let summary = summarize(&[]);
    assert!(summary.is_empty());
}

#[test]
fn test_unknown_referrers_sorted_and_limited() {
    let mut records = sample_records();
    records.push(record(5, "", "spam.example", None, "/"));
    records.push(record(6, "", "spam.example", None, "/"));
    records.push(record(7, "", "other.example", None, "/"));

    let unknown = unknown_referrers(&records, 100);
    assert_eq!(
        unknown,
        vec![
            ("spam.example".to_string(), 2),
            ("other.example".to_string(), 1),
            ("unknownhost.com".to_string(), 1),
        ]
    );

    let limited = unknown_referrers(&records, 1);
    assert_eq!(limited, vec![("spam.example".to_string(), 2)]);
}

#[test]
fn test_top_orders_by_count() {
    let summary = summarize(&sample_records());
    let types = top(&summary.types, 10);
    assert_eq!(types[0], ("organic".to_string(), 3));
    assert_eq!(types[1], (NOT_AVAILABLE.to_string(), 1));

    let referrers = summary.top_referrers(1);
    assert_eq!(referrers.len(), 1);
    assert_eq!(referrers[0].0, "Google");
}

#[test]
fn test_zero_top_still_lists_one_row() {
    let data = ReportData::from_records(&sample_records(), 0);

    assert_eq!(data.top, 1);
    assert_eq!(data.unknown, vec![("unknownhost.com".to_string(), 1)]);

    let report = generate_text_report(&data);
    assert!(!report.contains(EMPTY_REPORT_MESSAGE));
    assert!(report.contains("unknownhost.com"));
}

// ============================================================================
// Rendering Tests
// ============================================================================

#[test]
fn test_text_report_contents() {
    let data = ReportData::from_records(&sample_records(), 100);
    let report = generate_text_report(&data);

    assert!(report.contains("REFSTAT REFERRER REPORT"));
    assert!(report.contains("Visits:       4"));
    assert!(report.contains("TOP REFERRERS"));
    assert!(report.contains("Google"));
    assert!(report.contains("TOP UNKNOWN REFERRERS"));
    assert!(report.contains("unknownhost.com"));
}

#[test]
fn test_text_report_empty() {
    let data = ReportData::from_records(&[], 100);
    let report = generate_text_report(&data);

    assert!(report.contains(EMPTY_REPORT_MESSAGE));
    assert!(!report.contains("TOP REFERRERS"));
}

#[test]
fn test_json_report_structure() {
    let data = ReportData::from_records(&sample_records(), 100);
    let json = generate_json_report(&data).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(parsed["report"]["metadata"]["generator"], "refstat");
    assert_eq!(parsed["report"]["summary"]["total_visits"], 4);
    assert_eq!(parsed["report"]["referrers"][0]["key"], "Google");
    assert_eq!(parsed["report"]["referrers"][0]["count"], 2);
    assert_eq!(parsed["report"]["unknown_referrers"][0]["key"], "unknownhost.com");
}

#[test]
fn test_json_report_empty() {
    let data = ReportData::from_records(&[], 100);
    let parsed: serde_json::Value =
        serde_json::from_str(&generate_json_report(&data).unwrap()).unwrap();

    assert_eq!(parsed["report"]["summary"]["empty"], true);
    assert_eq!(parsed["report"]["referrers"].as_array().unwrap().len(), 0);
}

#[test]
fn test_csv_report_escapes_fields() {
    let records = vec![record(1, "Entermedia, LLC.", "www.entermedia.com", Some(ReferrerType::Backlink), "/")];
    let data = ReportData::from_records(&records, 100);
    let csv = generate_csv_report(&data);

    assert!(csv.starts_with("section,key,type,count\n"));
    assert!(csv.contains("referrer,\"Entermedia, LLC.\",backlink,1"));
    assert!(csv.contains("type,backlink,,1"));
}

#[test]
fn test_markdown_report_tables() {
    let data = ReportData::from_records(&sample_records(), 100);
    let markdown = generate_markdown_report(&data);

    assert!(markdown.starts_with("# Referrer Report"));
    assert!(markdown.contains("| 1 | Google | organic | 2 |"));
    assert!(markdown.contains("## Top Unknown Referrers"));
}

#[test]
fn test_generate_report_dispatch() {
    let data = ReportData::from_records(&sample_records(), 100);

    let text = generate_report(&data, &ReportFormat::Text).unwrap();
    assert!(text.contains("REFSTAT REFERRER REPORT"));

    let csv = generate_report(&data, &ReportFormat::Csv).unwrap();
    assert!(csv.starts_with("section,"));
}

// ============================================================================
// Database-backed Report Tests
// ============================================================================

#[test]
fn test_gather_report_after_clear_is_empty() {
    let db = Database::open_in_memory().unwrap();
    db.insert_visit(&NewVisit {
        recorded_at: "2024-05-01 10:00:00".to_string(),
        referrer_url: "https://www.google.com/".to_string(),
        referrer_primary_url: "https://www.google.com/".to_string(),
        referrer_host: "www.google.com".to_string(),
        referrer_type: Some(ReferrerType::Organic),
        referrer_name: "Google".to_string(),
        visitor_ip: String::new(),
        user_id: 0,
        destination_url: "https://example.com/".to_string(),
        flagged: false,
    })
    .unwrap();

    let data = gather_report_data(&db, &VisitFilter::all(), 100).unwrap();
    assert_eq!(data.total_visits, 1);

    db.clear().unwrap();
    assert_eq!(db.count().unwrap(), 0);

    let data = gather_report_data(&db, &VisitFilter::all(), 100).unwrap();
    assert!(data.is_empty());
    assert!(data.summary.is_empty());
    assert!(data.unknown.is_empty());
}

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.txt");

    save_report("hello report", &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello report");
}
