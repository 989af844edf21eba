// Tests for the built-in catalog and referrer resolution

use refstat_core::catalog;
use refstat_core::model::{ReferrerDefinition, ReferrerType};
use refstat_core::resolver::resolve;

fn css_tricks_override() -> ReferrerDefinition {
    ReferrerDefinition::new("css-tricks.com", ReferrerType::Backlink, "MySite")
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_hosts_are_unique_and_non_empty() {
    let entries = catalog::catalog();
    let mut hosts: Vec<&str> = entries.iter().map(|e| e.host.as_str()).collect();
    let total = hosts.len();
    hosts.sort();
    hosts.dedup();

    assert_eq!(hosts.len(), total);
    assert_eq!(total, catalog::len());
    assert!(entries.iter().all(|e| !e.host.is_empty() && !e.name.is_empty()));
}

#[test]
fn test_catalog_lookup() {
    let google = catalog::lookup("www.google.com").unwrap();
    assert_eq!(google.name, "Google");
    assert_eq!(google.referrer_type, ReferrerType::Organic);
    assert_eq!(google.primary_url.as_deref(), Some("https://www.google.com/"));

    let css_tricks = catalog::lookup("css-tricks.com").unwrap();
    assert_eq!(css_tricks.name, "CSS-Tricks");
    assert_eq!(css_tricks.referrer_type, ReferrerType::Backlink);
}

#[test]
fn test_catalog_lookup_is_exact() {
    assert!(catalog::lookup("google.com").is_none());
    assert!(catalog::lookup("WWW.GOOGLE.COM").is_none());
    assert!(catalog::lookup("").is_none());
}

#[test]
fn test_catalog_bot_is_flagged() {
    let bot = catalog::lookup("site.ru").unwrap();
    assert_eq!(bot.referrer_type, ReferrerType::Bot);
    assert!(bot.flagged);
    assert!(bot.primary_url.is_none());
}

// ============================================================================
// Resolver Tests
// ============================================================================

#[test]
fn test_resolve_track_all_seeds_catalog() {
    let map = resolve(&catalog::catalog(), &[], true).unwrap();
    assert_eq!(map.len(), catalog::len());
    assert!(map.get("www.bing.com").is_some());
}

#[test]
fn test_resolve_without_track_all_ignores_catalog() {
    let overrides = vec![css_tricks_override()];
    let map = resolve(&catalog::catalog(), &overrides, false).unwrap();

    assert_eq!(map.len(), 1);
    assert!(map.get("css-tricks.com").is_some());
    assert!(map.get("www.google.com").is_none());
}

#[test]
fn test_resolve_nothing_available() {
    assert!(resolve(&catalog::catalog(), &[], false).is_none());
    assert!(resolve(&[], &[], true).is_none());
}

#[test]
fn test_override_replaces_catalog_entry() {
    let overrides = vec![css_tricks_override()];
    let map = resolve(&catalog::catalog(), &overrides, true).unwrap();

    let merged = map.get("css-tricks.com").unwrap();
    assert_eq!(merged.name, "MySite");
    // Whole-record replacement: the catalog's primary URL does not carry over
    assert_eq!(merged.primary_url, None);
    assert_eq!(map.len(), catalog::len());
}

#[test]
fn test_override_adds_new_host() {
    let overrides = vec![
        ReferrerDefinition::new("news.ycombinator.com", ReferrerType::Backlink, "Hacker News")
            .with_primary_url("https://news.ycombinator.com/"),
    ];
    let map = resolve(&catalog::catalog(), &overrides, true).unwrap();

    assert_eq!(map.len(), catalog::len() + 1);
    assert_eq!(map.get("news.ycombinator.com").unwrap().name, "Hacker News");
}

#[test]
fn test_later_override_wins() {
    let overrides = vec![
        ReferrerDefinition::new("partner.example", ReferrerType::Backlink, "First"),
        ReferrerDefinition::new("partner.example", ReferrerType::Organic, "Second"),
    ];
    let map = resolve(&[], &overrides, false).unwrap();

    let entry = map.get("partner.example").unwrap();
    assert_eq!(entry.name, "Second");
    assert_eq!(entry.referrer_type, ReferrerType::Organic);
}

#[test]
fn test_empty_hosts_are_discarded() {
    let overrides = vec![
        ReferrerDefinition::new("", ReferrerType::Backlink, "Nameless"),
        ReferrerDefinition::new("   ", ReferrerType::Backlink, "Blank"),
    ];
    assert!(resolve(&[], &overrides, false).is_none());

    let overrides = vec![
        ReferrerDefinition::new("", ReferrerType::Backlink, "Nameless"),
        ReferrerDefinition::new("ok.example", ReferrerType::Backlink, "Ok"),
    ];
    let map = resolve(&[], &overrides, false).unwrap();
    assert_eq!(map.hosts().collect::<Vec<_>>(), vec!["ok.example"]);
}
