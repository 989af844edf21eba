// Built-in catalog of known referrer hosts

use crate::model::{ReferrerDefinition, ReferrerType};

struct KnownReferrer {
    host: &'static str,
    kind: ReferrerType,
    name: &'static str,
    primary_url: Option<&'static str>,
    flagged: bool,
}

const fn organic(host: &'static str, name: &'static str, url: &'static str) -> KnownReferrer {
    KnownReferrer {
        host,
        kind: ReferrerType::Organic,
        name,
        primary_url: Some(url),
        flagged: false,
    }
}

const fn backlink(host: &'static str, name: &'static str, url: &'static str) -> KnownReferrer {
    KnownReferrer {
        host,
        kind: ReferrerType::Backlink,
        name,
        primary_url: Some(url),
        flagged: false,
    }
}

const fn bot(host: &'static str, name: &'static str) -> KnownReferrer {
    KnownReferrer {
        host,
        kind: ReferrerType::Bot,
        name,
        primary_url: None,
        flagged: true,
    }
}

const KNOWN_REFERRERS: &[KnownReferrer] = &[
    // Google
    organic("www.google.com", "Google", "https://www.google.com/"),
    organic("www.google.ru", "Google (Russia)", "https://www.google.ru/"),
    organic("www.google.fr", "Google (France)", "https://www.google.fr/"),
    organic("www.google.in", "Google (India)", "https://www.google.in/"),
    organic("www.google.co.in", "Google (India)", "https://www.google.in/"),
    organic("www.google.co.uk", "Google (United Kingdom)", "https://www.google.co.uk/"),
    organic("www.google.ch", "Google (Switzerland)", "https://www.google.ch/"),
    organic("www.google.co.kr", "Google (South Korea)", "https://www.google.co.kr/"),
    organic("www.google.co.th", "Google (Thailand)", "https://www.google.co.th/"),
    organic("www.google.com.eg", "Google (Egypt)", "https://www.google.com.eg/"),
    organic("www.google.com.ar", "Google (Argentina)", "https://www.google.com.ar/"),
    organic("www.google.com.br", "Google (Brazil)", "https://www.google.com.br/"),
    organic("www.google.ro", "Google (Romania)", "https://www.google.ro/"),
    organic("www.google.com.au", "Google (Australia)", "https://www.google.com.au/"),
    organic("www.google.dk", "Google (Denmark)", "https://www.google.dk/"),
    organic("www.google.de", "Google (Germany)", "https://www.google.de/"),
    // Bing
    organic("www.bing.com", "Bing", "https://www.bing.com/"),
    organic("cn.bing.com", "Bing (China)", "https://www.bing.com/?mkt=zh-CN"),
    // Yahoo
    organic("r.search.yahoo.com", "Yahoo", "https://www.yahoo.com/"),
    organic("search.yahoo.com", "Yahoo", "https://www.yahoo.com/"),
    organic("fr.search.yahoo.com", "Yahoo (France)", "https://fr.search.yahoo.com/"),
    organic("uk.search.yahoo.com", "Yahoo (United Kingdom)", "https://uk.search.yahoo.com/"),
    // Other search engines
    organic("duckduckgo.com", "DuckDuckGo", "https://duckduckgo.com/"),
    organic("baidu.com", "Baidu", "http://www.baidu.com/"),
    organic("www.ecosia.org", "Ecosia", "https://www.ecosia.org/"),
    organic("www.qwant.com", "Qwant", "https://www.qwant.com/"),
    // Bots
    bot("site.ru", "site.ru"),
    // Backlinks
    backlink("css-tricks.com", "CSS-Tricks", "https://css-tricks.com/"),
    backlink("lurkmore.to", "Lurkmore", "https://lurkmore.to/"),
    backlink("drupalsun.com", "Drupal Sun", "https://drupalsun.com/"),
    backlink("cdpn.io", "CodePen", "https://codepen.io/"),
    backlink("amzn.to", "Amazon", "https://www.amazon.com/"),
    backlink("jobsnearme.online", "Jobs Near Me", "https://jobsnearme.online/"),
    backlink("www.entermedia.com", "Entermedia, LLC.", "https://www.entermedia.com/"),
    backlink("forum.bubble.io", "Bubble Forum", "https://forum.bubble.io/"),
    backlink("www.benmarshall.me", "Ben Marshall", "https://benmarshall.me"),
    backlink("benmarshall.me", "Ben Marshall", "https://benmarshall.me"),
    backlink("github.com", "GitHub", "https://github.com/"),
    backlink("wordpress.org", "WordPress", "https://wordpress.org/"),
    backlink("school.nextacademy.com", "NEXT Academy", "https://school.nextacademy.com/"),
    backlink("www.soliddigital.com", "Solid Digital", "https://www.soliddigital.com/"),
    backlink("www.benellile.com", "Benlli", "https://www.benellile.com/"),
];

impl KnownReferrer {
    fn to_definition(&self) -> ReferrerDefinition {
        ReferrerDefinition {
            host: self.host.to_string(),
            referrer_type: self.kind,
            name: self.name.to_string(),
            primary_url: self.primary_url.map(str::to_string),
            flagged: self.flagged,
        }
    }
}

/// Every built-in referrer, in declaration order.
pub fn catalog() -> Vec<ReferrerDefinition> {
    KNOWN_REFERRERS.iter().map(KnownReferrer::to_definition).collect()
}

/// Exact host lookup against the built-in catalog.
pub fn lookup(host: &str) -> Option<ReferrerDefinition> {
    KNOWN_REFERRERS
        .iter()
        .find(|known| known.host == host)
        .map(KnownReferrer::to_definition)
}

pub fn len() -> usize {
    KNOWN_REFERRERS.len()
}
