// Visit classification against the merged referrer mapping

use crate::model::{NewVisit, ReferrerType};
use crate::resolver::ReferrerMap;
use chrono::{DateTime, Utc};
use tracing::debug;
use url::Url;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// What the web request tells us about the visit.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Raw `Referer` header, if the client sent one
    pub referrer: Option<String>,
    pub visitor_ip: String,
    /// 0 for anonymous visitors
    pub user_id: i64,
    /// Full URL of the page being served
    pub current_url: String,
}

impl RequestContext {
    pub fn new(referrer: Option<&str>, current_url: &str) -> Self {
        Self {
            referrer: referrer.map(str::to_string),
            current_url: current_url.to_string(),
            ..Default::default()
        }
    }

    pub fn with_visitor(mut self, ip: &str, user_id: i64) -> Self {
        self.visitor_ip = ip.to_string();
        self.user_id = user_id;
        self
    }
}

/// A referrer URL broken into parts, with any matched classification merged in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedReferrer {
    pub url: String,
    pub scheme: Option<String>,
    pub host: Option<String>,
    pub path: Option<String>,
    pub referrer_type: Option<ReferrerType>,
    pub name: String,
    pub primary_url: String,
    pub flagged: bool,
}

impl ClassifiedReferrer {
    pub fn is_known(&self) -> bool {
        self.referrer_type.is_some()
    }
}

/// Splits a referrer URL into scheme, host and path. Unparsable input keeps
/// only the raw URL.
pub fn parse_referrer(referrer_url: &str) -> ClassifiedReferrer {
    let mut referrer = ClassifiedReferrer {
        url: referrer_url.to_string(),
        ..Default::default()
    };

    if let Ok(parsed) = Url::parse(referrer_url) {
        referrer.scheme = Some(parsed.scheme().to_string()).filter(|s| !s.is_empty());
        referrer.host = parsed.host_str().map(str::to_string).filter(|h| !h.is_empty());
        referrer.path = Some(parsed.path().to_string()).filter(|p| !p.is_empty());
    }

    referrer
}

/// Classifies a visitor's referrer.
///
/// Returns `None` when there is no referrer, or when the host is unknown and
/// `track_all` is off.
pub fn classify(
    referrer_url: Option<&str>,
    map: Option<&ReferrerMap>,
    track_all: bool,
) -> Option<ClassifiedReferrer> {
    let referrer_url = referrer_url.map(str::trim).filter(|r| !r.is_empty())?;
    let mut referrer = parse_referrer(referrer_url);

    let definition = referrer
        .host
        .as_deref()
        .and_then(|host| map.and_then(|m| m.get(host)));

    if let Some(definition) = definition {
        debug!("Referrer host {} matched '{}'", definition.host, definition.name);
        referrer.referrer_type = Some(definition.referrer_type);
        referrer.name = definition.name.clone();
        referrer.primary_url = definition.primary_url_column().to_string();
        referrer.flagged = definition.flagged;
        return Some(referrer);
    }

    if track_all {
        debug!("Tracking unmatched referrer {}", referrer_url);
        Some(referrer)
    } else {
        debug!("Dropping unmatched referrer {}", referrer_url);
        None
    }
}

/// Assembles the row to insert for a classified visit.
pub fn build_visit(
    ctx: &RequestContext,
    referrer: &ClassifiedReferrer,
    recorded_at: DateTime<Utc>,
) -> NewVisit {
    NewVisit {
        recorded_at: recorded_at.format(TIMESTAMP_FORMAT).to_string(),
        referrer_url: referrer.url.clone(),
        referrer_primary_url: referrer.primary_url.clone(),
        referrer_host: referrer.host.clone().unwrap_or_default(),
        referrer_type: referrer.referrer_type,
        referrer_name: referrer.name.clone(),
        visitor_ip: ctx.visitor_ip.clone(),
        user_id: ctx.user_id,
        destination_url: ctx.current_url.clone(),
        flagged: referrer.flagged,
    }
}
