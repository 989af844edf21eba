// Referrer definitions and visit log rows

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReferrerType {
    Organic,
    Backlink,
    Bot,
    Unknown,
}

impl ReferrerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferrerType::Organic => "organic",
            ReferrerType::Backlink => "backlink",
            ReferrerType::Bot => "bot",
            ReferrerType::Unknown => "unknown",
        }
    }

    /// Parses a stored column value. Blank means "not classified".
    pub fn from_column(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            None
        } else {
            Some(Self::from(value.to_string()))
        }
    }
}

impl From<String> for ReferrerType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "organic" => ReferrerType::Organic,
            "backlink" => ReferrerType::Backlink,
            "bot" => ReferrerType::Bot,
            _ => ReferrerType::Unknown,
        }
    }
}

impl From<ReferrerType> for String {
    fn from(value: ReferrerType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ReferrerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A known referrer host, either from the built-in catalog or a user override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferrerDefinition {
    #[serde(default)]
    pub host: String,
    #[serde(rename = "type", default = "unknown_type")]
    pub referrer_type: ReferrerType,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_url: Option<String>,
    #[serde(default, alias = "flag")]
    pub flagged: bool,
}

fn unknown_type() -> ReferrerType {
    ReferrerType::Unknown
}

impl ReferrerDefinition {
    pub fn new(host: &str, referrer_type: ReferrerType, name: &str) -> Self {
        Self {
            host: host.to_string(),
            referrer_type,
            name: name.to_string(),
            primary_url: None,
            flagged: false,
        }
    }

    pub fn with_primary_url(mut self, url: &str) -> Self {
        self.primary_url = Some(url.to_string());
        self
    }

    /// Primary URL as stored in the log, blank when none is known.
    pub fn primary_url_column(&self) -> &str {
        self.primary_url.as_deref().unwrap_or("")
    }
}

/// A visit ready to be inserted into the log.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub recorded_at: String,
    pub referrer_url: String,
    pub referrer_primary_url: String,
    pub referrer_host: String,
    pub referrer_type: Option<ReferrerType>,
    pub referrer_name: String,
    pub visitor_ip: String,
    pub user_id: i64,
    pub destination_url: String,
    pub flagged: bool,
}

/// A stored row of the `referrer_analytics` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub id: i64,
    pub recorded_at: String,
    pub referrer_url: String,
    pub referrer_primary_url: String,
    pub referrer_host: String,
    pub referrer_type: Option<ReferrerType>,
    pub referrer_name: String,
    pub visitor_ip: String,
    pub user_id: i64,
    pub destination_url: String,
    pub flagged: bool,
}

impl VisitRecord {
    pub fn is_classified(&self) -> bool {
        self.referrer_type.is_some()
            || !self.referrer_name.is_empty()
            || !self.referrer_primary_url.is_empty()
    }
}

/// Column changes for a partial classification update. `None` leaves a column alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassificationUpdate {
    pub referrer_type: Option<Option<ReferrerType>>,
    pub referrer_name: Option<String>,
    pub referrer_primary_url: Option<String>,
}

impl ClassificationUpdate {
    /// Blanks every classification column.
    pub fn cleared() -> Self {
        Self {
            referrer_type: Some(None),
            referrer_name: Some(String::new()),
            referrer_primary_url: Some(String::new()),
        }
    }

    /// Only the columns where `record` disagrees with `definition`.
    pub fn diff(record: &VisitRecord, definition: &ReferrerDefinition) -> Self {
        let mut update = Self::default();

        if record.referrer_type != Some(definition.referrer_type) {
            update.referrer_type = Some(Some(definition.referrer_type));
        }
        if record.referrer_name != definition.name {
            update.referrer_name = Some(definition.name.clone());
        }
        if record.referrer_primary_url != definition.primary_url_column() {
            update.referrer_primary_url = Some(definition.primary_url_column().to_string());
        }

        update
    }

    pub fn is_empty(&self) -> bool {
        self.referrer_type.is_none()
            && self.referrer_name.is_none()
            && self.referrer_primary_url.is_none()
    }
}
