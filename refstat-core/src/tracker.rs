// Ties settings, classification and the visit log together

use crate::catalog;
use crate::classifier::{self, ClassifiedReferrer, RequestContext};
use crate::config::Settings;
use crate::data::LogStore;
use crate::error::Result;
use crate::resolver::{self, ReferrerMap};
use crate::sync::{self, SyncOutcome};
use chrono::Utc;
use tracing::debug;

/// Resolved referrer mapping plus the track-all flag, built once per process.
#[derive(Debug, Clone)]
pub struct Tracker {
    map: Option<ReferrerMap>,
    track_all: bool,
}

impl Tracker {
    pub fn new(settings: &Settings) -> Self {
        let map = resolver::resolve(
            &catalog::catalog(),
            &settings.hosts,
            settings.track_all_referrers,
        );
        Self {
            map,
            track_all: settings.track_all_referrers,
        }
    }

    pub fn referrers(&self) -> Option<&ReferrerMap> {
        self.map.as_ref()
    }

    pub fn track_all(&self) -> bool {
        self.track_all
    }

    pub fn classify(&self, referrer_url: Option<&str>) -> Option<ClassifiedReferrer> {
        classifier::classify(referrer_url, self.map.as_ref(), self.track_all)
    }

    /// Logs the visit if it qualifies, returning the new row id.
    pub fn record<S: LogStore + ?Sized>(
        &self,
        store: &S,
        ctx: &RequestContext,
    ) -> Result<Option<i64>> {
        let Some(referrer) = self.classify(ctx.referrer.as_deref()) else {
            return Ok(None);
        };

        let visit = classifier::build_visit(ctx, &referrer, Utc::now());
        let id = store.insert_visit(&visit)?;
        debug!(
            "Logged visit {} from {} to {}",
            id, visit.referrer_host, visit.destination_url
        );
        Ok(Some(id))
    }

    pub fn sync<S: LogStore + ?Sized>(&self, store: &S) -> Result<SyncOutcome> {
        sync::sync_log(store, self.map.as_ref())
    }
}
