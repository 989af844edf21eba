// Re-syncs stored classifications with the current referrer mapping

use crate::data::{LogStore, VisitFilter};
use crate::error::Result;
use crate::model::ClassificationUpdate;
use crate::resolver::ReferrerMap;
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    pub examined: usize,
    /// Matched rows whose classification was corrected
    pub updated: usize,
    /// Unmatched rows whose classification was blanked
    pub cleared: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// No referrers are defined, nothing was touched
    Skipped,
    Completed(SyncStats),
}

impl SyncOutcome {
    pub fn stats(&self) -> Option<SyncStats> {
        match self {
            SyncOutcome::Skipped => None,
            SyncOutcome::Completed(stats) => Some(*stats),
        }
    }
}

/// Walks every stored visit and brings its type, name and primary URL in line
/// with `map`. Hosts, destinations, visitor data, timestamps and flags are
/// never written.
pub fn sync_log<S: LogStore + ?Sized>(store: &S, map: Option<&ReferrerMap>) -> Result<SyncOutcome> {
    let Some(map) = map else {
        info!("No referrers defined, skipping log sync");
        return Ok(SyncOutcome::Skipped);
    };

    let mut stats = SyncStats::default();

    for visit in store.visits(&VisitFilter::all())? {
        stats.examined += 1;

        match map.get(&visit.referrer_host) {
            Some(definition) => {
                let update = ClassificationUpdate::diff(&visit, definition);
                if !update.is_empty() {
                    debug!("Reclassifying visit {} as '{}'", visit.id, definition.name);
                    store.update_classification(visit.id, &update)?;
                    stats.updated += 1;
                }
            }
            None => {
                // Blanked even when already blank
                store.update_classification(visit.id, &ClassificationUpdate::cleared())?;
                stats.cleared += 1;
            }
        }
    }

    info!(
        "Log sync complete: {} examined, {} updated, {} cleared",
        stats.examined, stats.updated, stats.cleared
    );

    Ok(SyncOutcome::Completed(stats))
}
