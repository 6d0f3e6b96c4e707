//! Security catalog ingestion from brokerage fixed-income search exports.
//!
//! Rows that cannot produce a well-formed [`Security`] are dropped here and
//! counted in the [`CatalogReport`]; the allocation engine never sees them.

pub mod export;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use crate::error::LadderError;
use crate::ladder::security::Security;
use crate::LadderResult;

pub use export::parse_export;

/// Which rows of an export qualify for the ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogFilter {
    /// Keep only rows whose attributes contain this flag; `None` keeps all
    pub required_attribute: Option<String>,
}

impl Default for CatalogFilter {
    /// Call protected securities only.
    fn default() -> Self {
        CatalogFilter {
            required_attribute: Some("CP".into()),
        }
    }
}

impl CatalogFilter {
    pub fn all() -> Self {
        CatalogFilter {
            required_attribute: None,
        }
    }
}

/// Row accounting for one ingestion run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReport {
    pub rows_read: usize,
    pub accepted: usize,
    /// Missing identifier or attributes
    pub incomplete: usize,
    /// Rejected by the attribute filter
    pub filtered: usize,
    /// Unparseable price, yield or maturity date, or a negative coupon
    pub skipped: usize,
    /// Identifier already seen in an earlier row or export
    pub duplicates: usize,
}

/// A cleaned catalog and how it was obtained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    pub securities: Vec<Security>,
    pub report: CatalogReport,
}

/// Load and concatenate exports, keeping the first row per identifier.
pub fn load_exports<P: AsRef<Path>>(paths: &[P], filter: &CatalogFilter) -> LadderResult<Catalog> {
    let mut report = CatalogReport::default();
    let mut parsed = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| LadderError::Catalog(format!("Failed to open '{}': {e}", path.display())))?;
        let securities = parse_export(file, filter, &mut report)?;
        info!(path = %path.display(), rows = securities.len(), "loaded export");
        parsed.extend(securities);
    }

    let securities = dedupe(parsed, &mut report);
    report.accepted = securities.len();
    Ok(Catalog { securities, report })
}

/// Drop repeated identifiers, keeping the first occurrence.
pub fn dedupe(securities: Vec<Security>, report: &mut CatalogReport) -> Vec<Security> {
    let mut seen: HashSet<String> = HashSet::with_capacity(securities.len());
    securities
        .into_iter()
        .filter(|s| {
            if seen.insert(s.cusip.clone()) {
                true
            } else {
                warn!(cusip = %s.cusip, "duplicate security ignored");
                report.duplicates += 1;
                false
            }
        })
        .collect()
}
