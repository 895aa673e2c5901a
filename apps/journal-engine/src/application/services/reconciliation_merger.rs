//! Reconciliation Merger
//!
//! Combines the broker ledger with the local annotation overlay. The ledger
//! decides which trades exist and every broker-owned field; the overlay
//! decides every user-owned field.

use std::collections::BTreeMap;

use crate::application::services::AnnotationStore;
use crate::domain::annotation::AnnotationRecord;
use crate::domain::shared::TradeId;
use crate::domain::trade::{LedgerTrade, Trade};

/// Merge the ledger with the store's overlay, preserving ledger order.
pub fn merge(ledger: Vec<LedgerTrade>, annotations: &AnnotationStore) -> Vec<Trade> {
    annotations.with_records(|records| merge_records(ledger, records))
}

/// Merge the ledger with an explicit overlay map.
///
/// A trade without a record gets empty annotation fields and its live stop
/// as the best-guess pin. A trade with a record takes every owned field from
/// it as-is, including an unset pin.
pub fn merge_records(
    ledger: Vec<LedgerTrade>,
    records: &BTreeMap<TradeId, AnnotationRecord>,
) -> Vec<Trade> {
    ledger
        .into_iter()
        .map(|ledger| {
            let annotation = match records.get(&ledger.id) {
                Some(record) => record.clone(),
                None => AnnotationRecord::with_default_stop(ledger.stop_loss),
            };
            Trade { ledger, annotation }
        })
        .collect()
}
