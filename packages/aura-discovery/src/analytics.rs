use std::sync::Arc;

use crate::SearchStore;
use aura_storage::models::SearchAnalyticsRow;

/// Dispatches one analytics write without blocking the response. Failures
/// are logged and swallowed; they must never reach the caller.
pub(crate) fn record(store: &Arc<dyn SearchStore>, record: SearchAnalyticsRow) {
	let store = Arc::clone(store);

	tokio::spawn(async move {
		if let Err(err) = store.record_search(&record).await {
			tracing::warn!(error = %err, "Failed to record search analytics.");
		}
	});
}
