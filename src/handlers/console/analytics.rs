use axum::extract::State;
use chrono::Utc;

use crate::auth::AdminContext;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::analytics::{summarize, AnalyticsSummary, RECENT_CHANGES};
use crate::state::AppState;

/// GET /analytics - Catalog totals, upload windows, popularity and
/// distributions, plus the latest audit entries
pub async fn analytics(State(state): State<AppState>, _admin: AdminContext) -> ApiResult<AnalyticsSummary> {
    let (books, changes) = futures::try_join!(
        state.store.all_books(),
        state.store.recent_changes(RECENT_CHANGES)
    )?;
    Ok(ApiResponse::success(summarize(books, changes, Utc::now())))
}
