//! Handler for daily rollup queries.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::api::dto::metrics::MetricsQuery;
use crate::api::middleware::auth::Caller;
use crate::domain::entities::DailyMetric;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the caller's daily rollups for one code.
///
/// # Endpoint
///
/// `GET /api/metrics/{code}?start_date=2023-01-01&end_date=2023-01-31`
///
/// Both dates default to today (UTC). Days without traffic are omitted.
///
/// # Response
///
/// ```json
/// [
///   {
///     "code": "stdk9XbQ2e",
///     "day": "2023-01-01",
///     "total_hits": 5,
///     "by_country": { "IN": 2, "US": 3 },
///     "by_device_type": { "desktop": 5 },
///     "by_referrer": { "none": 5 }
///   }
/// ]
/// ```
///
/// # Errors
///
/// - 403 if the code belongs to another owner
/// - 404 if the code does not exist
/// - 422 if the range is inverted or longer than a year
pub async fn metrics_handler(
    State(state): State<AppState>,
    caller: Caller,
    Path(code): Path<String>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<Vec<DailyMetric>>, AppError> {
    let (from, to) = query.range();
    let rows = state
        .metrics_service
        .get_metrics(&code, &caller.owner_id, from, to)
        .await?;

    Ok(Json(rows))
}
