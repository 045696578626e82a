use crate::config::security_config::require_cron_secret;
use crate::models::models::AppState;
use crate::services::sweep::{sweep_stale_reservations, SweepPolicy, SweepReport};
use axum::{extract::State, http::StatusCode, Json};
use http::HeaderMap;
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    get,
    path = "/cron/revert-reserved",
    responses(
        (status = 200, description = "Sweep completed", body = SweepReport),
        (status = 401, description = "Missing or invalid cron secret"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Sweep"
)]
pub async fn cron_revert_reserved(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, (StatusCode, String)> {
    require_cron_secret(&state, &headers)?;

    let report = sweep_stale_reservations(&state, SweepPolicy::Cron).await?;
    info!(
        "Cron sweep finished: {} reverted, {} inspected",
        report.reverted,
        report.details.len()
    );
    Ok(Json(report))
}
