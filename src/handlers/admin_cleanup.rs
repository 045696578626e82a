use crate::models::models::AppState;
use crate::services::sweep::{sweep_stale_reservations, SweepPolicy, SweepReport};
use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::info;

#[utoipa::path(
    post,
    path = "/api/admin/cleanup-reserved",
    responses(
        (status = 200, description = "Cleanup completed", body = SweepReport),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearerAuth" = [])),
    tag = "Sweep"
)]
pub async fn admin_cleanup_reserved(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SweepReport>, (StatusCode, String)> {
    let report = sweep_stale_reservations(&state, SweepPolicy::Manual).await?;
    info!(
        "Manual cleanup finished: {} reverted, {} inspected",
        report.reverted,
        report.details.len()
    );
    Ok(Json(report))
}
