use crate::{
    errors::AppError, handlers::owner::Owner, models::responses::DashboardResponse,
    services::storage_service::StorageService,
};
use axum::{Json, extract::State};

/// `GET /api/v1/storage/dashboard`: trailing 12-month usage for the caller.
pub async fn dashboard(
    State(service): State<StorageService>,
    Owner(owner_id): Owner,
) -> Result<Json<DashboardResponse>, AppError> {
    let report = service.compute_monthly_usage(&owner_id).await?;
    Ok(Json(DashboardResponse {
        success: true,
        message: "Dashboard data fetched successfully".into(),
        data: report,
    }))
}
