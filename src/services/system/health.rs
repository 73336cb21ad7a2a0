use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};

use super::SystemService;
use crate::models::{
    ApiResponse, AppStartTime, ErrorCode,
    system::{entities::HealthStatus, responses::HealthResponse},
};

fn uptime_seconds(request: &HttpRequest) -> i64 {
    request
        .app_data::<web::Data<AppStartTime>>()
        .map(|start| {
            chrono::Utc::now()
                .signed_duration_since(start.start_datetime)
                .num_seconds()
        })
        .unwrap_or_default()
}

pub async fn health(service: &SystemService, request: &HttpRequest) -> ActixResult<HttpResponse> {
    let database = match service.get_storage(request) {
        Some(storage) => match storage.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Health check database ping failed: {}", e);
                false
            }
        },
        None => false,
    };

    let health = HealthStatus {
        status: if database { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: uptime_seconds(request),
        database,
    };

    if database {
        Ok(HttpResponse::Ok().json(ApiResponse::success(HealthResponse { health }, "OK")))
    } else {
        Ok(HttpResponse::ServiceUnavailable().json(ApiResponse::error(
            ErrorCode::InternalServerError,
            HealthResponse { health },
            "Database unavailable",
        )))
    }
}
