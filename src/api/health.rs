//! Liveness and readiness endpoints.
//!
//! Readiness covers the two dependencies a submission touches: the wastages
//! table (connectivity plus applied migrations) and the uploads directory.

use actix_web::{HttpResponse, get, web};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DatabaseBackend, Statement};
use serde::Serialize;
use tracing::warn;
use utoipa::ToSchema;

use crate::config::Config;
use crate::db::DbPool;
use crate::services::storage::UPLOADS_PREFIX;

/// Liveness response.
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    status: &'static str,
    service: &'static str,
    timestamp: DateTime<Utc>,
}

/// Readiness response; each dependency reports its own state.
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    status: &'static str,
    database: &'static str,
    uploads_dir: &'static str,
}

/// Liveness check; 200 whenever the process is serving requests.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is running", body = HealthResponse)
    )
)]
#[get("/health")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        service: "wastage-upload-server",
        timestamp: Utc::now(),
    })
}

/// Readiness check.
///
/// Queries the wastages table (which also fails when migrations have not
/// run) and checks that the uploads directory exists.
#[utoipa::path(
    get,
    path = "/api/v1/ready",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies ready", body = ReadyResponse),
        (status = 503, description = "A dependency is unavailable", body = ReadyResponse)
    )
)]
#[get("/ready")]
pub async fn ready(pool: web::Data<DbPool>, config: web::Data<Config>) -> HttpResponse {
    let stmt = Statement::from_string(
        DatabaseBackend::Postgres,
        "SELECT COUNT(*) FROM wastages".to_owned(),
    );
    let database = match pool.connection().query_one_raw(stmt).await {
        Ok(_) => "ready",
        Err(e) => {
            warn!("Readiness check failed against wastages table: {}", e);
            "unavailable"
        }
    };

    let uploads_dir = match tokio::fs::metadata(config.web_root.join(UPLOADS_PREFIX)).await {
        Ok(meta) if meta.is_dir() => "ready",
        _ => "missing",
    };

    let all_ready = database == "ready" && uploads_dir == "ready";
    let body = ReadyResponse {
        status: if all_ready { "ready" } else { "not_ready" },
        database,
        uploads_dir,
    };

    if all_ready {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Configure health routes.
pub fn configure_health_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health).service(ready);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test};

    #[actix_rt::test]
    async fn test_health_reports_running() {
        let app = test::init_service(App::new().service(health)).await;
        let req = test::TestRequest::get().uri("/health").to_request();

        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_success());

        let json: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "wastage-upload-server");
    }
}
