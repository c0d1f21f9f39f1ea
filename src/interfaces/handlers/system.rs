use actix_web::{web, get, HttpResponse, Responder};
use humantime::format_duration;
use std::time::Duration;
use serde::Serialize;

use crate::{constants::START_TIME, repositories::education_api::EducationApi, AppState};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    uptime: String,
    timestamp: String,
    start_at: String,
    version: &'static str,
    remote_api: String,
    owner_mode: String,
    local_records: usize,
}

#[get("/health")]
pub async fn admin_health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = chrono::Utc::now();
    let uptime = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime.num_seconds().max(0) as u64));

    let handler = &state.form_handler;
    let remote_api = match handler.api.list_education().await {
        Ok(_) => "OK".to_string(),
        Err(e) => match e.status() {
            Some(code) => format!("Unavailable ({})", code),
            None => "Unreachable".to_string(),
        },
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy",
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        start_at: START_TIME.to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
        remote_api,
        owner_mode: format!("{:?}", handler.owner_mode()),
        local_records: handler.local.read_all().len(),
    })
}
