use actix_web::{get, HttpResponse, Responder};

#[get("/")]
pub async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Portfolio education records service",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
        "records": "/education",
        "health": "/admin/health"
    }))
}
