use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, HealthResponse};

/// Liveness plus a glance at the ledger.
#[get("/health/")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        node_id: state.node_id.clone(),
        length: state.ledger.len(),
        pending: state.ledger.pending_transactions().len(),
    })
}
