use actix_web::{HttpResponse, Responder, get, web};
use log::warn;

use super::models::{AppState, ChainResponse, ValidateResponse};
use crate::blockchain::Ledger;

/// Get the full chain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let (chain, length) = state.ledger.get_chain();
    HttpResponse::Ok().json(ChainResponse { chain, length })
}

/// Validate hash linkage and proofs of the whole chain.
#[get("/chain/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let (chain, length) = state.ledger.get_chain();
    let valid = Ledger::valid_chain(&chain);
    if !valid {
        warn!("chain of length {length} failed validation");
    }
    HttpResponse::Ok().json(ValidateResponse { valid, length })
}
