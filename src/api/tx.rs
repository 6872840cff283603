use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{AppState, ErrorResponse, NewTxRequest, NewTxResponse, PendingResponse};

/// Queue a transaction for the next mined block.
#[post("/transactions/new/")]
pub async fn post_transaction(
    state: web::Data<AppState>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let NewTxRequest {
        sender,
        recipient,
        amount,
    } = body.into_inner();

    let (sender, recipient, amount) = match (sender, recipient, amount) {
        (Some(s), Some(r), Some(a)) => (s, r, a),
        (s, r, a) => {
            let missing = [
                ("sender", s.is_none()),
                ("recipient", r.is_none()),
                ("amount", a.is_none()),
            ]
            .into_iter()
            .filter_map(|(name, absent)| absent.then_some(name))
            .collect::<Vec<_>>();
            warn!("POST /transactions/new/ - rejected, missing {missing:?}");
            return HttpResponse::BadRequest().json(ErrorResponse {
                message: "Missing values".into(),
                missing,
            });
        }
    };

    let index = state.ledger.new_transaction(&*sender, &*recipient, amount);
    info!("POST /transactions/new/ - {sender} -> {recipient} ({amount}) queued for block #{index}");

    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to Block {index}"),
        index,
    })
}

/// List transactions waiting for the next block.
#[get("/transactions/pending/")]
pub async fn get_pending(state: web::Data<AppState>) -> impl Responder {
    let transactions = state.ledger.pending_transactions();
    HttpResponse::Ok().json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}
