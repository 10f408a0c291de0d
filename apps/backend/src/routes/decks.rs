use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{default_deck, Card};
use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::state::app_state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckRequest {
    #[serde(default)]
    pub pair_count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct DeckResponse {
    pub cards: Vec<Card>,
}

/// POST /api/decks
///
/// Preview a freshly shuffled deck; nothing is stored.
async fn generate(
    body: ValidatedJson<DeckRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let pair_count = body.pair_count.unwrap_or(app_state.config.pair_count);
    let cards = default_deck(pair_count)?;
    Ok(HttpResponse::Ok().json(DeckResponse { cards }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(generate)));
}
