//! Session HTTP routes: create, join, move, fetch.

use actix_web::http::header::{ETAG, IF_NONE_MATCH};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardId, Player, Session};
use crate::error::AppError;
use crate::extractors::{SessionId, ValidatedJson};
use crate::services::MoveResult;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub host_id: String,
    pub host_name: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub pair_count: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub session: Session,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinSessionRequest {
    pub player_id: String,
    pub player_name: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub player_id: String,
    pub card_id: CardId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveResponse {
    pub session: Session,
    pub match_found: bool,
    pub turn_switched: bool,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_card_id: Option<CardId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub second_card_id: Option<CardId>,
    /// The resolved pair as it looked face up; empty until a pair resolves.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub revealed: Vec<Card>,
}

impl From<MoveResult> for MoveResponse {
    fn from(result: MoveResult) -> Self {
        Self {
            session: result.session,
            match_found: result.match_found,
            turn_switched: result.turn_switched,
            resolved: result.resolved,
            first_card_id: result.first_card_id,
            second_card_id: result.second_card_id,
            revealed: result.revealed,
        }
    }
}

/// Weak validator tied to the committed version.
pub fn session_etag(session: &Session) -> String {
    format!("W/\"session-{}-v{}\"", session.session_id, session.version)
}

/// POST /api/sessions
async fn create_session(
    body: ValidatedJson<CreateSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let session = app_state
        .coordinator
        .create_session(
            Player::new(req.host_id, req.host_name),
            req.session_id,
            req.pair_count,
        )
        .await?;

    Ok(HttpResponse::Created().json(CreateSessionResponse {
        session_id: session.session_id.clone(),
        session,
    }))
}

/// POST /api/sessions/{session_id}/join
async fn join_session(
    session_id: SessionId,
    body: ValidatedJson<JoinSessionRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let result = app_state
        .coordinator
        .join_session(
            session_id.as_str(),
            Player::new(req.player_id, req.player_name),
        )
        .await?;

    Ok(HttpResponse::Ok().json(SessionResponse {
        session: result.session,
    }))
}

/// POST /api/sessions/{session_id}/moves
async fn request_move(
    session_id: SessionId,
    body: ValidatedJson<MoveRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let req = body.into_inner();
    let result = app_state
        .coordinator
        .request_move(session_id.as_str(), &req.player_id, req.card_id)
        .await?;

    Ok(HttpResponse::Ok().json(MoveResponse::from(result)))
}

/// GET /api/sessions/{session_id}
///
/// Current authoritative state. Honors `If-None-Match` against the version ETag.
async fn get_session(
    http_req: HttpRequest,
    session_id: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let session = app_state.coordinator.get_session(session_id.as_str()).await?;
    let etag = session_etag(&session);

    let unchanged = http_req
        .headers()
        .get(IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.split(',').any(|tag| tag.trim() == etag));
    if unchanged {
        return Ok(HttpResponse::NotModified()
            .insert_header((ETAG, etag))
            .finish());
    }

    Ok(HttpResponse::Ok()
        .insert_header((ETAG, etag))
        .json(SessionResponse { session }))
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::post().to(create_session)));
    cfg.service(web::resource("/{session_id}").route(web::get().to(get_session)));
    cfg.service(web::resource("/{session_id}/join").route(web::post().to(join_session)));
    cfg.service(web::resource("/{session_id}/moves").route(web::post().to(request_move)));
}
