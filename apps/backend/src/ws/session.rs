//! Websocket actor streaming one session's events to a client.

use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use serde::Serialize;
use serde_json::to_string;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::Session;
use crate::extractors::SessionId;
use crate::realtime::{topic_for, EventEnvelope, EventStream, SessionEvent};
use crate::state::app_state::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[allow(clippy::large_enum_variant)]
enum OutgoingMessage {
    Ack {
        message: &'static str,
    },
    Snapshot {
        session: Session,
    },
    Event {
        version: u64,
        #[serde(flatten)]
        event: SessionEvent,
    },
}

/// GET /api/ws/sessions/{session_id}
///
/// Subscribes before reading the snapshot so no commit can fall between them.
/// A refused upgrade drops the subscription again.
pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    session_id: SessionId,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let events = app_state.gateway().subscribe(&topic_for(session_id.as_str()));
    let snapshot = app_state
        .coordinator
        .get_session(session_id.as_str())
        .await
        .map_err(crate::error::AppError::from)?;

    let actor = SessionWsConnection::new(session_id.0, snapshot, events);
    ws::start(actor, &req, stream)
}

pub struct SessionWsConnection {
    connection_id: Uuid,
    session_id: String,
    last_heartbeat: Instant,
    /// Version of the snapshot sent on connect; older events are already reflected in it.
    snapshot_version: u64,
    last_version: u64,
    pending_messages: Vec<OutgoingMessage>,
    events: Option<EventStream>,
}

impl SessionWsConnection {
    fn new(session_id: String, snapshot: Session, events: EventStream) -> Self {
        let version = snapshot.version;
        Self {
            connection_id: Uuid::new_v4(),
            session_id,
            last_heartbeat: Instant::now(),
            snapshot_version: version,
            last_version: version,
            pending_messages: vec![
                OutgoingMessage::Ack {
                    message: "connected",
                },
                OutgoingMessage::Snapshot { session: snapshot },
            ],
            events: Some(events),
        }
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(
                    connection_id = %actor.connection_id,
                    session_id = %actor.session_id,
                    "Websocket client heartbeat timed out"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }

            ctx.ping(b"keepalive");
        });
    }

    fn send(&self, message: &OutgoingMessage, ctx: &mut ws::WebsocketContext<Self>) {
        match to_string(message) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(
                connection_id = %self.connection_id,
                error = %err,
                "Failed to serialize websocket message"
            ),
        }
    }

    /// Drops envelopes already covered by the snapshot or arriving out of order.
    fn accepts(&self, version: u64) -> bool {
        version > self.snapshot_version && version >= self.last_version
    }
}

impl Actor for SessionWsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(
            connection_id = %self.connection_id,
            session_id = %self.session_id,
            "Websocket session started"
        );

        for message in std::mem::take(&mut self.pending_messages) {
            self.send(&message, ctx);
        }
        if let Some(events) = self.events.take() {
            ctx.add_stream(events);
        }
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        info!(
            connection_id = %self.connection_id,
            session_id = %self.session_id,
            "Websocket session stopped"
        );
    }
}

impl StreamHandler<EventEnvelope> for SessionWsConnection {
    fn handle(&mut self, envelope: EventEnvelope, ctx: &mut Self::Context) {
        if !self.accepts(envelope.version) {
            debug!(
                connection_id = %self.connection_id,
                version = envelope.version,
                last_version = self.last_version,
                "Skipping stale session event"
            );
            return;
        }
        self.last_version = envelope.version;
        self.send(
            &OutgoingMessage::Event {
                version: envelope.version,
                event: envelope.event,
            },
            ctx,
        );
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The gateway went away; nothing more will arrive for this client.
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Away)));
        ctx.stop();
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for SessionWsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            // Clients do not send commands over the socket; any frame counts as liveness.
            Ok(_) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(
                    connection_id = %self.connection_id,
                    session_id = %self.session_id,
                    error = %err,
                    "Websocket protocol error"
                );
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}
