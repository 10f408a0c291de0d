use actix_web::web;

pub mod decks;
pub mod health;
pub mod realtime;
pub mod sessions;

/// Register every route. Shared by `main` and the integration tests so both
/// exercise the same paths.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Sessions: /api/sessions/**
    cfg.service(web::scope("/api/sessions").configure(sessions::configure_routes));

    // Deck preview: /api/decks
    cfg.service(web::scope("/api/decks").configure(decks::configure_routes));

    // Realtime: /api/ws/**
    cfg.service(web::scope("/api/ws").configure(realtime::configure_routes));
}
