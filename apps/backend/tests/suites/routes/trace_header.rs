// Every response carries an x-trace-id; error bodies repeat it.

use actix_web::http::StatusCode;
use actix_web::{test, web, HttpResponse};
use matchroom::trace_ctx;
use serde_json::json;

use crate::common::{read_json, trace_header};
use crate::support::{build_test_state, create_test_app};

#[actix_web::test]
async fn success_and_error_responses_carry_trace_ids() {
    let app = create_test_app(build_test_state().await)
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::post()
        .uri("/api/sessions")
        .set_json(json!({ "hostId": "h", "hostName": "H", "sessionId": "traced" }))
        .to_request();
    let ok = test::call_service(&app, req).await;
    assert_eq!(ok.status(), StatusCode::CREATED);
    let first = trace_header(&ok);

    let req = test::TestRequest::get().uri("/api/sessions/untraced").to_request();
    let missing = test::call_service(&app, req).await;
    let second = trace_header(&missing);
    let body = read_json(missing).await;

    assert_ne!(first, second, "each request gets its own trace id");
    assert_eq!(body["trace_id"], second);
}

#[actix_web::test]
async fn handlers_see_the_request_trace_id() {
    let app = create_test_app(build_test_state().await)
        .with_routes(|cfg| {
            cfg.route(
                "/whoami",
                web::get().to(|| async {
                    HttpResponse::Ok().json(json!({ "trace": trace_ctx::trace_id() }))
                }),
            );
        })
        .build()
        .await;

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;
    let header = trace_header(&resp);
    let body = read_json(resp).await;

    assert_eq!(body["trace"], header);
    assert_ne!(header, "unknown");
}

#[actix_web::test]
async fn well_formed_inbound_trace_id_is_kept() {
    let app = create_test_app(build_test_state().await)
        .with_prod_routes()
        .build()
        .await;

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-trace-id", "client-abc"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(trace_header(&resp), "client-abc");

    let req = test::TestRequest::get()
        .uri("/health")
        .insert_header(("x-trace-id", "not a valid id"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    let replaced = trace_header(&resp);
    assert_ne!(replaced, "not a valid id");
    assert!(!replaced.is_empty());
}
