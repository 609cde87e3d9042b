//! HTTP behaviour of the chat and admin routes

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::*;
use lpdp_rag::server::router;
use lpdp_rag::server::state::AppState;
use lpdp_rag::session::SessionStore;
use lpdp_rag::{Message, RagConfig};
use serde_json::json;
use std::time::Duration;
use tower::ServiceExt;

#[tokio::test]
async fn test_answer_is_grounded_and_recorded() {
    let model = ScriptedModel::searching("syarat usia LPDP", "Usia maksimal **35 tahun**.");
    let h = harness(Some(model.clone()));
    h.service.add_documents(scholarship_passages()).await.unwrap();

    let response = router(h.state.clone())
        .oneshot(post_json(
            "/chat",
            json!({ "question": "Apa syarat usia pendaftar LPDP?" }),
            Some("e2e"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["answer"], "Usia maksimal **35 tahun**.");
    assert_eq!(body["confidence"], 0.8);
    assert_eq!(body["needs_continuation"], false);
    assert_eq!(body["session_id"], "e2e");
    assert_eq!(body["metadata"]["approach"], "stateful_chain");
    assert_eq!(
        body["metadata"]["steps"],
        json!(["deciding", "retrieving", "generating", "done"])
    );

    let sources = body["sources"].as_array().unwrap();
    assert!(!sources.is_empty());
    assert_eq!(sources[0], "Persyaratan Umum");

    assert_eq!(model.calls(), 2);
    // user, tool call, tool result, answer
    assert_eq!(h.sessions.read("e2e").unwrap().len(), 4);
}

#[tokio::test]
async fn test_off_domain_question_rejected_before_model() {
    let model = ScriptedModel::searching("x", "y");
    let h = harness(Some(model.clone()));

    let response = router(h.state.clone())
        .oneshot(post_json(
            "/chat",
            json!({ "question": "Tulis cerpen tentang kucing" }),
            Some("creative"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["error"],
        "Pertanyaan harus terkait dengan informasi beasiswa LPDP."
    );
    assert_eq!(model.calls(), 0);
    assert!(h.sessions.read("creative").unwrap().is_empty());
}

#[tokio::test]
async fn test_empty_question_is_bad_request() {
    let h = harness(Some(ScriptedModel::new(vec![])));

    for body in [json!({ "question": "   " }), json!({})] {
        let response = router(h.state.clone())
            .oneshot(post_json("/chat", body, Some("empty")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"], "Pertanyaan tidak boleh kosong");
    }
}

#[tokio::test(start_paused = true)]
async fn test_rate_limit_per_session() {
    let model = ScriptedModel::new(vec![
        Message::assistant("Jawaban pertama."),
        Message::assistant("Jawaban kedua."),
    ]);
    let h = harness(Some(model.clone()));
    let app = router(h.state.clone());
    let ask = |id: &'static str| {
        post_json("/chat", json!({ "question": "Apa itu LPDP?" }), Some(id))
    };

    let first = app.clone().oneshot(ask("busy")).await.unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app.clone().oneshot(ask("busy")).await.unwrap();
    assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        json_body(second).await["error"],
        "Silakan tunggu sebentar sebelum mengirim pertanyaan lagi"
    );
    assert_eq!(model.calls(), 1);

    tokio::time::advance(Duration::from_secs(2)).await;

    let third = app.clone().oneshot(ask("busy")).await.unwrap();
    assert_eq!(third.status(), StatusCode::OK);
    assert_eq!(json_body(third).await["answer"], "Jawaban kedua.");
}

#[tokio::test]
async fn test_missing_model_is_unavailable() {
    let h = harness(None);

    let response = router(h.state.clone())
        .oneshot(post_json(
            "/chat",
            json!({ "question": "Apa syarat usia pendaftar LPDP?" }),
            Some("nollm"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json_body(response).await["error"], "Service tidak tersedia saat ini");
}

#[tokio::test]
async fn test_missing_service_is_unavailable() {
    let state = AppState::with_service(RagConfig::default(), None);

    let response = router(state.clone())
        .oneshot(post_json("/chat", json!({ "question": "" }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let history = router(state).oneshot(get("/chat/history", Some("x"))).await.unwrap();
    assert_eq!(history.status(), StatusCode::OK);
    assert_eq!(json_body(history).await, json!({ "history": [] }));
}

#[tokio::test]
async fn test_new_session_gets_cookie() {
    let h = harness(Some(ScriptedModel::new(vec![Message::assistant("Halo.")])));

    let response = router(h.state.clone())
        .oneshot(post_json("/chat", json!({ "question": "Apa itu LPDP?" }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = json_body(response).await;
    let id = body["session_id"].as_str().unwrap();
    assert!(cookie.starts_with(&format!("lpdp_session={}", id)));
}

#[tokio::test]
async fn test_history_then_clear_twice() {
    let model = ScriptedModel::searching("dana hidup", "Dana hidup dibayar bulanan.");
    let h = harness(Some(model));
    h.service.add_documents(scholarship_passages()).await.unwrap();
    let app = router(h.state.clone());

    let asked = app
        .clone()
        .oneshot(post_json(
            "/chat",
            json!({ "question": "Kapan dana hidup dibayarkan?" }),
            Some("hist"),
        ))
        .await
        .unwrap();
    assert_eq!(asked.status(), StatusCode::OK);

    let history = json_body(app.clone().oneshot(get("/chat/history", Some("hist"))).await.unwrap()).await;
    let entries = history["history"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["type"], "human");
    assert_eq!(entries[1]["type"], "ai");
    assert_eq!(entries[1]["content"], "Dana hidup dibayar bulanan.");

    for _ in 0..2 {
        let cleared = app
            .clone()
            .oneshot(post_json("/chat/clear", json!({}), Some("hist")))
            .await
            .unwrap();
        assert_eq!(cleared.status(), StatusCode::OK);
        assert_eq!(json_body(cleared).await, json!({ "success": true }));
    }

    let history = json_body(app.oneshot(get("/chat/history", Some("hist"))).await.unwrap()).await;
    assert_eq!(history, json!({ "history": [] }));
}

#[tokio::test]
async fn test_upload_counts_supported_files() {
    let h = harness(None);
    let (content_type, body) = multipart(&[
        ("documents", "syarat.txt", "Usia maksimal pendaftar adalah 35 tahun."),
        ("documents", "setup.exe", "MZ"),
        ("documents", "kosong.txt", "   "),
    ]);

    let response = router(h.state.clone())
        .oneshot(
            Request::post("/admin/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["message"], "1 dokumen berhasil diproses");

    let stats = json_body(router(h.state.clone()).oneshot(get("/admin/stats", None)).await.unwrap()).await;
    assert_eq!(stats["document_count"], 1);
}

#[tokio::test]
async fn test_upload_without_files_is_bad_request() {
    let h = harness(None);
    let (content_type, body) = multipart(&[]);

    let response = router(h.state.clone())
        .oneshot(
            Request::post("/admin/upload")
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Tidak ada file yang diupload");
}

#[tokio::test]
async fn test_stats_report_collection() {
    let h = harness(Some(ScriptedModel::new(vec![])));
    h.service.add_documents(scholarship_passages()).await.unwrap();

    let response = router(h.state.clone())
        .oneshot(get("/admin/stats", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stats = json_body(response).await;
    assert_eq!(stats["document_count"], 3);
    assert_eq!(stats["vector_store_type"], "sqlite");
    assert_eq!(stats["embedding_model"], "keyword");
    assert_eq!(stats["llm_available"], true);
    assert_eq!(stats["rag_approach"], "stateful_chain");
    assert_eq!(stats["chat_history_managed_by"], "in_memory");
}

#[tokio::test]
async fn test_health_and_chat_page() {
    let h = harness(None);

    let health = router(h.state.clone()).oneshot(get("/health", None)).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);

    let ready = router(h.state.clone()).oneshot(get("/ready", None)).await.unwrap();
    assert_eq!(ready.status(), StatusCode::SERVICE_UNAVAILABLE);

    let page = router(h.state.clone()).oneshot(get("/chat", None)).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert!(page.headers().get(header::SET_COOKIE).is_some());
}
