//! Service facade over real SQLite stores

mod common;

use common::*;
use lpdp_rag::providers::ChatModel;
use lpdp_rag::retrieval::{DocumentIndex, SqliteVectorIndex, VectorTable};
use lpdp_rag::session::SqliteSessionStore;
use lpdp_rag::{Error, Message, RagConfig, RagService};
use std::sync::Arc;

fn sqlite_service(dir: &std::path::Path, model: Arc<ScriptedModel>) -> RagService {
    let config = RagConfig::default();
    let index: Arc<dyn DocumentIndex> = Arc::new(SqliteVectorIndex::new(
        VectorTable::open(dir.join("index.sqlite3"), "lpdp_docs").unwrap(),
        Arc::new(KeywordEmbedder),
        "keyword",
    ));
    let sessions = Arc::new(SqliteSessionStore::open(dir.join("sessions.sqlite3")).unwrap());
    let llm: Arc<dyn ChatModel> = model;
    RagService::new(&config, Some(llm), index, sessions).unwrap()
}

#[tokio::test]
async fn test_transcript_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let first = sqlite_service(dir.path(), ScriptedModel::new(vec![Message::assistant("Halo.")]));
    first.get_answer("Apa itu LPDP?", "persist").await.unwrap();
    drop(first);

    let second = sqlite_service(dir.path(), ScriptedModel::new(vec![]));
    let history = second.get_session_history("persist").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "Apa itu LPDP?");
    assert_eq!(history[1].content, "Halo.");

    second.clear_session("persist").await.unwrap();
    assert!(second.get_session_history("persist").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_populate_and_depopulate_directory() {
    let docs = tempfile::tempdir().unwrap();
    std::fs::write(
        docs.path().join("usia.txt"),
        "Usia maksimal pendaftar program doktor adalah 40 tahun.",
    )
    .unwrap();
    std::fs::write(
        docs.path().join("faq.json"),
        r#"{"pertanyaan": "Berapa skor TOEFL?", "jawaban": "Minimal 500."}"#,
    )
    .unwrap();
    std::fs::write(docs.path().join("gambar.png"), [0u8, 1, 2]).unwrap();

    let h = harness(None);
    let (files, chunks) = h.service.populate_from_dir(docs.path()).await.unwrap();
    assert_eq!(files, 2);
    assert_eq!(chunks, 2);
    assert_eq!(h.service.collection_stats().await.unwrap().document_count, 2);

    assert_eq!(h.service.depopulate().await.unwrap(), 2);
    assert_eq!(h.service.collection_stats().await.unwrap().document_count, 0);
}

#[tokio::test]
async fn test_model_failure_degrades_instead_of_erroring() {
    // Deciding call fails: the turn still completes with a fallback answer
    let h = harness(Some(ScriptedModel::new(vec![])));

    let envelope = h.service.get_answer("Apa itu LPDP?", "broken").await.unwrap();
    assert_eq!(envelope.confidence, 0.0);
    assert!(envelope.metadata.error);
    assert!(envelope.sources.is_empty());
}

#[tokio::test]
async fn test_envelope_for_rejected_question() {
    let h = harness(Some(ScriptedModel::new(vec![])));

    let err = h.service.get_answer("  ", "s").await.unwrap_err();
    assert!(matches!(err, Error::InvalidInput(_)));

    let envelope = h.service.answer_envelope("Tulis novel tentang LPDP", "s").await;
    assert_eq!(envelope.confidence, 0.0);
    assert!(envelope.metadata.error);
    assert_eq!(envelope.answer, "Pertanyaan harus terkait dengan informasi beasiswa LPDP.");
}

#[tokio::test]
async fn test_long_question_rejected() {
    let h = harness(Some(ScriptedModel::new(vec![])));
    let question = "beasiswa ".repeat(800);

    match h.service.get_answer(&question, "long").await {
        Err(Error::InvalidInput(msg)) => assert!(msg.starts_with("Pertanyaan terlalu panjang")),
        other => panic!("expected InvalidInput, got {:?}", other.map(|e| e.answer)),
    }
}

#[tokio::test(flavor = "current_thread")]
async fn test_uploads_parse_off_the_runtime_thread() {
    let h = harness(None);

    // A single-threaded runtime keeps ticking while a corrupt PDF is parsed
    let ticker = tokio::spawn(async {
        tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    });
    let err = h
        .service
        .add_document_bytes("rusak.pdf", b"%PDF-1.4 not really a pdf")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileParse { .. }));
    ticker.await.unwrap();

    let stored = h
        .service
        .add_document_bytes("ipk.txt", "IPK minimal 3,00 untuk program magister.".as_bytes())
        .await
        .unwrap();
    assert_eq!(stored, 1);
    assert!(matches!(
        h.service.add_document_bytes("foto.png", &[0u8, 1]).await,
        Err(Error::UnsupportedFileType(_))
    ));
}
