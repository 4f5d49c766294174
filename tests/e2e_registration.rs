//! End-to-end tests for moment registration and the refresh policy

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use momentcast::AppState;
use momentcast::data::{DraftSink, PostId, ProgressKind, UploadDescriptor};
use momentcast::error::AppError;

use common::{FailingThumbnailer, MockBackend, drain_events, harness, image_draft};

#[tokio::test]
async fn registrar_returns_the_backend_post_id() {
    let backend = MockBackend::spawn().await;
    let app = AppState::new(backend.config()).expect("app state");

    let descriptor = UploadDescriptor::for_image(
        "hi".to_string(),
        "https://storage.example.com/m?alt=media&token=t".to_string(),
        vec![],
    );
    let post_id = app
        .registrar
        .register(&descriptor, "token-1")
        .await
        .expect("register");

    assert_eq!(post_id, PostId("moment-123".to_string()));
    let registrations = backend.state.registrations.lock().unwrap();
    assert_eq!(registrations[0].authorization, "Bearer token-1");
    assert_eq!(registrations[0].body["data"]["caption"], "hi");
}

#[tokio::test]
async fn rejected_registration_refreshes_once_without_replay() {
    let h = harness().await;
    h.backend.state.register_status.store(401, Ordering::SeqCst);
    h.app.drafts.set(image_draft("sunset", vec![]));

    let (orchestrator, mut rx) = h.orchestrator(Arc::new(FailingThumbnailer));
    let error = orchestrator.post_moment().await.expect_err("post must fail");
    assert!(matches!(
        error,
        AppError::Registration(ref message) if message.contains("Unauthenticated request")
    ));

    // Exactly one registration attempt with the original token, then one
    // silent refresh for the next attempt. The failed call is never
    // replayed.
    let registrations = h.backend.state.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 1);
    assert_eq!(registrations[0].authorization, "Bearer token-1");
    drop(registrations);
    assert_eq!(h.backend.state.refresh_calls.load(Ordering::SeqCst), 1);

    let calls = h.backend.state.call_log();
    assert_eq!(calls.last().unwrap(), "refresh");
    assert_eq!(&calls[calls.len() - 2], "register");

    // The refreshed token is installed for whatever comes next.
    let session = h.tokens.session().await.expect("session present");
    assert_eq!(session.id_token, "token-2");

    // Draft preserved; terminal error re-emits the last stage percent.
    assert_eq!(h.app.drafts.current().unwrap().caption, "sunset");
    let events = drain_events(&mut rx);
    let failure = events.last().unwrap();
    assert_eq!(failure.kind, ProgressKind::Error);
    assert_eq!(failure.percent, 80);
    assert!(failure.message.contains("Unauthenticated request"));
}

#[tokio::test]
async fn retry_after_refresh_posts_with_the_new_token() {
    let h = harness().await;
    h.backend.state.register_status.store(401, Ordering::SeqCst);
    h.app.drafts.set(image_draft("sunset", vec![]));

    let (orchestrator, _rx) = h.orchestrator(Arc::new(FailingThumbnailer));
    orchestrator.post_moment().await.expect_err("first post must fail");

    // A later, user-initiated retry picks up the refreshed token.
    h.backend.state.register_status.store(0, Ordering::SeqCst);
    let post_id = orchestrator.post_moment().await.expect("retry");
    assert_eq!(post_id, PostId("moment-123".to_string()));

    let registrations = h.backend.state.registrations.lock().unwrap();
    assert_eq!(registrations.len(), 2);
    assert_eq!(registrations[1].authorization, "Bearer token-2");
}
