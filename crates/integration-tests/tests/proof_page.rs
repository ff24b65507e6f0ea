//! Customer proof pages rendered from real workflow reads.

#![allow(clippy::unwrap_used)]

use simpler_proofs_core::Actor;
use simpler_proofs_integration_tests::{Fixture, after, noon};
use simpler_proofs_server::models::{CommentBody, StoredSettings};
use simpler_proofs_server::routes::public::PublicPage;

async fn render(fx: &Fixture, minutes_after_noon: i64) -> String {
    let page = fx
        .workflow
        .proof_page(fx.slug(), fx.order_id(), after(noon(), minutes_after_noon, 0))
        .await
        .unwrap();
    PublicPage::from_page(&page).render().unwrap()
}

fn settings() -> StoredSettings {
    StoredSettings {
        proof_page_instructions: Some("Check spelling and colours carefully.".into()),
        thanks_message: Some("Thanks, we will start printing soon.".into()),
        revision_message: Some("Got it, a new proof is on the way.".into()),
        show_timer: Some(true),
        timer_duration: Some(48),
        enable_undo_approval: Some(true),
        undo_approval_time: Some(30),
        ..StoredSettings::default()
    }
}

#[tokio::test]
async fn test_no_proof_page() {
    let fx = Fixture::with_settings(settings());
    let html = render(&fx, 0).await;

    assert!(html.contains("We're still working on your proof."));
    assert!(html.contains("Sunny Prints"));
    assert!(!html.contains("Approve Proof"));
}

#[tokio::test]
async fn test_active_page_shows_proof_actions_and_comments() {
    let fx = Fixture::with_settings(settings());
    fx.send_new_proof("https://files.test/proofs/1.png").await;
    for text in ["Looks close", "Bigger logo please"] {
        fx.workflow
            .comment(
                &Actor::Customer,
                &fx.public(),
                fx.order_id(),
                &CommentBody::parse(text).unwrap(),
            )
            .await
            .unwrap();
    }

    let html = render(&fx, 0).await;

    assert!(html.contains("Please review and respond to this proof within 48 hours"));
    assert!(html.contains("Check spelling and colours carefully."));
    assert!(html.contains(r#"<img src="https://files.test/proofs/1.png""#));
    assert!(html.contains("Approve Proof"));
    assert!(html.contains("Request Changes"));

    let action = format!("/p/sunny-prints/{}/approve", fx.order_id());
    assert!(html.contains(&action));

    let first = html.find("Looks close").unwrap();
    let second = html.find("Bigger logo please").unwrap();
    assert!(first < second);
}

#[tokio::test]
async fn test_pdf_proof_is_embedded() {
    let fx = Fixture::with_settings(settings());
    fx.send_new_proof("https://files.test/proofs/1.PDF").await;

    let html = render(&fx, 0).await;
    assert!(html.contains(r#"type="application/pdf""#));
    assert!(!html.contains("<img src="));
}

#[tokio::test]
async fn test_approved_page_offers_undo_then_hides_it() {
    let fx = Fixture::with_settings(settings());
    fx.send_new_proof("https://files.test/proofs/1.png").await;
    fx.workflow
        .approve(&Actor::Customer, &fx.public(), fx.order_id(), noon())
        .await
        .unwrap();

    let html = render(&fx, 10).await;
    assert!(html.contains("Thanks, we will start printing soon."));
    assert!(html.contains("You can undo your approval for the next 30 minutes."));
    assert!(!html.contains("Approve Proof"));

    let html = render(&fx, 30).await;
    assert!(html.contains("Thanks, we will start printing soon."));
    assert!(!html.contains("undo your approval"));
}

#[tokio::test]
async fn test_changes_requested_page_has_no_actions() {
    let fx = Fixture::with_settings(settings());
    fx.send_new_proof("https://files.test/proofs/1.png").await;
    fx.workflow
        .request_changes(&Actor::Customer, &fx.public(), fx.order_id())
        .await
        .unwrap();

    let html = render(&fx, 0).await;
    assert!(html.contains("Got it, a new proof is on the way."));
    assert!(!html.contains("Approve Proof"));
    assert!(!html.contains("Request Changes"));
}

#[tokio::test]
async fn test_timer_hidden_when_disabled() {
    let fx = Fixture::with_settings(StoredSettings {
        show_timer: Some(false),
        ..settings()
    });
    fx.send_new_proof("https://files.test/proofs/1.png").await;

    let html = render(&fx, 0).await;
    assert!(!html.contains("Please review and respond"));
}
