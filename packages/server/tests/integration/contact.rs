use std::sync::atomic::Ordering;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn message_is_mailed_and_acknowledged() {
    let app = TestApp::spawn().await;

    let res = app
        .post_form(
            routes::CONTACT,
            &[
                ("name", "Ada"),
                ("email", "ada@example.com"),
                ("message", "Loved the weather station post."),
            ],
        )
        .await;

    assert_eq!(res.status, 303, "{}", res.text);
    assert_eq!(res.location.as_deref(), Some("/contact"));

    let sent = app.mailer.sent.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "Contact Form: Ada");
    assert_eq!(sent[0].reply_to.as_deref(), Some("ada@example.com"));
    assert!(sent[0].body.contains("Loved the weather station post."));

    assert_eq!(app.flashes().await[0].0, "success");
}

#[tokio::test]
async fn provider_failure_is_flashed_not_raised() {
    let app = TestApp::spawn().await;
    app.mailer.fail.store(true, Ordering::SeqCst);

    let res = app
        .post_form(
            routes::CONTACT,
            &[("name", "Ada"), ("email", "ada@example.com"), ("message", "Hello")],
        )
        .await;

    assert_eq!(res.status, 303);
    assert_eq!(app.flashes().await[0].0, "error");
}

#[tokio::test]
async fn invalid_email_is_rejected_without_mailing() {
    let app = TestApp::spawn().await;

    let res = app
        .post_form(
            routes::CONTACT,
            &[("name", "Ada"), ("email", "ada"), ("message", "Hello")],
        )
        .await;

    assert_eq!(res.status, 400);
    assert_eq!(res.body["code"], "VALIDATION_ERROR");
    assert!(app.mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn missing_fields_are_rejected() {
    let app = TestApp::spawn().await;

    let res = app.post_form(routes::CONTACT, &[("name", "Ada")]).await;

    assert_eq!(res.status, 400);
}
