use serde_json::json;

use crate::common::{ADMIN_PASSWORD, ADMIN_USERNAME, TestApp, new_client, routes};

mod login {
    use super::*;

    #[tokio::test]
    async fn admin_can_log_in_and_see_their_session() {
        let app = TestApp::spawn().await;

        let csrf_token = app.login().await;
        assert_eq!(csrf_token.len(), 64);

        let me = app.get(routes::ME).await;
        assert_eq!(me.status, 200, "{}", me.text);
        assert_eq!(me.body["username"], ADMIN_USERNAME);
        assert_eq!(me.body["csrf_token"], csrf_token.as_str());
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": "nope"}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn unknown_user_gets_the_same_answer() {
        let app = TestApp::spawn().await;

        let res = app
            .post_json(routes::LOGIN, &json!({"username": "mallory", "password": ADMIN_PASSWORD}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "INVALID_CREDENTIALS");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.post_json(routes::LOGIN, &json!({"username": ADMIN_USERNAME})).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn login_queues_a_welcome_flash() {
        let app = TestApp::spawn().await;
        app.login().await;

        let flashes = app.flashes().await;
        assert_eq!(flashes.len(), 1);
        assert_eq!(flashes[0].0, "success");
        assert!(flashes[0].1.contains(ADMIN_USERNAME));

        assert!(app.flashes().await.is_empty());
    }
}

mod session {
    use super::*;

    #[tokio::test]
    async fn me_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::ME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn bearer_token_works_without_cookies() {
        let app = TestApp::spawn().await;
        let login = app
            .post_json(
                routes::LOGIN,
                &json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
            )
            .await;
        let token = login.body["token"].as_str().unwrap();

        let res = reqwest::Client::new()
            .get(app.url(routes::ME))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 200);
    }

    #[tokio::test]
    async fn forged_token_is_rejected() {
        let app = TestApp::spawn().await;

        let res = new_client()
            .get(app.url(routes::ME))
            .header("Authorization", "Bearer not.a.jwt")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 401);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn logout_ends_the_session() {
        let app = TestApp::spawn().await;
        app.login().await;
        app.flashes().await;

        let res = app.post_form(routes::LOGOUT, &[]).await;
        assert_eq!(res.status, 303);
        assert_eq!(res.location.as_deref(), Some("/"));

        assert_eq!(app.get(routes::ME).await.status, 401);
        let flashes = app.flashes().await;
        assert_eq!(flashes[0].1, "You have been logged out successfully!");
    }

    #[tokio::test]
    async fn each_login_gets_its_own_csrf_token() {
        let app = TestApp::spawn().await;
        let first = app.login().await;
        let second = app.login().await;
        assert_ne!(first, second);
    }
}
