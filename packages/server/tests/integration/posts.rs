use chrono::{Duration, Utc};
use image::GenericImageView;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use folio::entity::post::{self, PostKind};
use folio::entity::photo;

use crate::common::{TestApp, jpeg, multipart, routes};

async fn insert_post(app: &TestApp, title: &str, content: &str, age_minutes: i64) -> post::Model {
    post::ActiveModel {
        kind: Set(PostKind::Post),
        title: Set(title.to_string()),
        content: Set(Some(content.to_string())),
        details: Set(None),
        link: Set(None),
        image_filename: Set(None),
        project_id: Set(None),
        created_at: Set(Utc::now() - Duration::minutes(age_minutes)),
        ..Default::default()
    }
    .insert(&app.db)
    .await
    .unwrap()
}

mod create {
    use super::*;

    #[tokio::test]
    async fn launch_post_gets_a_cover_in_three_sizes() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        app.flashes().await;

        let res = app
            .post_multipart(
                routes::POSTS,
                multipart(
                    &[("csrf_token", csrf.as_str()), ("title", "Launch"), ("content", "We are **live**.")],
                    Some(("Launch Photo.JPG", jpeg(2000, 1500))),
                ),
            )
            .await;
        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some("/"));

        let posts = post::Entity::find().all(&app.db).await.unwrap();
        let photos = photo::Entity::find().all(&app.db).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(photos.len(), 1);
        assert_eq!(posts[0].title, "Launch");
        assert_eq!(posts[0].image_filename.as_deref(), Some(photos[0].filename.as_str()));
        assert!(photos[0].filename.ends_with(".jpg"));

        for (rendition, expected) in [
            ("thumbnail", (300, 225)),
            ("medium", (800, 600)),
            ("large", (1200, 900)),
        ] {
            let stored = image::open(app.rendition_path(rendition, &photos[0].filename)).unwrap();
            assert_eq!(stored.dimensions(), expected, "{rendition}");
        }

        let flashes = app.flashes().await;
        assert_eq!(
            flashes,
            vec![("success".to_string(), "Your post has been created!".to_string())]
        );
    }

    #[tokio::test]
    async fn post_without_image_has_no_cover() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(routes::POSTS, multipart(&[("csrf_token", csrf.as_str()), ("title", "Text only")], None))
            .await;
        assert_eq!(res.status, 303, "{}", res.text);

        let post = post::Entity::find().one(&app.db).await.unwrap().unwrap();
        assert_eq!(post.image_filename, None);
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn review_payload_is_stored_with_its_kind() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(
                routes::POSTS,
                multipart(
                    &[
                        ("csrf_token", csrf.as_str()),
                        ("kind", "review"),
                        ("title", "Reading Dune"),
                        ("item_title", "Dune"),
                        ("category", "book"),
                        ("rating", "5"),
                        ("creator", "Frank Herbert"),
                    ],
                    None,
                ),
            )
            .await;
        assert_eq!(res.status, 303, "{}", res.text);

        let post = post::Entity::find().one(&app.db).await.unwrap().unwrap();
        let detail = app.get(&routes::post(post.id)).await;
        assert_eq!(detail.status, 200);
        assert_eq!(detail.body["kind"], "review");
        assert_eq!(detail.body["body"]["kind"], "review");
        assert_eq!(detail.body["body"]["item_title"], "Dune");
        assert_eq!(detail.body["body"]["rating"], 5);
    }

    #[tokio::test]
    async fn undecodable_image_still_creates_the_post() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        app.flashes().await;

        let res = app
            .post_multipart(
                routes::POSTS,
                multipart(
                    &[("csrf_token", csrf.as_str()), ("title", "Broken cover")],
                    Some(("cover.png", b"definitely not a png".to_vec())),
                ),
            )
            .await;
        assert_eq!(res.status, 303, "{}", res.text);

        let post = post::Entity::find().one(&app.db).await.unwrap().unwrap();
        assert_eq!(post.image_filename, None);
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 0);

        let levels: Vec<_> = app.flashes().await.into_iter().map(|(level, _)| level).collect();
        assert_eq!(levels, ["success", "warning"]);
    }

    #[tokio::test]
    async fn disallowed_extension_is_rejected_before_anything_is_saved() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(
                routes::POSTS,
                multipart(
                    &[("csrf_token", csrf.as_str()), ("title", "Sneaky")],
                    Some(("cover.svg", b"<svg/>".to_vec())),
                ),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(post::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_title_is_rejected() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(routes::POSTS, multipart(&[("csrf_token", csrf.as_str()), ("title", "  ")], None))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_project_is_rejected() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(
                routes::POSTS,
                multipart(&[("csrf_token", csrf.as_str()), ("title", "Orphan"), ("project_id", "99")], None),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(post::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app
            .post_multipart(routes::POSTS, multipart(&[("title", "Anonymous")], None))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn requires_the_csrf_token() {
        let app = TestApp::spawn().await;
        app.login().await;

        let missing = app
            .post_multipart(routes::POSTS, multipart(&[("title", "No token")], None))
            .await;
        assert_eq!(missing.status, 403);
        assert_eq!(missing.body["code"], "CSRF_INVALID");

        let forged = app
            .post_multipart(
                routes::POSTS,
                multipart(&[("csrf_token", "0000"), ("title", "Forged")], None),
            )
            .await;
        assert_eq!(forged.status, 403);
        assert_eq!(post::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn csrf_header_is_accepted() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .client
            .post(app.url(routes::POSTS))
            .header("X-CSRF-Token", &csrf)
            .multipart(multipart(&[("title", "Via header")], None))
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), 303);
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn listing_pages_by_five_newest_first() {
        let app = TestApp::spawn().await;
        for i in 0..7 {
            insert_post(&app, &format!("Post {i}"), "body", 100 - i).await;
        }

        let first = app.get(routes::POSTS).await;
        assert_eq!(first.status, 200, "{}", first.text);
        let titles: Vec<_> = first.body["posts"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(titles, ["Post 6", "Post 5", "Post 4", "Post 3", "Post 2"]);
        assert_eq!(first.body["has_next"], true);

        let second = app.get(&format!("{}?page=2", routes::POSTS)).await;
        assert_eq!(second.body["posts"].as_array().unwrap().len(), 2);
        assert_eq!(second.body["has_next"], false);

        let beyond = app.get(&format!("{}?page=9", routes::POSTS)).await;
        assert_eq!(beyond.status, 200);
        assert!(beyond.body["posts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn huge_page_number_reads_as_an_empty_page() {
        let app = TestApp::spawn().await;
        insert_post(&app, "Only", "body", 0).await;

        let res = app
            .get(&format!("{}?page={}", routes::POSTS, u64::MAX))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert!(res.body["posts"].as_array().unwrap().is_empty());
        assert_eq!(res.body["has_next"], false);
    }

    #[tokio::test]
    async fn listing_truncates_long_bodies() {
        let app = TestApp::spawn().await;
        insert_post(&app, "Long", &"a".repeat(400), 1).await;
        insert_post(&app, "Short", "brief", 0).await;

        let res = app.get(routes::POSTS).await;
        let posts = res.body["posts"].as_array().unwrap();
        assert_eq!(posts[0]["content"], "brief");
        let long = posts[1]["content"].as_str().unwrap();
        assert_eq!(long, format!("{}...", "a".repeat(300)));
        assert_eq!(posts[1]["srcset"], "");
        assert_eq!(posts[1]["date_posted"].as_str().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn detail_renders_markdown_without_raw_html() {
        let app = TestApp::spawn().await;
        let post = insert_post(&app, "Notes", "# Hi\n\n<script>alert(1)</script>\n\n*ok*", 0).await;

        let res = app.get(&routes::post(post.id)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        let html = res.body["content_html"].as_str().unwrap();
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<em>ok</em>"));
        assert!(!html.contains("<script>"));
        assert_eq!(res.body["body"]["kind"], "post");
    }

    #[tokio::test]
    async fn missing_post_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::post(404)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn admin_can_delete_a_post() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        let post = insert_post(&app, "Doomed", "", 0).await;

        let res = app
            .post_form(&routes::delete_post(post.id), &[("csrf_token", csrf.as_str())])
            .await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some("/"));
        assert!(post::Entity::find_by_id(post.id).one(&app.db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn deleting_a_missing_post_is_not_found() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app.post_form(&routes::delete_post(77), &[("csrf_token", csrf.as_str())]).await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn delete_checks_csrf() {
        let app = TestApp::spawn().await;
        app.login().await;
        let post = insert_post(&app, "Kept", "", 0).await;

        let res = app.post_form(&routes::delete_post(post.id), &[("csrf_token", "bad")]).await;

        assert_eq!(res.status, 403);
        assert!(post::Entity::find_by_id(post.id).one(&app.db).await.unwrap().is_some());
    }
}
