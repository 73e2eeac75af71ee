use axum::body::Bytes;
use chrono::Utc;
use image::ImageFormat;
use sea_orm::{ActiveModelTrait, EntityTrait, PaginatorTrait, Set};

use folio::entity::post::{self, PostKind};
use folio::entity::{photo, project};
use folio::media::{CoverTarget, admit_cover, attach_cover};

use crate::common::{TestApp, encoded_image, jpeg, multipart, routes};

async fn upload(app: &TestApp, csrf: &str, description: &str) -> photo::Model {
    let res = app
        .post_multipart(
            routes::PHOTOS,
            multipart(
                &[("csrf_token", csrf), ("description", description)],
                Some(("holiday.png", encoded_image(900, 900, ImageFormat::Png))),
            ),
        )
        .await;
    assert_eq!(res.status, 303, "{}", res.text);
    assert_eq!(res.location.as_deref(), Some("/photo_album"));

    photo::Entity::find()
        .all(&app.db)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.description.as_deref() == Some(description))
        .expect("photo was not stored")
}

mod album {
    use super::*;

    #[tokio::test]
    async fn uploaded_photo_appears_in_the_album() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        app.flashes().await;

        let photo = upload(&app, &csrf, "Beach").await;
        assert!(photo.filename.ends_with(".png"));
        assert_eq!(
            app.flashes().await,
            vec![("success".to_string(), "Photo uploaded successfully!".to_string())]
        );

        let res = app.get(routes::PHOTOS).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body[0]["filename"], photo.filename.as_str());
        assert_eq!(
            res.body[0]["thumbnail_url"],
            format!("/static/images/thumbnail/{}", photo.filename)
        );
    }

    #[tokio::test]
    async fn renditions_are_served_from_the_static_prefix() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        let photo = upload(&app, &csrf, "Served").await;

        let res = app
            .client
            .get(app.url(&format!("/static/images/medium/{}", photo.filename)))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), 200);
        assert_eq!(res.headers()["content-type"], "image/png");
        let bytes = res.bytes().await.unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert_eq!((img.width(), img.height()), (800, 800));
    }

    #[tokio::test]
    async fn scratch_directory_is_not_served() {
        let app = TestApp::spawn().await;
        std::fs::write(app.image_root.join(".tmp").join("in-flight"), b"raw upload").unwrap();

        for path in ["/static/images/.tmp/in-flight", "/static/images/%2Etmp/in-flight"] {
            let res = app.client.get(app.url(path)).send().await.unwrap();
            assert_eq!(res.status(), 404, "{path}");
        }
    }

    #[tokio::test]
    async fn image_is_required() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app
            .post_multipart(
                routes::PHOTOS,
                multipart(&[("csrf_token", csrf.as_str()), ("description", "Nothing")], None),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unprocessable_upload_is_flashed_as_an_error() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        app.flashes().await;

        let res = app
            .post_multipart(
                routes::PHOTOS,
                multipart(
                    &[("csrf_token", csrf.as_str())],
                    Some(("empty.gif", Vec::new())),
                ),
            )
            .await;

        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(app.flashes().await[0].0, "error");
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn deleting_a_photo_clears_covers_and_files() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;
        let photo = upload(&app, &csrf, "Shared cover").await;

        let item = post::ActiveModel {
            kind: Set(PostKind::Post),
            title: Set("Uses the cover".into()),
            content: Set(None),
            details: Set(None),
            link: Set(None),
            image_filename: Set(Some(photo.filename.clone())),
            project_id: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap();
        let portfolio = project::ActiveModel {
            title: Set("Also uses it".into()),
            description: Set(None),
            link: Set(None),
            image_filename: Set(Some(photo.filename.clone())),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&app.db)
        .await
        .unwrap();

        let res = app
            .post_form(&routes::delete_photo(photo.id), &[("csrf_token", csrf.as_str())])
            .await;
        assert_eq!(res.status, 303, "{}", res.text);
        assert_eq!(res.location.as_deref(), Some("/photo_album"));

        assert!(photo::Entity::find_by_id(photo.id).one(&app.db).await.unwrap().is_none());
        let item = post::Entity::find_by_id(item.id).one(&app.db).await.unwrap().unwrap();
        assert_eq!(item.image_filename, None);
        let portfolio = project::Entity::find_by_id(portfolio.id)
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(portfolio.image_filename, None);

        for rendition in ["thumbnail", "medium", "large"] {
            assert!(!app.rendition_path(rendition, &photo.filename).exists());
        }
    }

    #[tokio::test]
    async fn missing_photo_is_not_found() {
        let app = TestApp::spawn().await;
        let csrf = app.login().await;

        let res = app.post_form(&routes::delete_photo(3), &[("csrf_token", csrf.as_str())]).await;

        assert_eq!(res.status, 404);
    }
}

mod admission {
    use super::*;

    const FORCED: &str = "0123456789abcdef0123456789abcdef.jpg";

    #[tokio::test]
    async fn same_filename_reuses_the_photo() {
        let app = TestApp::spawn().await;
        let bytes = Bytes::from(jpeg(1000, 500));

        let first = admit_cover(&app.state, bytes.clone(), FORCED, Some("first"))
            .await
            .unwrap()
            .expect("first admission stores the photo");
        let second = admit_cover(&app.state, bytes, FORCED, Some("second"))
            .await
            .unwrap()
            .expect("second admission finds the photo");

        assert_eq!(first.id, second.id);
        assert_eq!(second.description.as_deref(), Some("first"));
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn reuse_skips_the_pipeline() {
        let app = TestApp::spawn().await;
        admit_cover(&app.state, Bytes::from(jpeg(1000, 500)), FORCED, None)
            .await
            .unwrap()
            .unwrap();
        let thumbnail = app.rendition_path("thumbnail", FORCED);
        std::fs::remove_file(&thumbnail).unwrap();

        // Undecodable bytes would fail if they were processed.
        let again = admit_cover(&app.state, Bytes::from_static(b"garbage"), FORCED, None)
            .await
            .unwrap();

        assert!(again.is_some());
        assert!(!thumbnail.exists());
    }

    #[tokio::test]
    async fn total_failure_records_nothing() {
        let app = TestApp::spawn().await;

        let admitted = admit_cover(&app.state, Bytes::new(), FORCED, None).await.unwrap();

        assert!(admitted.is_none());
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 0);
        assert!(!app.rendition_path("medium", FORCED).exists());
    }

    #[tokio::test]
    async fn concurrent_admissions_share_one_row() {
        let app = TestApp::spawn().await;
        let bytes = Bytes::from(jpeg(400, 300));

        let (a, b) = tokio::join!(
            admit_cover(&app.state, bytes.clone(), FORCED, None),
            admit_cover(&app.state, bytes, FORCED, None),
        );

        assert_eq!(a.unwrap().unwrap().id, b.unwrap().unwrap().id);
        assert_eq!(photo::Entity::find().count(&app.db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn cover_needs_an_existing_photo_and_target() {
        let app = TestApp::spawn().await;
        let photo = admit_cover(&app.state, Bytes::from(jpeg(50, 50)), FORCED, None)
            .await
            .unwrap()
            .unwrap();

        assert!(attach_cover(&app.db, CoverTarget::Project(1), &photo.filename).await.is_err());
        assert!(attach_cover(&app.db, CoverTarget::Post(1), "missing.jpg").await.is_err());
    }
}
