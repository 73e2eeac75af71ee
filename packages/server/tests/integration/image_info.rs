use axum::body::Bytes;

use folio::media::admit_cover;

use crate::common::{TestApp, jpeg, routes};

const FILENAME: &str = "fedcba9876543210fedcba9876543210.jpg";

#[tokio::test]
async fn known_image_returns_srcset_and_sizes() {
    let app = TestApp::spawn().await;
    admit_cover(&app.state, Bytes::from(jpeg(1600, 900)), FILENAME, None)
        .await
        .unwrap()
        .unwrap();

    let res = app.get(&routes::image_info(FILENAME)).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["filename"], FILENAME);
    assert_eq!(
        res.body["sizes"],
        "(max-width: 600px) 100vw, (max-width: 1200px) 50vw, 800px"
    );
    let srcset = res.body["srcset"].as_str().unwrap();
    assert_eq!(srcset.split(", ").count(), 3);
    assert!(srcset.starts_with(&format!("/static/images/thumbnail/{FILENAME} 300w")));
}

#[tokio::test]
async fn directory_components_are_ignored() {
    let app = TestApp::spawn().await;
    admit_cover(&app.state, Bytes::from(jpeg(64, 64)), FILENAME, None)
        .await
        .unwrap()
        .unwrap();

    let res = app.get(&routes::image_info(&format!("medium/{FILENAME}"))).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.body["filename"], FILENAME);
}

#[tokio::test]
async fn unknown_image_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::image_info("nothing-here.jpg")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.body["code"], "NOT_FOUND");
}
