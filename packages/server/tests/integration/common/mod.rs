use std::io::Cursor;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, redirect};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use common::{Storage, StorageConfig};
use folio::config::{
    AppConfig, AuthConfig, CorsConfig, DatabaseConfig, ImageConfig, MailConfig, ServerConfig,
};
use folio::mail::{MailError, Mailer, OutgoingMail};
use folio::state::AppState;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";
pub const JWT_SECRET: &str = "test-secret-for-integration-tests";

pub mod routes {
    pub const LOGIN: &str = "/api/auth/login";
    pub const LOGOUT: &str = "/api/auth/logout";
    pub const ME: &str = "/api/auth/me";
    pub const FLASH: &str = "/api/flash";
    pub const POSTS: &str = "/api/posts";
    pub const PROJECTS: &str = "/api/projects";
    pub const PHOTOS: &str = "/api/photos";
    pub const CONTACT: &str = "/api/contact";

    pub fn post(id: i32) -> String {
        format!("/api/posts/{id}")
    }

    pub fn delete_post(id: i32) -> String {
        format!("/api/posts/{id}/delete")
    }

    pub fn project(id: i32) -> String {
        format!("/api/projects/{id}")
    }

    pub fn delete_project(id: i32) -> String {
        format!("/api/projects/{id}/delete")
    }

    pub fn delete_photo(id: i32) -> String {
        format!("/api/photos/{id}/delete")
    }

    pub fn image_info(filename: &str) -> String {
        format!("/api/image-info/{filename}")
    }
}

/// Mailer that keeps what it was asked to send.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), MailError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(MailError::Rejected {
                status: 503,
                message: "provider down".into(),
            });
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// A running test server backed by a throwaway SQLite file and image root.
pub struct TestApp {
    pub addr: SocketAddr,
    /// Keeps cookies and never follows redirects.
    pub client: Client,
    pub db: DatabaseConnection,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub image_root: PathBuf,
    _dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// `Location` header of a redirect.
    pub location: Option<String>,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestResponse {
    async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let location = res
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let text = res.text().await.expect("Failed to read response body");
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self {
            status,
            location,
            text,
            body,
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
        let image_root = dir.path().join("images");

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig::default(),
            },
            database: DatabaseConfig {
                url: db_url.clone(),
                max_connections: 5,
            },
            auth: AuthConfig {
                jwt_secret: JWT_SECRET.to_string(),
                admin_username: ADMIN_USERNAME.to_string(),
                admin_password: Some(ADMIN_PASSWORD.to_string()),
                session_ttl_hours: 1,
                secure_cookies: false,
            },
            storage: StorageConfig {
                root: image_root.clone(),
                ..StorageConfig::default()
            },
            images: ImageConfig::default(),
            mail: MailConfig::default(),
        };

        let db = folio::database::init_db(&db_url, config.database.max_connections)
            .await
            .expect("Failed to initialize test database");
        folio::seed::seed_admin(&db, &config.auth)
            .await
            .expect("Failed to seed admin");
        let storage = Storage::from_config(&config.storage)
            .await
            .expect("Failed to create image storage");

        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(db.clone(), config, storage, mailer.clone());
        let app = folio::build_router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: new_client(),
            db,
            state,
            mailer,
            image_root,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .form(fields)
            .send()
            .await
            .expect("Failed to send form request");

        TestResponse::from_response(res).await
    }

    pub async fn post_multipart(&self, path: &str, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Log in as the seeded admin; the session cookie is kept by `client`.
    /// Returns the CSRF token.
    pub async fn login(&self) -> String {
        let res = self
            .post_json(
                routes::LOGIN,
                &serde_json::json!({"username": ADMIN_USERNAME, "password": ADMIN_PASSWORD}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["csrf_token"]
            .as_str()
            .expect("Login response missing csrf_token")
            .to_string()
    }

    /// Drain flash messages as `(level, message)` pairs.
    pub async fn flashes(&self) -> Vec<(String, String)> {
        let res = self.get(routes::FLASH).await;
        assert_eq!(res.status, 200, "Flash fetch failed: {}", res.text);
        res.body["messages"]
            .as_array()
            .expect("messages array")
            .iter()
            .map(|m| {
                (
                    m["level"].as_str().unwrap_or_default().to_string(),
                    m["message"].as_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    /// Path of a stored rendition on disk.
    pub fn rendition_path(&self, rendition: &str, filename: &str) -> PathBuf {
        self.image_root.join(rendition).join(filename)
    }
}

/// A client that keeps cookies and reports redirects instead of following them.
pub fn new_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to build HTTP client")
}

/// Multipart body with text fields and an optional `image` file part.
pub fn multipart(fields: &[(&str, &str)], image: Option<(&str, Vec<u8>)>) -> Form {
    let mut form = Form::new();
    for (name, value) in fields {
        form = form.text(name.to_string(), value.to_string());
    }
    if let Some((file_name, bytes)) = image {
        form = form.part("image", Part::bytes(bytes).file_name(file_name.to_string()));
    }
    form
}

/// A solid-colour test image encoded as `format`.
pub fn encoded_image(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([90, 140, 200])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).expect("Failed to encode test image");
    out.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encoded_image(width, height, ImageFormat::Jpeg)
}
