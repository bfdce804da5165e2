//! Shared harness for the HTTP tests: an in-memory store plus counting
//! doubles for every external service.

#![allow(dead_code)]

use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::StatusCode;
use actix_web::{test as actix_test, web, App};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use wardrobe_wizard_backend::configure_routes;
use wardrobe_wizard_backend::db::MemoryStore;
use wardrobe_wizard_backend::models::clothing::{ClothingClassification, ClothingType, Temperature};
use wardrobe_wizard_backend::services::weather::{
    CurrentWeather, WeatherCondition, WeatherLocation, WeatherReport,
};
use wardrobe_wizard_backend::services::{
    BackgroundRemover, ClothingClassifier, ImageStore, Mailer, OutfitStylist, ServiceError,
    WeatherProvider,
};
use wardrobe_wizard_backend::state::{AppState, ExternalServices, Repositories, Settings};
use wardrobe_wizard_backend::utils::jwt::TokenKeys;

pub const JWT_SECRET: &str = "test-secret";
pub const PUBLIC_BASE_URL: &str = "http://api.test";
pub const IMAGE_BASE_URL: &str = "https://images.test";
pub const MULTIPART_BOUNDARY: &str = "wardrobe-test-boundary";

/// PNG signature followed by filler, enough for type sniffing.
pub const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDRfake-image-data";
pub const PROCESSED_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nbackground-removed";

#[derive(Default)]
pub struct FakeBackgroundRemover {
    pub calls: AtomicUsize,
    pub fail: bool,
}

#[async_trait]
impl BackgroundRemover for FakeBackgroundRemover {
    async fn remove_background(&self, _image: &[u8], _file_name: &str) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Status {
                service: "remove.bg",
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(PROCESSED_BYTES.to_vec())
    }
}

#[derive(Default)]
pub struct FakeImageStore {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub stored: Mutex<Vec<(String, Vec<u8>)>>,
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn store(&self, key: &str, source: &Path, _content_type: &str) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ServiceError::Storage("bucket unavailable".to_string()));
        }
        let bytes = tokio::fs::read(source).await?;
        self.stored.lock().unwrap().push((key.to_string(), bytes));
        Ok(format!("{}/{}", IMAGE_BASE_URL, key))
    }

    async fn delete(&self, key: &str) -> Result<(), ServiceError> {
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeClassifier {
    pub calls: AtomicUsize,
    pub fail: bool,
    pub seen: Mutex<Vec<Vec<u8>>>,
}

pub fn red_tshirt() -> ClothingClassification {
    ClothingClassification {
        clothing_type: ClothingType::Top,
        primary_color: "red".to_string(),
        secondary_color: None,
        other_colors: None,
        material: "cotton".to_string(),
        temperature: Temperature::Mild,
        description: "red t-shirt".to_string(),
    }
}

#[async_trait]
impl ClothingClassifier for FakeClassifier {
    async fn classify(&self, image: &[u8], _mime_type: &str) -> Result<ClothingClassification, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(image.to_vec());
        if self.fail {
            return Err(ServiceError::Malformed {
                service: "openai",
                detail: "no content".to_string(),
            });
        }
        Ok(red_tshirt())
    }
}

#[derive(Default)]
pub struct FakeStylist {
    pub calls: AtomicUsize,
    pub inventories: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl OutfitStylist for FakeStylist {
    async fn suggest_outfit(&self, _request: &str, inventory: &[String]) -> Result<Vec<String>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inventories.lock().unwrap().push(inventory.to_vec());
        // Echo every inventory id back.
        Ok(inventory
            .iter()
            .filter_map(|line| line.strip_prefix("id: "))
            .filter_map(|rest| rest.split(',').next())
            .map(str::to_string)
            .collect())
    }
}

#[derive(Debug, Clone)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    /// Token carried by the most recent mailed link.
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock().unwrap();
        let html = &sent.last()?.html;
        let start = html.find("token=")? + "token=".len();
        let rest = &html[start..];
        let end = rest.find('"').unwrap_or(rest.len());
        Some(rest[..end].to_string())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_html(&self, to: &str, subject: &str, html: &str) -> Result<(), ServiceError> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeWeather {
    pub queries: Mutex<Vec<(f64, f64)>>,
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn current_weather(&self, latitude: f64, longitude: f64) -> Result<WeatherReport, ServiceError> {
        self.queries.lock().unwrap().push((latitude, longitude));
        Ok(WeatherReport {
            location: WeatherLocation {
                lat: latitude,
                lon: longitude,
            },
            current: CurrentWeather {
                temp_c: 18.0,
                temp_f: 64.4,
                condition: WeatherCondition {
                    text: "Sunny".to_string(),
                    icon: "//cdn.weatherapi.com/113.png".to_string(),
                },
                wind_mph: 5.6,
                wind_degree: 180.0,
                humidity: 40.0,
                cloud: 0.0,
                feelslike_c: 18.0,
                feelslike_f: 64.4,
                uv: 5.0,
            },
        })
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub remover: Arc<FakeBackgroundRemover>,
    pub images: Arc<FakeImageStore>,
    pub classifier: Arc<FakeClassifier>,
    pub stylist: Arc<FakeStylist>,
    pub mailer: Arc<RecordingMailer>,
    pub weather: Arc<FakeWeather>,
    pub tokens: TokenKeys,
    pub state: web::Data<AppState>,
    pub scratch: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_fakes(
            FakeBackgroundRemover::default(),
            FakeImageStore::default(),
            FakeClassifier::default(),
        )
    }

    pub fn with_failing_remover() -> Self {
        Self::with_fakes(
            FakeBackgroundRemover {
                fail: true,
                ..Default::default()
            },
            FakeImageStore::default(),
            FakeClassifier::default(),
        )
    }

    pub fn with_failing_image_store() -> Self {
        Self::with_fakes(
            FakeBackgroundRemover::default(),
            FakeImageStore {
                fail: true,
                ..Default::default()
            },
            FakeClassifier::default(),
        )
    }

    pub fn with_failing_classifier() -> Self {
        Self::with_fakes(
            FakeBackgroundRemover::default(),
            FakeImageStore::default(),
            FakeClassifier {
                fail: true,
                ..Default::default()
            },
        )
    }

    fn with_fakes(
        remover: FakeBackgroundRemover,
        images: FakeImageStore,
        classifier: FakeClassifier,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        let remover = Arc::new(remover);
        let images = Arc::new(images);
        let classifier = Arc::new(classifier);
        let stylist = Arc::new(FakeStylist::default());
        let mailer = Arc::new(RecordingMailer::default());
        let weather = Arc::new(FakeWeather::default());
        let tokens = TokenKeys::new(JWT_SECRET, 3600);
        let scratch = tempfile::tempdir().expect("scratch dir");

        let state = web::Data::new(AppState::new(
            Repositories::shared(store.clone()),
            ExternalServices {
                background_remover: remover.clone(),
                image_store: images.clone(),
                classifier: classifier.clone(),
                stylist: stylist.clone(),
                mailer: mailer.clone(),
                weather: weather.clone(),
            },
            tokens.clone(),
            Settings {
                public_base_url: PUBLIC_BASE_URL.to_string(),
                frontend_url: "http://frontend.test".to_string(),
                scratch_dir: scratch.path().to_path_buf(),
                max_upload_bytes: 1024,
                upload_dir: None,
            },
        ));

        Harness {
            store,
            remover,
            images,
            classifier,
            stylist,
            mailer,
            weather,
            tokens,
            state,
            scratch,
        }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(self.state.clone())
            .configure(configure_routes)
    }

    /// Number of calls made to any outside service during intake.
    pub fn intake_calls(&self) -> usize {
        self.remover.calls.load(Ordering::SeqCst)
            + self.images.calls.load(Ordering::SeqCst)
            + self.classifier.calls.load(Ordering::SeqCst)
    }

    /// Entries left in the scratch directory.
    pub fn scratch_files(&self) -> usize {
        std::fs::read_dir(self.scratch.path()).unwrap().count()
    }
}

pub async fn send<S>(app: &S, req: actix_http::Request) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, req).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

pub async fn send_text<S>(app: &S, req: actix_http::Request) -> (StatusCode, String)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response = actix_test::call_service(app, req).await;
    let status = response.status();
    let body = actix_test::read_body(response).await;
    (status, String::from_utf8_lossy(&body).into_owned())
}

pub fn registration(username: &str, email: &str, password: &str) -> Value {
    json!({
        "name": { "first": "Test", "last": "User" },
        "username": username,
        "email": email,
        "password": password,
        "geolocation": { "type": "Point", "coordinates": [-71.06, 42.36] }
    })
}

pub async fn register<S>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::post()
        .uri("/api/users/register")
        .set_json(registration(username, &format!("{}@example.com", username), password))
        .to_request();
    send(app, req).await
}

pub async fn verify_last_mailed<S>(app: &S, harness: &Harness) -> StatusCode
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let token = harness.mailer.last_token().expect("mailed token");
    let req = actix_test::TestRequest::get()
        .uri(&format!("/api/users/verify-email?token={}", token))
        .to_request();
    send_text(app, req).await.0
}

pub async fn login<S>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    send(app, req).await
}

/// Registers, verifies and logs in `username`, returning the session token.
pub async fn signed_in<S>(app: &S, harness: &Harness, username: &str) -> String
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, _) = register(app, username, "pw").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(verify_last_mailed(app, harness).await, StatusCode::OK);
    let (status, body) = login(app, username, "pw").await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().expect("token").to_string()
}

pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token))
}

/// `multipart/form-data` body with one file part.
pub fn multipart_image(field: &str, file_name: &str, bytes: &[u8]) -> (String, Vec<u8>) {
    multipart_files(&[(field, file_name, bytes)])
}

/// `multipart/form-data` body with one part per `(field, file name, bytes)`.
pub fn multipart_files(parts: &[(&str, &str, &[u8])]) -> (String, Vec<u8>) {
    let mut body = Vec::new();
    for (field, file_name, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", MULTIPART_BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, file_name
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    (
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        body,
    )
}

pub async fn upload<S>(app: &S, token: &str, bytes: &[u8]) -> (StatusCode, Value)
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (content_type, body) = multipart_image("image", "shirt.png", bytes);
    let req = actix_test::TestRequest::post()
        .uri("/api/clothing")
        .insert_header(bearer(token))
        .insert_header(("Content-Type", content_type))
        .set_payload(body)
        .to_request();
    send(app, req).await
}
