/// Prediction service client
///
/// Uploads the acquired image as a single multipart field named `file` and
/// maps the service's JSON reply into a `PredictionResult` or a `Fault`.
///
/// Wire format:
/// - success: `{ "class": "Leaf Blight", "confidence": 92 }`
/// - failure: `{ "error": "Unsupported image format" }` (the field is optional)
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::Fault;
use crate::state::{AcquiredImage, PredictionResult};

/// Name of the multipart field carrying the image
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with an error and said why
    #[error("prediction service rejected the image: {0}")]
    Rejected(String),

    /// Non-success status without a usable explanation
    #[error("prediction service returned {0}")]
    Status(StatusCode),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed prediction response: {0}")]
    Malformed(String),
}

impl ClientError {
    /// The fault shown to the user for this error
    pub fn to_fault(&self) -> Fault {
        match self {
            ClientError::Rejected(message) => Fault::Remote(message.clone()),
            _ => Fault::Generic,
        }
    }
}

/// Anything that can turn an image into a diagnosis
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, image: &AcquiredImage) -> Result<PredictionResult, ClientError>;
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    class: String,
    confidence: f64,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

/// Classifier backed by the remote HTTP service
#[derive(Debug, Clone)]
pub struct HttpClassifier {
    http: Client,
    endpoint: String,
}

impl HttpClassifier {
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            endpoint: settings.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, image: &AcquiredImage) -> Result<PredictionResult, ClientError> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.mime_type)?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self.http.post(&self.endpoint).multipart(form).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(rejection(status, &body));
        }

        let parsed: PredictResponse =
            serde_json::from_slice(&body).map_err(|e| ClientError::Malformed(e.to_string()))?;
        Ok(PredictionResult::new(parsed.class, parsed.confidence))
    }
}

/// Build the error for a non-success response, keeping the service's
/// own message when the body carries a non-empty `error` field
fn rejection(status: StatusCode, body: &[u8]) -> ClientError {
    serde_json::from_slice::<ErrorResponse>(body)
        .ok()
        .and_then(|r| r.error)
        .filter(|message| !message.is_empty())
        .map(ClientError::Rejected)
        .unwrap_or(ClientError::Status(status))
}

/// Run one submission against a classifier and reduce the outcome to what
/// the state machine stores
pub async fn run_submission(
    classifier: Arc<dyn Classifier>,
    image: AcquiredImage,
) -> Result<PredictionResult, Fault> {
    info!("🚀 Submitting {} for prediction", image.summary());

    match classifier.classify(&image).await {
        Ok(result) => {
            info!(
                "✅ Prediction: {} ({})",
                result.disease,
                result.confidence_label()
            );
            Ok(result)
        }
        Err(e) => {
            warn!("⚠️  Prediction failed: {}", e);
            Err(e.to_fault())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Multipart, http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// What the fake service saw in the last request
    #[derive(Debug, Clone, Default)]
    struct Received {
        fields: Vec<(String, Option<String>, Vec<u8>)>,
    }

    async fn spawn_service(status: AxumStatus, reply: Value) -> (String, Arc<Mutex<Received>>) {
        let received = Arc::new(Mutex::new(Received::default()));
        let seen = Arc::clone(&received);

        let app = Router::new().route(
            "/predict",
            post(move |mut multipart: Multipart| {
                let seen = Arc::clone(&seen);
                let reply = reply.clone();
                async move {
                    let mut fields = Vec::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let content_type = field.content_type().map(str::to_string);
                        let data = field.bytes().await.unwrap().to_vec();
                        fields.push((name, content_type, data));
                    }
                    seen.lock().unwrap().fields = fields;
                    (status, Json(reply))
                }
            }),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        (format!("http://{addr}/predict"), received)
    }

    fn classifier_for(endpoint: String) -> HttpClassifier {
        let settings = Settings {
            endpoint,
            ..Settings::default()
        };
        HttpClassifier::new(&settings).unwrap()
    }

    fn leaf() -> AcquiredImage {
        AcquiredImage::new(b"leaf-bytes".to_vec(), "image/jpeg", "leaf.jpg")
    }

    #[tokio::test]
    async fn test_success_parses_class_and_confidence() {
        let (endpoint, received) =
            spawn_service(AxumStatus::OK, json!({"class": "Leaf Blight", "confidence": 92})).await;

        let result = classifier_for(endpoint).classify(&leaf()).await.unwrap();

        assert_eq!(result.disease, "Leaf Blight");
        assert_eq!(result.confidence, 92.0);

        let received = received.lock().unwrap().clone();
        assert_eq!(received.fields.len(), 1);
        let (name, content_type, data) = &received.fields[0];
        assert_eq!(name, FILE_FIELD);
        assert_eq!(content_type.as_deref(), Some("image/jpeg"));
        assert_eq!(data, b"leaf-bytes");
    }

    #[tokio::test]
    async fn test_error_body_becomes_remote_fault() {
        let (endpoint, _) = spawn_service(
            AxumStatus::BAD_REQUEST,
            json!({"error": "Unsupported image format"}),
        )
        .await;

        let err = classifier_for(endpoint).classify(&leaf()).await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(_)));
        assert_eq!(
            err.to_fault(),
            Fault::Remote("Unsupported image format".into())
        );
    }

    #[tokio::test]
    async fn test_error_without_message_is_generic() {
        let (endpoint, _) =
            spawn_service(AxumStatus::INTERNAL_SERVER_ERROR, json!({"detail": "boom"})).await;

        let err = classifier_for(endpoint).classify(&leaf()).await.unwrap_err();

        assert!(matches!(err, ClientError::Status(s) if s == StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.to_fault(), Fault::Generic);
    }

    #[tokio::test]
    async fn test_malformed_success_body_is_generic() {
        let (endpoint, _) = spawn_service(AxumStatus::OK, json!({"label": "?"})).await;

        let err = classifier_for(endpoint).classify(&leaf()).await.unwrap_err();

        assert!(matches!(err, ClientError::Malformed(_)));
        assert_eq!(err.to_fault(), Fault::Generic);
    }

    #[tokio::test]
    async fn test_transport_failure_is_generic() {
        // Bind then drop so the port refuses connections
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let classifier: Arc<dyn Classifier> =
            Arc::new(classifier_for(format!("http://{addr}/predict")));
        let outcome = run_submission(classifier, leaf()).await;

        assert_eq!(outcome, Err(Fault::Generic));
        assert_eq!(Fault::Generic.to_string(), "An error occurred");
    }

    #[test]
    fn test_empty_error_message_falls_back() {
        let err = rejection(StatusCode::BAD_REQUEST, br#"{"error": ""}"#);
        assert!(matches!(err, ClientError::Status(_)));
        assert_eq!(err.to_fault(), Fault::Generic);
    }
}
