//! Prediction service client
//!
//! Submits one record of nine named vitals to the prediction service and
//! returns its scalar prediction. Requests are bounded by a timeout and
//! retried a limited number of times on transient failures (timeouts,
//! connection errors, 5xx responses). Client errors and undecodable bodies
//! are returned immediately.

use crate::error::{PredictionError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8000/predict";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// One set of vitals, serialized with the service's field names
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PredictionRecord {
    pub ecg_bloodoxygen_time_difference: f64,
    pub blood_glucose_ecg_difference: f64,
    #[serde(rename = "RRMin")]
    pub rr_min: f64,
    #[serde(rename = "RRMax")]
    pub rr_max: f64,
    pub heart_rate: f64,
    pub breathe_rate: f64,
    pub heart_rate_variability: f64,
    pub blood_oxygen: f64,
    pub avg_glucose_reading: f64,
}

impl PredictionRecord {
    /// Wire names, in form order
    pub const FIELDS: [&'static str; 9] = [
        "EcgBloodoxygenTimeDifference",
        "BloodGlucoseEcgDifference",
        "RRMin",
        "RRMax",
        "HeartRate",
        "BreatheRate",
        "HeartRateVariability",
        "BloodOxygen",
        "AvgGlucoseReading",
    ];

    /// Field values, in [`PredictionRecord::FIELDS`] order
    pub fn values(&self) -> [f64; 9] {
        [
            self.ecg_bloodoxygen_time_difference,
            self.blood_glucose_ecg_difference,
            self.rr_min,
            self.rr_max,
            self.heart_rate,
            self.breathe_rate,
            self.heart_rate_variability,
            self.blood_oxygen,
            self.avg_glucose_reading,
        ]
    }

    /// Reject NaN and infinite fields, which JSON cannot carry
    pub fn validate(&self) -> Result<()> {
        Self::FIELDS
            .iter()
            .zip(self.values())
            .find(|(_, value)| !value.is_finite())
            .map_or(Ok(()), |(name, _)| Err(PredictionError::InvalidRecord(*name)))
    }
}

/// Service response body
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub prediction: f64,
}

/// Sends one request to the prediction service
#[async_trait]
pub trait PredictionTransport: Send + Sync {
    async fn send(&self, record: &PredictionRecord) -> Result<PredictionResponse>;
}

/// JSON over HTTP POST
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PredictionError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn classify(&self, error: reqwest::Error) -> PredictionError {
        if error.is_timeout() {
            PredictionError::Timeout(self.timeout)
        } else if error.is_decode() {
            PredictionError::Decode(error.to_string())
        } else {
            PredictionError::Transport(error.to_string())
        }
    }
}

#[async_trait]
impl PredictionTransport for HttpTransport {
    async fn send(&self, record: &PredictionRecord) -> Result<PredictionResponse> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(record)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PredictionError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| PredictionError::Decode(e.to_string()))
    }
}

/// Bounded retry with doubling backoff
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each further retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 1,
            base_delay: Duration::from_millis(200),
        }
    }
}

/// Prediction client with validation and retry
pub struct PredictionClient {
    transport: Box<dyn PredictionTransport>,
    retry: RetryPolicy,
}

impl PredictionClient {
    pub fn new(transport: impl PredictionTransport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
            retry: RetryPolicy::default(),
        }
    }

    /// HTTP client for `endpoint`
    pub fn http(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self::new(HttpTransport::new(endpoint, timeout)?))
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Submit `record` and return the prediction
    pub async fn predict(&self, record: &PredictionRecord) -> Result<f64> {
        record.validate()?;

        let mut attempts = 0;
        loop {
            match self.transport.send(record).await {
                Ok(response) => {
                    tracing::debug!(prediction = response.prediction, attempts, "prediction received");
                    return Ok(response.prediction);
                }
                Err(e) if e.is_retryable() && attempts < self.retry.max_retries => {
                    attempts += 1;
                    let delay = self.retry.delay(attempts);
                    tracing::debug!(
                        error = %e,
                        attempt = attempts,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis(),
                        "Prediction request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, attempts, "prediction failed");
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Replays canned results and counts calls
    #[derive(Clone, Default)]
    struct ScriptedTransport {
        script: Arc<Mutex<VecDeque<Result<PredictionResponse>>>>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<Result<PredictionResponse>>) -> Self {
            Self {
                script: Arc::new(Mutex::new(script.into())),
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PredictionTransport for ScriptedTransport {
        async fn send(&self, _record: &PredictionRecord) -> Result<PredictionResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(PredictionError::Transport("script exhausted".into())))
        }
    }

    fn ok(prediction: f64) -> Result<PredictionResponse> {
        Ok(PredictionResponse { prediction })
    }

    fn sample_record() -> PredictionRecord {
        PredictionRecord {
            ecg_bloodoxygen_time_difference: 0.12,
            blood_glucose_ecg_difference: 3.4,
            rr_min: 0.61,
            rr_max: 0.94,
            heart_rate: 72.0,
            breathe_rate: 16.0,
            heart_rate_variability: 48.0,
            blood_oxygen: 97.0,
            avg_glucose_reading: 142.0,
        }
    }

    #[test]
    fn test_record_wire_names() {
        let json = serde_json::to_value(sample_record()).unwrap();
        let object = json.as_object().unwrap();

        assert_eq!(object.len(), 9);
        for name in PredictionRecord::FIELDS {
            assert!(object.contains_key(name), "missing {name}");
        }
        assert_eq!(object["RRMin"], 0.61);
    }

    #[test]
    fn test_record_validation() {
        assert!(sample_record().validate().is_ok());

        let record = PredictionRecord {
            rr_max: f64::NAN,
            ..sample_record()
        };
        assert_eq!(
            record.validate(),
            Err(PredictionError::InvalidRecord("RRMax"))
        );
    }

    #[test]
    fn test_retry_delay_doubles() {
        let retry = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(200),
        };
        assert_eq!(retry.delay(1), Duration::from_millis(200));
        assert_eq!(retry.delay(2), Duration::from_millis(400));
        assert_eq!(retry.delay(3), Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_success_first_try() {
        let transport = ScriptedTransport::new(vec![ok(1.0)]);
        let client = PredictionClient::new(transport.clone());

        assert_eq!(client.predict(&sample_record()).await, Ok(1.0));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_retry_after_timeout() {
        let transport = ScriptedTransport::new(vec![
            Err(PredictionError::Timeout(DEFAULT_TIMEOUT)),
            ok(0.0),
        ]);
        let client = PredictionClient::new(transport.clone());

        assert_eq!(client.predict(&sample_record()).await, Ok(0.0));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_are_bounded() {
        let transport = ScriptedTransport::new(vec![
            Err(PredictionError::Status { status: 502 }),
            Err(PredictionError::Timeout(DEFAULT_TIMEOUT)),
            ok(1.0),
        ]);
        let client = PredictionClient::new(transport.clone());

        // Timeout stays distinguishable after exhausting the retry
        assert_eq!(
            client.predict(&sample_record()).await,
            Err(PredictionError::Timeout(DEFAULT_TIMEOUT))
        );
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_client_errors_not_retried() {
        let transport = ScriptedTransport::new(vec![
            Err(PredictionError::Status { status: 422 }),
            ok(1.0),
        ]);
        let client = PredictionClient::new(transport.clone());

        assert_eq!(
            client.predict(&sample_record()).await,
            Err(PredictionError::Status { status: 422 })
        );
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_record_never_sent() {
        let transport = ScriptedTransport::new(vec![ok(1.0)]);
        let client = PredictionClient::new(transport.clone());
        let record = PredictionRecord {
            heart_rate: f64::INFINITY,
            ..sample_record()
        };

        assert!(client.predict(&record).await.is_err());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let transport = ScriptedTransport::new(vec![
            Err(PredictionError::Transport("refused".into())),
            ok(1.0),
        ]);
        let client = PredictionClient::new(transport.clone()).with_retry(RetryPolicy::none());

        assert!(client.predict(&sample_record()).await.is_err());
        assert_eq!(transport.calls(), 1);
    }

    /// Serve one canned HTTP response per connection, after reading the request
    async fn serve(response: &'static str, connections: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            for _ in 0..connections {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                loop {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                    // JSON body ends with the record's closing brace
                    if request.ends_with(b"}") {
                        break;
                    }
                }
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.ok();
            }
        });

        format!("http://{addr}/predict")
    }

    #[tokio::test]
    async fn test_http_success() {
        let endpoint = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 18\r\nconnection: close\r\n\r\n{\"prediction\":1.0}",
            1,
        )
        .await;

        let client = PredictionClient::http(endpoint, Duration::from_secs(5)).unwrap();
        assert_eq!(client.predict(&sample_record()).await, Ok(1.0));
    }

    #[tokio::test]
    async fn test_http_status_error() {
        let endpoint = serve(
            "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            1,
        )
        .await;

        let client = PredictionClient::http(endpoint, Duration::from_secs(5)).unwrap();
        assert_eq!(
            client.predict(&sample_record()).await,
            Err(PredictionError::Status { status: 404 })
        );
    }

    #[tokio::test]
    async fn test_http_decode_error() {
        let endpoint = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 11\r\nconnection: close\r\n\r\n{\"score\":1}",
            1,
        )
        .await;

        let client = PredictionClient::http(endpoint, Duration::from_secs(5)).unwrap();
        assert!(matches!(
            client.predict(&sample_record()).await,
            Err(PredictionError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_http_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let timeout = Duration::from_millis(100);
        let client = PredictionClient::http(format!("http://{addr}/predict"), timeout)
            .unwrap()
            .with_retry(RetryPolicy::none());

        assert_eq!(
            client.predict(&sample_record()).await,
            Err(PredictionError::Timeout(timeout))
        );
    }
}
