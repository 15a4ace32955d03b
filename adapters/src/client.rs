//! Scheme connector interface and HTTP client
//!
//! Transport failures are reported as `TransportError`; classification
//! into the gateway taxonomy happens in the resiliency executor, not here.

use crate::types::WireFormat;
use async_trait::async_trait;
use resiliency::TransportError;
use std::time::Duration;
use tracing::info;

/// Outbound message toward a scheme endpoint
#[derive(Debug, Clone)]
pub struct SchemeRequest {
    pub endpoint: String,
    pub payload: String,
    pub format: WireFormat,
    pub correlation_id: String,
    pub uetr: Option<String>,
}

/// Scheme answer envelope
#[derive(Debug, Clone)]
pub struct SchemeResponse {
    pub status_code: u16,
    pub body: String,
}

impl SchemeResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Connector to one scheme endpoint
#[async_trait]
pub trait SchemeConnector: Send + Sync {
    /// Post a transformed message to the scheme
    async fn send(&self, request: &SchemeRequest) -> Result<SchemeResponse, TransportError>;

    /// Issue the configured health-check request
    async fn health_check(
        &self,
        method: &str,
        endpoint: &str,
        expected_statuses: &[u16],
    ) -> Result<(), TransportError>;
}

/// HTTP scheme client over reqwest
pub struct HttpSchemeClient {
    client: reqwest::Client,
}

impl HttpSchemeClient {
    /// Client bounded by the adapter's configured timeout
    pub fn new(timeout_seconds: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| TransportError::Invalid(e.to_string()))?;
        Ok(Self { client })
    }

    fn map_error(error: reqwest::Error) -> TransportError {
        if error.is_timeout() {
            TransportError::Timeout(error.to_string())
        } else if error.is_connect() {
            TransportError::Connection(error.to_string())
        } else if error.is_builder() || error.is_request() {
            TransportError::Invalid(error.to_string())
        } else {
            TransportError::Connection(error.to_string())
        }
    }
}

#[async_trait]
impl SchemeConnector for HttpSchemeClient {
    async fn send(&self, request: &SchemeRequest) -> Result<SchemeResponse, TransportError> {
        info!(
            endpoint = %request.endpoint,
            correlation_id = %request.correlation_id,
            "dispatching scheme message"
        );

        let mut builder = self
            .client
            .post(&request.endpoint)
            .header("Content-Type", request.format.content_type())
            .header("X-Correlation-ID", &request.correlation_id);
        if let Some(uetr) = &request.uetr {
            builder = builder.header("X-UETR", uetr);
        }

        let response = builder
            .body(request.payload.clone())
            .send()
            .await
            .map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(Self::map_error)?;

        if (200..300).contains(&status) {
            Ok(SchemeResponse {
                status_code: status,
                body,
            })
        } else {
            Err(TransportError::Http { status, body })
        }
    }

    async fn health_check(
        &self,
        method: &str,
        endpoint: &str,
        expected_statuses: &[u16],
    ) -> Result<(), TransportError> {
        let request = match method.to_ascii_uppercase().as_str() {
            "HEAD" => self.client.head(endpoint),
            "POST" => self.client.post(endpoint),
            _ => self.client.get(endpoint),
        };
        let response = request.send().await.map_err(Self::map_error)?;
        let status = response.status().as_u16();

        let expected = if expected_statuses.is_empty() {
            (200..300).contains(&status)
        } else {
            expected_statuses.contains(&status)
        };
        if expected {
            Ok(())
        } else {
            Err(TransportError::Http {
                status,
                body: "unexpected health-check status".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_for(endpoint: String) -> SchemeRequest {
        SchemeRequest {
            endpoint,
            payload: "<Document/>".to_string(),
            format: WireFormat::Xml,
            correlation_id: "corr-1".to_string(),
            uetr: Some("20250115-PE01-P008-1A2B-0123456789AB".to_string()),
        }
    }

    #[tokio::test]
    async fn test_send_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/scheme"))
            .and(header("Content-Type", "application/xml"))
            .and(header("X-UETR", "20250115-PE01-P008-1A2B-0123456789AB"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<FIToFIPmtStsRpt/>"))
            .mount(&server)
            .await;

        let client = HttpSchemeClient::new(5).unwrap();
        let response = client
            .send(&request_for(format!("{}/scheme", server.uri())))
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.body, "<FIToFIPmtStsRpt/>");
    }

    #[tokio::test]
    async fn test_send_5xx_is_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let client = HttpSchemeClient::new(5).unwrap();
        let err = client
            .send(&request_for(format!("{}/scheme", server.uri())))
            .await
            .unwrap_err();
        match err {
            TransportError::Http { status, .. } => assert_eq!(status, 503),
            other => panic!("expected http error, got {:?}", other),
        }
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_health_check_expected_statuses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/healthz"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let client = HttpSchemeClient::new(5).unwrap();
        assert!(client
            .health_check("GET", &format!("{}/healthz", server.uri()), &[])
            .await
            .is_ok());
        assert!(client
            .health_check("GET", &format!("{}/healthz", server.uri()), &[200])
            .await
            .is_err());
    }
}
