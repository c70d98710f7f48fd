//! HTTP transport

use crate::{ExecutedResponse, Result};
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};
use tryapi_core::{Credentials, HttpMethod, RequestDescriptor};

/// Sends a built request and materializes the whole response.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: &RequestDescriptor) -> Result<ExecutedResponse>;
}

/// Transport backed by `reqwest`.
///
/// Requests with [`Credentials::Include`] go through a client with a cookie
/// store, so cookies set by the target are sent back on later requests.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    cookie_client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::builder().build()?,
            cookie_client: reqwest::Client::builder().cookie_store(true).build()?,
        })
    }

    fn client_for(&self, credentials: Credentials) -> &reqwest::Client {
        match credentials {
            Credentials::Include => &self.cookie_client,
            Credentials::SameOrigin => &self.client,
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: &RequestDescriptor) -> Result<ExecutedResponse> {
        let mut builder = self
            .client_for(request.credentials)
            .request(method(request.method), request.url.clone());
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status();
        debug!("Response status: {}", status);

        let headers: Vec<_> = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let bytes = response.bytes().await?;

        Ok(ExecutedResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            headers,
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}

fn method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Post => Method::POST,
        HttpMethod::Delete => Method::DELETE,
        HttpMethod::Options => Method::OPTIONS,
        HttpMethod::Head => Method::HEAD,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Trace => Method::TRACE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tryapi_core::HeaderSet;
    use url::Url;

    fn descriptor(method: HttpMethod, url: &str) -> RequestDescriptor {
        RequestDescriptor {
            method,
            url: Url::parse(url).unwrap(),
            headers: HeaderSet::new(),
            body: None,
            credentials: Credentials::SameOrigin,
        }
    }

    #[tokio::test]
    async fn test_send_headers_and_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/pets")
            .match_header("content-type", "application/json")
            .match_header("x-api-key", "secret")
            .match_body(r#"{"name":"Rex"}"#)
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id":7}"#)
            .create_async()
            .await;

        let mut request = descriptor(HttpMethod::Post, &format!("{}/pets", server.url()));
        request.headers.set("Content-Type", "application/json");
        request.headers.set("X-API-Key", "secret");
        request.body = Some(r#"{"name":"Rex"}"#.to_string());

        let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, 201);
        assert_eq!(response.status_text, "Created");
        assert_eq!(response.body, r#"{"id":7}"#);
        assert!(response.headers.contains("content-type: application/json"));
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("DELETE", "/pets/1")
            .with_status(404)
            .with_body("missing")
            .create_async()
            .await;

        let request = descriptor(HttpMethod::Delete, &format!("{}/pets/1", server.url()));
        let response = ReqwestTransport::new().unwrap().send(&request).await.unwrap();

        assert_eq!(response.status_line(), "404 Not Found");
        assert_eq!(response.body, "missing");
    }

    #[tokio::test]
    async fn test_connection_failure_is_transport_error() {
        let request = descriptor(HttpMethod::Get, "http://127.0.0.1:9/unreachable");
        let result = ReqwestTransport::new().unwrap().send(&request).await;
        assert!(matches!(result, Err(crate::ClientError::Transport(_))));
    }
}
