use super::http_client_factory::HttpClientFactory;
use crate::config::HttpSettings;
use crate::domain::ports::{HttpMethod, HttpResponse, SignedRequest, Transport, TransportError};
use async_trait::async_trait;
use reqwest::Method;
use reqwest_middleware::ClientWithMiddleware;
use tracing::debug;

/// [`Transport`] over the shared retrying reqwest client.
pub struct HttpTransport {
    client: ClientWithMiddleware,
}

impl HttpTransport {
    pub fn new(settings: &HttpSettings) -> Self {
        Self {
            client: HttpClientFactory::create_client(settings),
        }
    }
}

fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &SignedRequest) -> Result<HttpResponse, TransportError> {
        let mut builder = self.client.request(to_reqwest(request.method), &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;
        debug!("HttpTransport: {} {} -> {}", request.method, request.url, status);

        Ok(HttpResponse { status, body })
    }
}
