use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_http::SessionCookieJar;
use reqwest::header::{ACCEPT, HeaderValue};
use reqwest::{Method, Url};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ReqwestConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub user_agent: String,
}

pub struct ReqwestTransport {
    http: reqwest::Client,
    base_url: String,
    jar: Arc<SessionCookieJar>,
}

impl ReqwestTransport {
    pub fn new(config: &ReqwestConfig) -> Result<Self, TransportError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| TransportError::InvalidRequest(format!("base url: {}", e)))?;

        let jar = Arc::new(SessionCookieJar::for_url(&base_url));
        let http = reqwest::Client::builder()
            .cookie_provider(jar.clone())
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(map_reqwest_error)?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            jar,
        })
    }

    pub fn jar(&self) -> Arc<SessionCookieJar> {
        self.jar.clone()
    }

    fn url(&self, path: &str) -> Result<Url, TransportError> {
        let joined = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        Url::parse(&joined).map_err(|e| TransportError::InvalidRequest(format!("{}: {}", path, e)))
    }
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Delete => Method::DELETE,
    }
}

fn map_reqwest_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_connect() {
        TransportError::Connect(error.to_string())
    } else if error.is_builder() {
        TransportError::InvalidRequest(error.to_string())
    } else {
        TransportError::Other(error.to_string())
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: &Request) -> Result<Response, TransportError> {
        let url = self.url(&request.path)?;
        let mut builder = self
            .http
            .request(to_method(request.method), url)
            .header(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let res = builder.send().await.map_err(map_reqwest_error)?;

        let status = res.status().as_u16();
        let headers = res
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = res.bytes().await.map_err(map_reqwest_error)?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }

    fn clear_credentials(&self) {
        self.jar.clear();
    }
}
