//! Backend contract and its HTTP implementation.
//!
//! Every call is a single request with no retry. The JSON shapes
//! are owned by the backend service; this side only decodes what the
//! screens need and ignores extra fields.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use staffdesk_shared::{Employee, EmployeeRef, Project, ProjectInput};
use tracing::{debug, instrument, warn};

use crate::config::{Config, DEFAULT_API_URL};

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{method} {url} failed: {source}")]
    Transport {
        method: Method,
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{method} {url} returned HTTP {status}")]
    Status {
        method: Method,
        url: String,
        status: u16,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Operations the screens need from the company backend.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn list_employees(&self) -> Result<Vec<Employee>, BackendError>;

    /// Same collection as [`Backend::list_employees`], reduced to what the
    /// assignment selector shows.
    async fn list_employee_refs(&self) -> Result<Vec<EmployeeRef>, BackendError>;

    async fn list_projects(&self) -> Result<Vec<Project>, BackendError>;

    /// Returns the created record with its server-assigned identifier.
    async fn create_project(&self, input: &ProjectInput) -> Result<Project, BackendError>;

    async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<(), BackendError>;

    async fn delete_project(&self, id: &str) -> Result<(), BackendError>;
}

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    #[instrument(skip(cfg))]
    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        let base_url = cfg
            .get("api.url")
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let timeout = cfg.get_u64("api.timeout")?.map(Duration::from_secs);

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .context("failed building HTTP client for the company backend")?;

        debug!(base_url = %base_url, ?timeout, "configured backend");
        Ok(Self::with_client(client, &base_url, cfg.get("api.token")))
    }

    pub fn with_client(client: Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let request = self.client.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&ProjectInput>,
    ) -> Result<reqwest::Response, BackendError> {
        let url = self.url(path);
        let mut request = self.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, url = %url, "sending backend request");
        let response = request
            .send()
            .await
            .map_err(|source| BackendError::Transport {
                method: method.clone(),
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(%method, url = %url, status = status.as_u16(), "backend rejected request");
            return Err(BackendError::Status {
                method,
                url,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&ProjectInput>,
    ) -> Result<T, BackendError> {
        let url = self.url(path);
        self.send(method, path, body)
            .await?
            .json::<T>()
            .await
            .map_err(|source| BackendError::Decode { url, source })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    #[instrument(skip(self))]
    async fn list_employees(&self) -> Result<Vec<Employee>, BackendError> {
        self.fetch(Method::GET, "employees", None).await
    }

    #[instrument(skip(self))]
    async fn list_employee_refs(&self) -> Result<Vec<EmployeeRef>, BackendError> {
        self.fetch(Method::GET, "employees", None).await
    }

    #[instrument(skip(self))]
    async fn list_projects(&self) -> Result<Vec<Project>, BackendError> {
        self.fetch(Method::GET, "projects", None).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn create_project(&self, input: &ProjectInput) -> Result<Project, BackendError> {
        self.fetch(Method::POST, "projects", Some(input)).await
    }

    #[instrument(skip(self, input))]
    async fn update_project(&self, id: &str, input: &ProjectInput) -> Result<(), BackendError> {
        self.send(Method::PUT, &project_path(id), Some(input))
            .await
            .map(|_| ())
    }

    #[instrument(skip(self))]
    async fn delete_project(&self, id: &str) -> Result<(), BackendError> {
        self.send(Method::DELETE, &project_path(id), None)
            .await
            .map(|_| ())
    }
}

fn project_path(id: &str) -> String {
    format!("projects/{id}")
}
