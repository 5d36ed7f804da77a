use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    Client, Response, StatusCode,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;

use crate::domain::ticket::{Ticket, TicketFields};
use crate::error::{AppError, AppResult, TransportError};
use crate::services::TicketBackend;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Talks to the ticket REST resource at `{base_url}/tickets`.
pub struct HttpBackend {
    http: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> AppResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                AppError::Configuration(format!("failed to build HTTP client: {err}"))
            })?;
        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    fn collection_endpoint(&self) -> String {
        format!("{}/tickets", self.base_url.trim_end_matches('/'))
    }

    fn item_endpoint(&self, id: u64) -> String {
        format!("{}/{id}", self.collection_endpoint())
    }

    /// Maps transport failures and error statuses. A 404 on an id-addressed
    /// call means the ticket does not exist.
    async fn check(
        response: Result<Response, reqwest::Error>,
        id: Option<u64>,
    ) -> AppResult<Response> {
        let response = response.map_err(TransportError::Request)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            return Err(AppError::NotFound(id));
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unable to read response>".to_string());
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        }
        .into())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let body = response.text().await.map_err(TransportError::Request)?;
        serde_json::from_str(&body)
            .map_err(|err| AppError::Parse(format!("unexpected ticket response: {err}")))
    }
}

#[async_trait]
impl TicketBackend for HttpBackend {
    async fn list(&self) -> AppResult<Vec<Ticket>> {
        tracing::debug!("GET {}", self.collection_endpoint());
        let response = self
            .http
            .get(self.collection_endpoint())
            .header(ACCEPT, "application/json")
            .send()
            .await;
        Self::decode(Self::check(response, None).await?).await
    }

    async fn fetch(&self, id: u64) -> AppResult<Ticket> {
        tracing::debug!("GET {}", self.item_endpoint(id));
        let response = self
            .http
            .get(self.item_endpoint(id))
            .header(ACCEPT, "application/json")
            .send()
            .await;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    async fn create(&self, fields: &TicketFields) -> AppResult<Ticket> {
        tracing::debug!("POST {}", self.collection_endpoint());
        let response = self
            .http
            .post(self.collection_endpoint())
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(fields)
            .send()
            .await;
        Self::decode(Self::check(response, None).await?).await
    }

    async fn replace(&self, id: u64, fields: &TicketFields) -> AppResult<Ticket> {
        tracing::debug!("PUT {}", self.item_endpoint(id));
        let response = self
            .http
            .put(self.item_endpoint(id))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .json(fields)
            .send()
            .await;
        Self::decode(Self::check(response, Some(id)).await?).await
    }

    async fn delete(&self, id: u64) -> AppResult<()> {
        tracing::debug!("DELETE {}", self.item_endpoint(id));
        let response = self.http.delete(self.item_endpoint(id)).send().await;
        Self::check(response, Some(id)).await?;
        Ok(())
    }
}
