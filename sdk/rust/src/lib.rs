//! Client for the xray provisioner HTTP API.

use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {message}")]
    Api { status: StatusCode, message: String },
}

#[derive(Debug, Serialize)]
pub struct AddClientRequest {
    pub config_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provisioned {
    pub link: String,
    pub identifier: String,
}

#[derive(Debug, Deserialize)]
pub struct CountResponse {
    pub transport: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
struct ClientsResponse {
    identifiers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LinkResponse {
    link: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct ProvisionerClient {
    client: Client,
    base_url: String,
}

impl ProvisionerClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Provision a client and get its share link.
    pub async fn add_client(&self, req: &AddClientRequest) -> Result<Provisioned, SdkError> {
        let resp = self
            .client
            .post(format!("{}/clients", self.base_url))
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn list_clients(&self) -> Result<Vec<String>, SdkError> {
        let resp = self.client.get(format!("{}/clients", self.base_url)).send().await?;
        let body: ClientsResponse = check(resp).await?.json().await?;
        Ok(body.identifiers)
    }

    pub async fn count_clients(&self, transport: Option<&str>) -> Result<usize, SdkError> {
        let mut req = self.client.get(format!("{}/clients/count", self.base_url));
        if let Some(transport) = transport {
            req = req.query(&[("transport", transport)]);
        }
        let body: CountResponse = check(req.send().await?).await?.json().await?;
        Ok(body.count)
    }

    pub async fn disconnect(&self, identifier: &str) -> Result<(), SdkError> {
        let resp = self
            .client
            .delete(format!("{}/clients/{}", self.base_url, identifier))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn disconnect_many(&self, identifiers: &[String]) -> Result<(), SdkError> {
        self.batch("disconnect", identifiers).await
    }

    pub async fn deactivate(&self, identifiers: &[String]) -> Result<(), SdkError> {
        self.batch("deactivate", identifiers).await
    }

    pub async fn reactivate(&self, identifiers: &[String]) -> Result<(), SdkError> {
        self.batch("reactivate", identifiers).await
    }

    pub async fn link(&self, identifier: &str, config_name: &str) -> Result<String, SdkError> {
        let resp = self
            .client
            .get(format!("{}/clients/{}/link", self.base_url, identifier))
            .query(&[("config_name", config_name)])
            .send()
            .await?;
        let body: LinkResponse = check(resp).await?.json().await?;
        Ok(body.link)
    }

    async fn batch(&self, action: &str, identifiers: &[String]) -> Result<(), SdkError> {
        let resp = self
            .client
            .post(format!("{}/clients/{}", self.base_url, action))
            .json(&serde_json::json!({ "identifiers": identifiers }))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

async fn check(resp: Response) -> Result<Response, SdkError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    Err(SdkError::Api { status, message })
}
