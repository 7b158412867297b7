use crate::error::RegistryError;
use crate::http_client::json_client;
use crate::registry::{FieldChanges, Registry};
use crate::runner::Runner;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};

const NOT_FOUND_CODE: &str = "not_found";
const NOT_FOUND_ERROR: &str = "Runner not found";

/// Client for the spreadsheet web app.
pub struct HttpRegistry {
    client: Client,
    url: Url,
}

#[derive(Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl HttpRegistry {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, RegistryError> {
        Ok(Self {
            client: json_client(timeout)?,
            url,
        })
    }

    fn action_url(&self, action: &str, search: Option<&str>) -> Url {
        let mut url = self.url.clone();
        let mut query = url.query_pairs_mut();
        query.append_pair("action", action);
        if let Some(search) = search {
            query.append_pair("search", search);
        }
        drop(query);
        url
    }

    async fn get(&self, action: &str, search: Option<&str>) -> Result<Envelope, RegistryError> {
        let url = self.action_url(action, search);
        debug!("GET {}", url.as_str());
        let response = self.client.get(url.as_str()).send().await?;
        read_envelope(response).await
    }

    async fn post(&self, body: &Value) -> Result<Envelope, RegistryError> {
        debug!("POST {}", self.url.as_str());
        let response = self.client.post(self.url.as_str()).json(body).send().await?;
        read_envelope(response).await
    }
}

async fn read_envelope(response: reqwest::Response) -> Result<Envelope, RegistryError> {
    let status = response.status();
    let text = response.text().await?;
    match serde_json::from_str::<Envelope>(&text) {
        Ok(envelope) => Ok(envelope),
        Err(err) => {
            warn!("failed to parse registry response ({status}):\n{err:?}");
            if status.is_success() {
                Err(RegistryError::Parse(err.to_string()))
            } else {
                Err(RegistryError::Remote(format!("http status {status}")))
            }
        }
    }
}

fn into_result(envelope: Envelope) -> Result<Option<Value>, RegistryError> {
    if envelope.success {
        return Ok(envelope.data);
    }
    let error = envelope.error.unwrap_or_default();
    if envelope.code.as_deref() == Some(NOT_FOUND_CODE) || error == NOT_FOUND_ERROR {
        Err(RegistryError::NotFound)
    } else {
        Err(RegistryError::Remote(error))
    }
}

fn into_data<T: DeserializeOwned>(envelope: Envelope) -> Result<T, RegistryError> {
    let data = into_result(envelope)?
        .ok_or_else(|| RegistryError::Parse("missing data".to_string()))?;
    serde_json::from_value(data).map_err(|err| RegistryError::Parse(err.to_string()))
}

fn confirm_body(phone: &str) -> Value {
    json!({
        "action": "confirmRunner",
        "phone": phone,
    })
}

fn update_body(phone: &str, changes: &FieldChanges) -> Value {
    json!({
        "action": "updateRunner",
        "phone": phone,
        "updates": changes,
    })
}

impl Registry for HttpRegistry {
    async fn find_runner(&self, query: &str) -> Result<Runner, RegistryError> {
        into_data(self.get("getRunner", Some(query)).await?)
    }

    async fn list_runners(&self) -> Result<Vec<Runner>, RegistryError> {
        match into_result(self.get("getAllRunners", None).await?)? {
            Some(data) => {
                serde_json::from_value(data).map_err(|err| RegistryError::Parse(err.to_string()))
            }
            None => Ok(Vec::new()),
        }
    }

    async fn set_confirmed(&self, phone: &str) -> Result<(), RegistryError> {
        into_result(self.post(&confirm_body(phone)).await?).map(|_| ())
    }

    async fn update_fields(&self, phone: &str, changes: &FieldChanges) -> Result<(), RegistryError> {
        into_result(self.post(&update_body(phone, changes)).await?).map(|_| ())
    }
}
