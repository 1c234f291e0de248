//! Reqwest-backed user and pet directory clients.
//!
//! Each lookup is a unary `GET <base>/rpc/<collection>/<id>` against the
//! owning service. The client carries an explicit request timeout; a 404 is
//! surfaced as `DirectoryError::NotFound`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::domain::EntityId;
use crate::domain::ports::{
    DirectoryError, PetDirectory, PetSummary, UserContact, UserDirectory,
};

/// Lookup timeout used when none is configured.
pub const DEFAULT_DIRECTORY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct DirectoryClient {
    client: Client,
    base: Url,
}

impl DirectoryClient {
    fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base })
    }

    fn record_url(&self, collection: &str, id: &EntityId) -> Result<Url, DirectoryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| DirectoryError::protocol(format!("{} cannot be a base URL", self.base)))?
            .pop_if_empty()
            .extend(["rpc", collection, id.as_str()]);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &EntityId,
    ) -> Result<T, DirectoryError> {
        let url = self.record_url(collection, id)?;
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, id));
        }
        serde_json::from_slice(body.as_ref()).map_err(|err| {
            DirectoryError::protocol(format!("invalid {collection} payload: {err}"))
        })
    }
}

fn map_transport_error(error: reqwest::Error) -> DirectoryError {
    if error.is_timeout() {
        DirectoryError::timeout(error.to_string())
    } else {
        DirectoryError::unavailable(error.to_string())
    }
}

fn map_status_error(status: StatusCode, id: &EntityId) -> DirectoryError {
    match status {
        StatusCode::NOT_FOUND => DirectoryError::not_found(id.as_str()),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            DirectoryError::timeout(format!("status {}", status.as_u16()))
        }
        _ if status.is_server_error() => {
            DirectoryError::unavailable(format!("status {}", status.as_u16()))
        }
        _ => DirectoryError::protocol(format!("status {}", status.as_u16())),
    }
}

/// `GetUser` client against the user service.
#[derive(Clone)]
pub struct HttpUserDirectory {
    inner: DirectoryClient,
}

impl HttpUserDirectory {
    /// Build a client for the user service rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: DirectoryClient::new(base, timeout)?,
        })
    }
}

#[async_trait]
impl UserDirectory for HttpUserDirectory {
    async fn get_user(&self, id: &EntityId) -> Result<UserContact, DirectoryError> {
        self.inner.fetch("users", id).await
    }
}

/// `GetPet` client against the pet service.
#[derive(Clone)]
pub struct HttpPetDirectory {
    inner: DirectoryClient,
}

impl HttpPetDirectory {
    /// Build a client for the pet service rooted at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        Ok(Self {
            inner: DirectoryClient::new(base, timeout)?,
        })
    }
}

#[async_trait]
impl PetDirectory for HttpPetDirectory {
    async fn get_pet(&self, id: &EntityId) -> Result<PetSummary, DirectoryError> {
        self.inner.fetch("pets", id).await
    }
}
