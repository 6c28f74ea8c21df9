//! Backend transport.
//!
//! `Backend` is the seam between the session workflow and the wire: it
//! sends one request and hands back the raw body. Decoding happens in the
//! caller, so fakes only have to produce strings.

use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::Value;

/// The CAB server endpoints. All are `POST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Endpoint {
    /// Multipart upload of the database file (`dbfile`).
    UploadDb,
    /// `{trainNumberId}` → train-number hierarchy.
    GetActions,
    /// `{actionId, actionListId, actionDetailId, actionType, mediaType}` → complex-action hierarchy.
    GetComplexAction,
    /// No body → `{new_tab}` page path.
    LoadComplexAction,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::UploadDb => "/cab/uploaddb",
            Endpoint::GetActions => "/cab/getactions",
            Endpoint::GetComplexAction => "/cab/getcplxaction",
            Endpoint::LoadComplexAction => "/cab/loadcplxaction",
        }
    }

    /// Name used in error messages.
    pub fn operation(self) -> &'static str {
        match self {
            Endpoint::UploadDb => "uploadDbFile",
            Endpoint::GetActions => "getActions",
            Endpoint::GetComplexAction => "getCplxAction",
            Endpoint::LoadComplexAction => "loadCplxAction",
        }
    }
}

/// Sends requests to a CAB server.
#[async_trait]
pub trait Backend: Send + Sync {
    /// POST a JSON body (or none) and return the response body.
    async fn post_json(&self, endpoint: Endpoint, body: Option<Value>) -> Result<String, ApiError>;

    /// POST the database file as multipart field `dbfile`.
    async fn upload_db(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError>;
}

#[cfg(feature = "http")]
pub use http::HttpBackend;

#[cfg(feature = "http")]
mod http {
    use super::{Backend, Endpoint};
    use crate::config::ClientConfig;
    use crate::error::ApiError;
    use async_trait::async_trait;
    use reqwest::multipart::{Form, Part};
    use reqwest::{Client, Response};
    use serde_json::Value;
    use std::time::Duration;
    use url::Url;

    /// `reqwest` transport.
    ///
    /// The server keeps the uploaded database in its session, so the client
    /// holds a cookie store for its whole lifetime.
    pub struct HttpBackend {
        client: Client,
        base: Url,
    }

    impl HttpBackend {
        pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
            let client = Client::builder()
                .cookie_store(true)
                .timeout(Duration::from_secs(config.timeout_secs))
                .build()?;
            Ok(Self {
                client,
                base: config.base()?,
            })
        }

        pub fn base(&self) -> &Url {
            &self.base
        }

        fn url(&self, endpoint: Endpoint) -> Result<Url, ApiError> {
            Ok(self.base.join(endpoint.path())?)
        }

        async fn body(endpoint: Endpoint, response: Response) -> Result<String, ApiError> {
            let status = response.status();
            if !status.is_success() {
                log::error!("{} failed with status {status}", endpoint.path());
                return Err(ApiError::Transport {
                    status: status.as_u16(),
                    endpoint: endpoint.path(),
                });
            }
            Ok(response.text().await?)
        }
    }

    #[async_trait]
    impl Backend for HttpBackend {
        async fn post_json(
            &self,
            endpoint: Endpoint,
            body: Option<Value>,
        ) -> Result<String, ApiError> {
            let url = self.url(endpoint)?;
            log::debug!("POST {url}");
            let request = self.client.post(url);
            let request = match body {
                Some(body) => request.json(&body),
                None => request,
            };
            let response = request.send().await?;
            Self::body(endpoint, response).await
        }

        async fn upload_db(&self, file_name: &str, bytes: Vec<u8>) -> Result<String, ApiError> {
            let url = self.url(Endpoint::UploadDb)?;
            log::debug!("POST {url} ({} bytes)", bytes.len());
            let part = Part::bytes(bytes).file_name(file_name.to_string());
            let form = Form::new().part("dbfile", part);
            let response = self.client.post(url).multipart(form).send().await?;
            Self::body(Endpoint::UploadDb, response).await
        }
    }
}
