use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{cookie::Jar, Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Judgment, SessionId},
    error::BackendErrorBody,
    protocol::{
        ClassificationResponse, JudgmentAck, JudgmentRequest, UserInputRequest, JUDGMENT_PATH,
        USER_INPUT_PATH,
    },
};
use tracing::{debug, info, warn};
use url::Url;

pub mod error;

pub use error::ClientError;

/// The two backend routes the widget talks to.
#[async_trait]
pub trait FeedbackApi: Send + Sync {
    async fn classify(&self, text: &str) -> Result<ClassificationResponse, ClientError>;
    async fn submit_judgment(&self, judgment: Judgment) -> Result<JudgmentAck, ClientError>;

    /// Makes later requests carry `session`. Returns `false` when the
    /// implementation does not send credentials.
    fn install_session(&self, _session: SessionId) -> bool {
        false
    }
}

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    /// Attach the cookie jar (and with it the session cookie) to every request.
    pub include_credentials: bool,
    /// `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
}

pub struct HttpFeedbackClient {
    http: Client,
    base_url: Url,
    cookies: Option<Arc<Jar>>,
}

impl HttpFeedbackClient {
    pub fn new(base_url: &str, options: ClientOptions) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|source| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;

        let mut builder = Client::builder();
        let cookies = if options.include_credentials {
            let jar = Arc::new(Jar::default());
            builder = builder.cookie_provider(Arc::clone(&jar));
            Some(jar)
        } else {
            None
        };
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build().map_err(ClientError::Build)?,
            base_url,
            cookies,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn includes_credentials(&self) -> bool {
        self.cookies.is_some()
    }

    fn endpoint_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.as_str().trim_end_matches('/'))
    }

    /// Decodes any JSON body, whatever the status. Only a body that is not
    /// the expected JSON is an error; a JSON error reply is logged and its
    /// missing fields decode as absent.
    async fn read_json<T: DeserializeOwned>(
        endpoint: &'static str,
        response: Response,
    ) -> Result<T, ClientError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|source| ClientError::Transport { endpoint, source })?;

        match serde_json::from_slice::<T>(&body) {
            Ok(parsed) => {
                if !status.is_success() {
                    let message = serde_json::from_slice::<BackendErrorBody>(&body)
                        .ok()
                        .and_then(|parsed| parsed.describe().map(str::to_string))
                        .unwrap_or_default();
                    warn!(endpoint, %status, message = %message, "backend replied with an error body");
                }
                Ok(parsed)
            }
            Err(source) if status.is_success() => Err(ClientError::Decode { endpoint, source }),
            Err(_) => Err(ClientError::Status {
                endpoint,
                status,
                message: String::from_utf8_lossy(&body).into_owned(),
            }),
        }
    }
}

#[async_trait]
impl FeedbackApi for HttpFeedbackClient {
    async fn classify(&self, text: &str) -> Result<ClassificationResponse, ClientError> {
        let response = self
            .http
            .post(self.endpoint_url(USER_INPUT_PATH))
            .json(&UserInputRequest {
                text: text.to_string(),
            })
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: USER_INPUT_PATH,
                source,
            })?;
        let body: ClassificationResponse = Self::read_json(USER_INPUT_PATH, response).await?;
        info!(
            label = %body.label,
            model_version = body.model_version.as_deref().unwrap_or("-"),
            "backend classification received"
        );
        Ok(body)
    }

    async fn submit_judgment(&self, judgment: Judgment) -> Result<JudgmentAck, ClientError> {
        let response = self
            .http
            .post(self.endpoint_url(JUDGMENT_PATH))
            .json(&JudgmentRequest::from(judgment))
            .send()
            .await
            .map_err(|source| ClientError::Transport {
                endpoint: JUDGMENT_PATH,
                source,
            })?;
        Self::read_json(JUDGMENT_PATH, response).await
    }

    /// Stores the session cookie for the backend origin; later calls overwrite it.
    fn install_session(&self, session: SessionId) -> bool {
        let Some(jar) = &self.cookies else {
            return false;
        };
        jar.add_cookie_str(&session.cookie(), &self.base_url);
        debug!(session = %session, origin = %self.base_url, "installed session cookie");
        true
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
