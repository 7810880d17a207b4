//! Reqwest-backed Bot API client.
//!
//! This adapter owns transport details only: method URLs, request
//! serialisation, timeouts, and mapping of the Bot API response envelope
//! onto [`ChatTransportError`]. The token never appears in errors or logs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{
    AnswerCallbackQueryRequest, ApiResponseDto, EditMessageTextRequest, SendMessageRequest,
    SentMessageDto,
};
use crate::domain::ports::{ChatTransport, ChatTransportError};
use crate::domain::{CallbackAnswer, MessageEdit, MessageId, OutgoingMessage};

/// Public Bot API endpoint.
pub const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const NOT_MODIFIED: &str = "message is not modified";

/// Connection settings for [`TelegramBotClient`].
pub struct TelegramClientConfig {
    /// Base URL, normally [`DEFAULT_TELEGRAM_API_URL`].
    pub api_url: Url,
    /// Bot token.
    pub token: Zeroizing<String>,
    /// Timeout for ordinary calls; long polls extend it per request.
    pub request_timeout: Duration,
}

impl TelegramClientConfig {
    /// Settings for `api_url` with the default request timeout.
    #[must_use]
    pub const fn new(api_url: Url, token: Zeroizing<String>) -> Self {
        Self {
            api_url,
            token,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Bot API client implementing [`ChatTransport`].
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct TelegramBotClient {
    client: Client,
    api_url: Url,
    token: Zeroizing<String>,
}

impl TelegramBotClient {
    /// Build a client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: TelegramClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            api_url: config.api_url,
            token: config.token,
        })
    }

    /// Invoke a Bot API method and decode its `result`.
    ///
    /// `timeout` overrides the client timeout for this call only.
    ///
    /// # Errors
    ///
    /// [`ChatTransportError::Transport`] when the request never completed,
    /// [`ChatTransportError::Rejected`] for `ok: false` responses and
    /// [`ChatTransportError::Decode`] for unreadable bodies.
    pub async fn call<B, T>(
        &self,
        method: &str,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<T, ChatTransportError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.method_url(method)?;
        let mut request = self.client.post(url).json(body);
        if let Some(limit) = timeout {
            request = request.timeout(limit);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(map_transport_error)?;
        let decoded: ApiResponseDto<T> = serde_json::from_slice(&bytes).map_err(|error| {
            if status.is_success() {
                ChatTransportError::decode(format!("invalid {method} response: {error}"))
            } else {
                ChatTransportError::rejected(status.as_u16(), format!("{method} failed"))
            }
        })?;
        unwrap_envelope(method, status.as_u16(), decoded)
    }

    fn method_url(&self, method: &str) -> Result<Url, ChatTransportError> {
        let base = self.api_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/bot{}/{method}", self.token.as_str()))
            .map_err(|_| ChatTransportError::transport(format!("invalid Bot API URL for {method}")))
    }
}

fn unwrap_envelope<T>(
    method: &str,
    http_status: u16,
    envelope: ApiResponseDto<T>,
) -> Result<T, ChatTransportError> {
    let ApiResponseDto {
        ok,
        result,
        description,
        error_code,
    } = envelope;
    if !ok {
        let status = error_code.unwrap_or(http_status);
        let message = description.unwrap_or_else(|| format!("{method} failed"));
        return Err(ChatTransportError::rejected(status, message));
    }
    result.ok_or_else(|| ChatTransportError::decode(format!("{method} response has no result")))
}

fn map_transport_error(error: reqwest::Error) -> ChatTransportError {
    let kind = if error.is_timeout() { "timed out" } else { "failed" };
    ChatTransportError::transport(format!("request {kind}: {}", error.without_url()))
}

#[async_trait]
impl ChatTransport for TelegramBotClient {
    async fn send_message(&self, message: &OutgoingMessage) -> Result<MessageId, ChatTransportError> {
        let sent: SentMessageDto = self
            .call("sendMessage", &SendMessageRequest::from(message), None)
            .await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn edit_message(&self, edit: &MessageEdit) -> Result<(), ChatTransportError> {
        let result: Result<serde_json::Value, _> = self
            .call("editMessageText", &EditMessageTextRequest::from(edit), None)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(ChatTransportError::Rejected { message, .. }) if message.contains(NOT_MODIFIED) => {
                debug!(message_id = edit.message_id.get(), "edit left the message unchanged");
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    async fn answer_callback(&self, answer: &CallbackAnswer) -> Result<(), ChatTransportError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryRequest::from(answer),
                None,
            )
            .await?;
        Ok(())
    }
}
