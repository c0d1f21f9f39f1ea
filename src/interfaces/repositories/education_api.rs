use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use zeroize::Zeroizing;

use crate::{
    api_errors::ApiError,
    entities::{
        education::{EducationPayload, EducationRecord, RecordId},
        profile::Profile,
    },
};

const UNAUTHORIZED_MESSAGE: &str =
    "401 Unauthorized: Owner mode required or session expired. Please unlock from the navbar and try again.";

#[async_trait]
pub trait EducationApi: Send + Sync {
    /// Fetches the portfolio profile
    async fn get_profile(&self) -> Result<Profile, ApiError>;

    /// Lists every education record
    async fn list_education(&self) -> Result<Vec<EducationRecord>, ApiError>;

    /// Creates a record and returns it as stored
    async fn create_education(&self, payload: &EducationPayload) -> Result<EducationRecord, ApiError>;

    /// Replaces the record with `id` and returns it as stored
    async fn update_education(
        &self,
        id: &RecordId,
        payload: &EducationPayload,
    ) -> Result<EducationRecord, ApiError>;
}

#[async_trait]
impl<T: EducationApi + ?Sized> EducationApi for Arc<T> {
    async fn get_profile(&self) -> Result<Profile, ApiError> {
        (**self).get_profile().await
    }

    async fn list_education(&self) -> Result<Vec<EducationRecord>, ApiError> {
        (**self).list_education().await
    }

    async fn create_education(&self, payload: &EducationPayload) -> Result<EducationRecord, ApiError> {
        (**self).create_education(payload).await
    }

    async fn update_education(
        &self,
        id: &RecordId,
        payload: &EducationPayload,
    ) -> Result<EducationRecord, ApiError> {
        (**self).update_education(id, payload).await
    }
}

/// `EducationApi` over the portfolio HTTP API.
#[derive(Clone)]
pub struct HttpEducationApi {
    client: Client,
    base_url: Url,
    token: Option<Zeroizing<String>>,
}

impl HttpEducationApi {
    pub fn new(client: Client, base_url: Url, token: Option<String>) -> Self {
        HttpEducationApi {
            client,
            base_url,
            token: token.filter(|t| !t.is_empty()).map(Zeroizing::new),
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::offline(format!("Invalid API URL for {}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let builder = self
            .client
            .request(method, self.url(path)?)
            .header(reqwest::header::ACCEPT, "application/json");
        Ok(builder)
    }

    fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let builder = self.request(method.clone(), path)?;
        match &self.token {
            Some(token) => Ok(builder
                .bearer_auth(token.as_str())
                .header("X-Owner-Token", token.as_str())),
            None => {
                tracing::warn!("Owner token missing for {} {}", method, path);
                Ok(builder)
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.request(Method::GET, path)?.send().await?;
        let response = check_status(response, false).await?;
        let (status, body) = read_body(response).await?;
        decode_body(status, &body)
    }

    /// Writes `payload`; a 2xx reply without a body counts as stored as sent.
    async fn send_record(
        &self,
        method: Method,
        path: &str,
        id: Option<&RecordId>,
        payload: &EducationPayload,
    ) -> Result<EducationRecord, ApiError> {
        let response = self.authorized(method, path)?.json(payload).send().await?;
        let response = check_status(response, true).await?;
        let (status, body) = read_body(response).await?;

        let body = body.trim();
        if status == StatusCode::NO_CONTENT || body.is_empty() || body == "null" {
            return EducationRecord::from_payload(id.cloned(), payload)
                .map_err(|e| unreadable(status, e));
        }
        decode_body(status, body)
    }
}

fn unreadable(status: StatusCode, err: impl std::fmt::Display) -> ApiError {
    ApiError::with_status(status.as_u16(), format!("Unreadable response body: {}", err))
}

/// The request already succeeded once a status is in hand, so body
/// failures keep that status instead of passing for a network error.
async fn read_body(response: Response) -> Result<(StatusCode, String), ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| unreadable(status, e))?;
    Ok((status, body))
}

fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| unreadable(status, e))
}

/// Turns a non-2xx response into an `ApiError` whose message is the body
/// text, falling back to `"<status> <reason>"` when the body is empty.
async fn check_status(response: Response, authorized: bool) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    if authorized && matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        return Err(ApiError::with_status(status.as_u16(), UNAUTHORIZED_MESSAGE));
    }

    let body = response.text().await.unwrap_or_default();
    let message = if body.trim().is_empty() {
        format!("{} {}", status.as_u16(), status.canonical_reason().unwrap_or(""))
            .trim_end()
            .to_string()
    } else {
        body
    };
    Err(ApiError::with_status(status.as_u16(), message))
}

#[async_trait]
impl EducationApi for HttpEducationApi {
    async fn get_profile(&self) -> Result<Profile, ApiError> {
        self.get_json("/api/profile").await
    }

    async fn list_education(&self) -> Result<Vec<EducationRecord>, ApiError> {
        self.get_json("/api/education").await
    }

    async fn create_education(&self, payload: &EducationPayload) -> Result<EducationRecord, ApiError> {
        self.send_record(Method::POST, "/api/education", None, payload).await
    }

    async fn update_education(
        &self,
        id: &RecordId,
        payload: &EducationPayload,
    ) -> Result<EducationRecord, ApiError> {
        let path = format!("/api/education/{}", urlencoding::encode(&id.to_string()));
        self.send_record(Method::PUT, &path, Some(id), payload).await
    }
}
