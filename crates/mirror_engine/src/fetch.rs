use std::time::Duration;

use futures_util::StreamExt;
use mirror_core::StructuredDocument;
use mirror_logging::mirror_debug;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use url::Url;

use crate::remote::parse_document;
use crate::{FailureKind, FetchError};

/// Producer of the structured document. The sync driver treats every
/// failure as opaque and only forwards its message.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch_document(&self, document_id: &str) -> Result<StructuredDocument, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub api_base: String,
    pub access_token: Option<String>,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            api_base: "https://docs.googleapis.com/".to_string(),
            access_token: None,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            redirect_limit: 5,
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

/// Reads documents from the remote documents API over HTTPS.
#[derive(Debug, Clone)]
pub struct ReqwestDocumentFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestDocumentFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn document_url(&self, document_id: &str) -> Result<Url, FetchError> {
        let invalid = |err: url::ParseError| {
            FetchError::new(FailureKind::InvalidUrl, format!("invalid document url: {err}"))
        };
        let mut base = Url::parse(&self.settings.api_base).map_err(invalid)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let mut url = base.join("v1/documents/").map_err(invalid)?;
        url.path_segments_mut()
            .map_err(|_| {
                FetchError::new(FailureKind::InvalidUrl, "api base cannot carry a path")
            })?
            .pop_if_empty()
            .push(document_id);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for ReqwestDocumentFetcher {
    async fn fetch_document(&self, document_id: &str) -> Result<StructuredDocument, FetchError> {
        let url = self.document_url(document_id)?;
        mirror_debug!("Fetching document {}", url);

        let mut request = self.client.get(url).header(ACCEPT, "application/json");
        if let Some(token) = self.settings.access_token.as_deref() {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                status_kind(status),
                format!("fetching document: {status}"),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, content_len));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(too_large(self.settings.max_bytes, next_len));
            }
            bytes.extend_from_slice(&chunk);
        }
        mirror_debug!("Fetched document {} ({} bytes)", document_id, bytes.len());

        parse_document(&bytes).map_err(|err| {
            FetchError::new(FailureKind::Malformed, format!("parsing document: {err}"))
        })
    }
}

fn status_kind(status: StatusCode) -> FailureKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureKind::Unauthorized,
        StatusCode::NOT_FOUND => FailureKind::NotFound,
        other => FailureKind::HttpStatus(other.as_u16()),
    }
}

fn too_large(max_bytes: u64, actual: u64) -> FetchError {
    FetchError::new(
        FailureKind::TooLarge {
            max_bytes,
            actual: Some(actual),
        },
        "fetching document: response too large",
    )
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, format!("fetching document: {err}"));
    }
    FetchError::new(FailureKind::Network, format!("fetching document: {err}"))
}

#[cfg(test)]
mod tests {
    use super::{FetchSettings, ReqwestDocumentFetcher};

    fn url_for(base: &str, id: &str) -> String {
        let fetcher = ReqwestDocumentFetcher::new(FetchSettings {
            api_base: base.to_string(),
            ..FetchSettings::default()
        })
        .unwrap();
        fetcher.document_url(id).unwrap().to_string()
    }

    #[test]
    fn document_url_tolerates_missing_trailing_slash() {
        assert_eq!(
            url_for("https://docs.googleapis.com/", "abc"),
            "https://docs.googleapis.com/v1/documents/abc"
        );
        assert_eq!(
            url_for("http://127.0.0.1:9000/proxy", "abc"),
            "http://127.0.0.1:9000/proxy/v1/documents/abc"
        );
    }

    #[test]
    fn document_id_is_a_single_escaped_segment() {
        assert_eq!(
            url_for("https://docs.googleapis.com/", "a/b c"),
            "https://docs.googleapis.com/v1/documents/a%2Fb%20c"
        );
    }
}
