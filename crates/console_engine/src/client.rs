use console_core::FileKind;
use console_logging::{console_debug, console_info, console_warn};
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::endpoint::{CredentialSet, Endpoint};
use crate::{ExecuteOptions, RemoteError};

#[derive(Debug, Clone)]
pub struct ClientSettings {
    base_url: Url,
    pub credentials: CredentialSet,
}

impl ClientSettings {
    /// Endpoint paths are resolved below `base_url`, so any path prefix is kept.
    pub fn new(mut base_url: Url, credentials: CredentialSet) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            credentials,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

/// Backend operations. Each call settles once, with the backend's answer or a
/// [`RemoteError`]; none of them retry.
#[async_trait::async_trait]
pub trait RemoteService: Send + Sync {
    async fn list_files(&self, kind: FileKind) -> Result<Vec<Value>, RemoteError>;

    async fn upload_file(
        &self,
        kind: FileKind,
        content: Vec<u8>,
        filename: &str,
    ) -> Result<Value, RemoteError>;

    /// One outcome for the whole batch.
    async fn delete_files(&self, kind: FileKind, names: &[String]) -> Result<Value, RemoteError>;

    async fn convert_to_spreadsheet(
        &self,
        filename: &str,
        use_case: &str,
    ) -> Result<Value, RemoteError>;

    /// Returns once the backend accepted the run, not when it finished.
    async fn execute_tests(
        &self,
        names: &[String],
        options: &ExecuteOptions,
    ) -> Result<Value, RemoteError>;

    async fn execute_legacy(&self) -> Result<Value, RemoteError>;

    async fn start_recording(&self, enabled: bool) -> Result<Value, RemoteError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteRequest<'a> {
    excel_file_paths: &'a [String],
    wait_time: u64,
    capture_screenshot: bool,
    web_testing_in_parallel: bool,
}

#[derive(Debug, Clone)]
pub struct ReqwestRemoteService {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl ReqwestRemoteService {
    pub fn new(settings: ClientSettings) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        Ok(Self { client, settings })
    }

    fn url(&self, endpoint: Endpoint, query: &[(&str, &str)]) -> Result<Url, RemoteError> {
        let relative = endpoint.path().trim_start_matches('/');
        let mut url = self
            .settings
            .base_url
            .join(relative)
            .map_err(|err| RemoteError::InvalidUrl(err.to_string()))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn request(
        &self,
        endpoint: Endpoint,
        query: &[(&str, &str)],
    ) -> Result<reqwest::RequestBuilder, RemoteError> {
        let url = self.url(endpoint, query)?;
        let credentials = self.settings.credentials.for_tier(endpoint.tier());
        console_debug!(
            "{} as {} ({:?} tier)",
            endpoint,
            credentials.username,
            endpoint.tier()
        );
        Ok(self
            .client
            .request(endpoint.method(), url)
            .basic_auth(&credentials.username, Some(&credentials.password)))
    }

    async fn send(
        &self,
        endpoint: Endpoint,
        request: reqwest::RequestBuilder,
    ) -> Result<Value, RemoteError> {
        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            console_warn!("{} answered {}", endpoint, status);
            return Err(RemoteError::Server {
                status: status.as_u16(),
                body,
            });
        }
        console_info!("{} answered {} ({} bytes)", endpoint, status, body.len());
        Ok(parse_body(&body))
    }
}

#[async_trait::async_trait]
impl RemoteService for ReqwestRemoteService {
    async fn list_files(&self, kind: FileKind) -> Result<Vec<Value>, RemoteError> {
        let endpoint = Endpoint::ListFiles(kind);
        let request = self.request(endpoint, &[])?;
        let body = self.send(endpoint, request).await?;
        Ok(list_entries(body))
    }

    async fn upload_file(
        &self,
        kind: FileKind,
        content: Vec<u8>,
        filename: &str,
    ) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::Upload;
        console_debug!("uploading {} file {} ({} bytes)", kind, filename, content.len());
        let part = Part::bytes(content).file_name(filename.to_owned());
        let form = Form::new().part("file", part);
        let request = self.request(endpoint, &[])?.multipart(form);
        self.send(endpoint, request).await
    }

    async fn delete_files(&self, kind: FileKind, names: &[String]) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::DeleteFiles(kind);
        let request = self.request(endpoint, &[])?.json(names);
        self.send(endpoint, request).await
    }

    async fn convert_to_spreadsheet(
        &self,
        filename: &str,
        use_case: &str,
    ) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::ConvertToExcel;
        let request = self
            .request(endpoint, &[("useCase", use_case)])?
            .json(&[filename]);
        self.send(endpoint, request).await
    }

    async fn execute_tests(
        &self,
        names: &[String],
        options: &ExecuteOptions,
    ) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::ExecuteUseCases;
        let body = ExecuteRequest {
            excel_file_paths: names,
            wait_time: options.wait_time_ms,
            capture_screenshot: options.capture_screenshot,
            web_testing_in_parallel: options.parallel,
        };
        let request = self.request(endpoint, &[])?.json(&body);
        self.send(endpoint, request).await
    }

    async fn execute_legacy(&self) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::ExecuteLegacy;
        let request = self.request(endpoint, &[])?;
        self.send(endpoint, request).await
    }

    async fn start_recording(&self, enabled: bool) -> Result<Value, RemoteError> {
        let endpoint = Endpoint::RecordUseCases;
        let flag = if enabled { "true" } else { "false" };
        let request = self.request(endpoint, &[("Record", flag)])?;
        self.send(endpoint, request).await
    }
}

/// Turns a listing body into entries: arrays as is, `null` as empty, anything
/// else as a single entry.
pub fn list_entries(body: Value) -> Vec<Value> {
    match body {
        Value::Array(entries) => entries,
        Value::Null => Vec::new(),
        other => vec![other],
    }
}

fn parse_body(body: &str) -> Value {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(body.to_owned()))
}

fn map_reqwest_error(err: reqwest::Error) -> RemoteError {
    RemoteError::Network(err.to_string())
}
