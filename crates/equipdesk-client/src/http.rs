// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use anyhow::{Context, Result, bail};
use equipdesk_app::{Record, RecordId, RecordService, ServiceError};
use reqwest::blocking::{Client as HttpClient, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const LIST_PATH: &str = "equip/list";
const INSERT_PATH: &str = "equip/insert";
const UPDATE_PATH: &str = "equip/update";
const DELETE_PATH: &str = "equip/delete";

/// Record service reached over JSON `POST` requests.
#[derive(Debug, Clone)]
pub struct HttpService {
    base_url: Url,
    timeout: Duration,
    http: HttpClient,
}

impl HttpService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            bail!("service.base_url must not be empty");
        }
        let mut base_url =
            Url::parse(trimmed).with_context(|| format!("parse service.base_url {trimmed:?}"))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!(
                "service.base_url must use http or https, got {:?}",
                base_url.scheme()
            );
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Confirms the service answers a list request; used by `--check`.
    pub fn ping(&self) -> Result<usize> {
        let records = self
            .fetch_list()
            .with_context(|| format!("cannot list records from {}", self.base_url))?;
        Ok(records.len())
    }

    fn post<B>(&self, path: &str, body: &B) -> Result<Response, ServiceError>
    where
        B: Serialize + ?Sized,
    {
        let url = self
            .base_url
            .join(path)
            .map_err(|error| ServiceError::Transport(format!("build {path} url: {error}")))?;
        debug!(%url, "record service request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .map_err(|error| transport_error(self.base_url.as_str(), error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            warn!(
                path,
                status = status.as_u16(),
                detail = %error_detail(&body),
                "record service rejected request"
            );
            return Err(ServiceError::Status(status.as_u16()));
        }
        Ok(response)
    }

    fn fetch_list(&self) -> Result<Vec<Record>, ServiceError> {
        let response = self.post(LIST_PATH, &serde_json::json!({}))?;
        let parsed: Envelope<Vec<Record>> = response
            .json()
            .map_err(|error| ServiceError::Decode(error.to_string()))?;
        Ok(parsed.data)
    }
}

impl RecordService for HttpService {
    fn list(&self) -> Result<Vec<Record>, ServiceError> {
        match self.fetch_list() {
            Err(error) if error.is_transient() => {
                warn!(%error, "record list failed, retrying once");
                self.fetch_list()
            }
            other => other,
        }
    }

    fn insert(&self, record: &Record) -> Result<Option<RecordId>, ServiceError> {
        let response = self.post(INSERT_PATH, record)?;
        let body = response.text().unwrap_or_default();
        Ok(serde_json::from_str::<Envelope<InsertedId>>(&body)
            .ok()
            .map(|parsed| parsed.data.id))
    }

    fn update(&self, record: &Record) -> Result<(), ServiceError> {
        self.post(UPDATE_PATH, record).map(drop)
    }

    fn remove(&self, record: &Record) -> Result<(), ServiceError> {
        self.post(DELETE_PATH, record).map(drop)
    }
}

fn transport_error(base_url: &str, error: reqwest::Error) -> ServiceError {
    if error.is_timeout() {
        return ServiceError::Timeout;
    }
    ServiceError::Transport(format!(
        "{base_url} -- check service.base_url and that the server is up ({error})"
    ))
}

fn error_detail(body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorEnvelope>(body)
        && let Some(message) = parsed.message.or(parsed.msg)
        && !message.is_empty()
    {
        return message;
    }
    if body.len() < 100 && !body.contains('{') {
        return body.trim().to_owned();
    }
    String::new()
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct InsertedId {
    id: RecordId,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    message: Option<String>,
    msg: Option<String>,
}
