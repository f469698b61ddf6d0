//! Platform client over the platform's HTTP API

use super::{ClientFactory, ClientSettings, DeviceUuids, PlatformClient, PlatformError};
use async_trait::async_trait;
use instareel_core::PlatformConfig;
use reqwest::{multipart, RequestBuilder, StatusCode};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Builds [`HttpPlatformClient`]s sharing one configuration
#[derive(Debug, Clone)]
pub struct HttpClientFactory {
    config: PlatformConfig,
}

impl HttpClientFactory {
    pub fn new(config: PlatformConfig) -> Self {
        Self { config }
    }
}

impl ClientFactory for HttpClientFactory {
    fn create(&self) -> Result<Box<dyn PlatformClient>, PlatformError> {
        Ok(Box::new(HttpPlatformClient::new(self.config.clone())?))
    }
}

pub struct HttpPlatformClient {
    http: reqwest::Client,
    config: PlatformConfig,
    settings: ClientSettings,
    delay_range: Option<(f64, f64)>,
}

impl HttpPlatformClient {
    /// Fails when the configured timeout or user agent cannot be applied
    pub fn new(config: PlatformConfig) -> Result<Self, PlatformError> {
        let http = build_http(&config, None).map_err(|e| PlatformError::Setup(e.to_string()))?;
        Ok(Self {
            http,
            config,
            settings: ClientSettings::default(),
            delay_range: None,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn with_device_headers(&self, request: RequestBuilder) -> RequestBuilder {
        let uuids = &self.settings.uuids;
        let mut request = request
            .header("X-IG-Device-ID", &uuids.uuid)
            .header("X-IG-Android-ID", &uuids.android_device_id)
            .header("X-IG-Family-Device-ID", &uuids.phone_id)
            .header("X-Pigeon-Session-Id", &uuids.client_session_id);
        if let Some(authorization) = &self.settings.authorization {
            request = request.header("Authorization", authorization);
        }
        if !self.settings.cookies.is_empty() {
            let cookie = self
                .settings
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            request = request.header("Cookie", cookie);
        }
        request
    }

    /// Send, map platform failures, then apply the inter-request delay
    async fn send(
        &self,
        request: RequestBuilder,
    ) -> Result<(reqwest::header::HeaderMap, Value), PlatformError> {
        let response = self.with_device_headers(request).send().await;
        self.pause().await;
        let response = response?;

        let status = response.status();
        let headers = response.headers().clone();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if status.is_success() {
            return Ok((headers, body));
        }

        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error"))
            .to_string();

        if message == "login_required"
            || status == StatusCode::UNAUTHORIZED
            || status == StatusCode::FORBIDDEN
        {
            return Err(PlatformError::LoginRequired);
        }

        Err(PlatformError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay_range.and_then(|(lower, upper)| jitter(lower, upper)) {
            tokio::time::sleep(delay).await;
        }
    }
}

/// A uniformly random delay in `[lower, upper]` seconds; `None` when there is nothing
/// to wait or the bounds do not form a representable duration
fn jitter(lower: f64, upper: f64) -> Option<Duration> {
    let secs = lower + fastrand::f64() * (upper - lower);
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|delay| !delay.is_zero())
}

fn build_http(
    config: &PlatformConfig,
    proxy: Option<reqwest::Proxy>,
) -> reqwest::Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(config.user_agent.clone());
    if let Some(proxy) = proxy {
        builder = builder.proxy(proxy);
    }
    builder.build()
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    fn set_delay_range(&mut self, lower: f64, upper: f64) {
        self.delay_range = Some((lower, upper));
    }

    fn set_proxy(&mut self, proxy_url: &str) -> Result<(), PlatformError> {
        let proxy = if proxy_url.trim().is_empty() {
            None
        } else {
            // proxy urls carry credentials; keep them out of the error text
            Some(
                reqwest::Proxy::all(proxy_url)
                    .map_err(|e| PlatformError::InvalidProxy(e.without_url().to_string()))?,
            )
        };
        self.http = build_http(&self.config, proxy)
            .map_err(|e| PlatformError::InvalidProxy(e.without_url().to_string()))?;
        Ok(())
    }

    async fn public_ip(&self) -> Result<String, PlatformError> {
        let response = self
            .http
            .get(&self.config.ip_echo_url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?.trim().to_string())
    }

    fn settings(&self) -> ClientSettings {
        self.settings.clone()
    }

    fn set_settings(&mut self, settings: ClientSettings) {
        self.settings = settings;
    }

    fn set_uuids(&mut self, uuids: DeviceUuids) {
        self.settings.uuids = uuids;
    }

    async fn login(&mut self, username: &str, password: &str) -> Result<(), PlatformError> {
        if self.settings.is_authenticated() {
            debug!(username, "Reusing restored session settings");
            return Ok(());
        }

        let uuids = self.settings.uuids.clone();
        let request = self.http.post(self.url("accounts/login/")).json(&serde_json::json!({
            "username": username,
            "password": password,
            "device_id": uuids.android_device_id,
            "guid": uuids.uuid,
            "phone_id": uuids.phone_id,
            "adid": uuids.advertising_id,
        }));

        let (headers, body) = match self.send(request).await {
            Err(PlatformError::LoginRequired) => {
                return Err(PlatformError::BadCredentials(
                    "platform rejected username or password".to_string(),
                ))
            }
            other => other?,
        };

        let user_id = body
            .pointer("/logged_in_user/pk")
            .map(|pk| match pk {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .ok_or_else(|| PlatformError::Api {
                status: 200,
                message: "login response carried no user id".to_string(),
            })?;

        self.settings.authorization = headers
            .get("ig-set-authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        for cookie in headers.get_all(reqwest::header::SET_COOKIE) {
            if let Some((name, value)) = cookie
                .to_str()
                .ok()
                .and_then(|c| c.split(';').next())
                .and_then(|pair| pair.split_once('='))
            {
                self.settings
                    .cookies
                    .insert(name.trim().to_string(), value.trim().to_string());
            }
        }
        self.settings.user_id = Some(user_id);
        self.settings.user_agent = Some(self.config.user_agent.clone());
        self.settings.last_login = Some(chrono::Utc::now());
        Ok(())
    }

    async fn timeline_probe(&self) -> Result<(), PlatformError> {
        self.send(self.http.post(self.url("feed/timeline/")))
            .await
            .map(|_| ())
    }

    fn user_id(&self) -> Option<String> {
        self.settings.user_id.clone()
    }

    async fn photo_upload(&self, path: &Path, caption: &str) -> Result<String, PlatformError> {
        let bytes = tokio::fs::read(path).await?;
        let upload_id = chrono::Utc::now().timestamp_millis().to_string();
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("photo.jpg")
            .to_string();

        let form = multipart::Form::new()
            .text("upload_id", upload_id.clone())
            .part("photo", multipart::Part::bytes(bytes).file_name(file_name));
        self.send(self.http.post(self.url("upload/photo/")).multipart(form))
            .await?;

        let (_, body) = self
            .send(self.http.post(self.url("media/configure/")).json(&serde_json::json!({
                "upload_id": upload_id,
                "caption": caption,
            })))
            .await?;

        let media_id = body
            .pointer("/media/pk")
            .or_else(|| body.pointer("/media/id"))
            .map(|id| match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .unwrap_or(upload_id);
        Ok(media_id)
    }
}
