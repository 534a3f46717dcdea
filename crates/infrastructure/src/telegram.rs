//! Telegram Bot API 附件存储
//!
//! 上传走 `sendPhoto`，Telegram 会返回同一张图的多个尺寸；
//! 下载先 `getFile` 取得 `file_path`，再从文件端点拉取字节。

use async_trait::async_trait;
use domain::{BlobStore, BlobStoreError, BlobStoreResult, BlobVariant};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
}

impl From<&config::BlobConfig> for TelegramConfig {
    fn from(value: &config::BlobConfig) -> Self {
        Self {
            api_base: value.api_base.trim_end_matches('/').to_string(),
            token: value.token.clone(),
            chat_id: value.chat_id.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    #[serde(default)]
    photo: Vec<PhotoSize>,
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
    #[serde(default)]
    file_size: u64,
}

#[derive(Debug, Deserialize)]
struct TelegramFile {
    file_path: Option<String>,
}

#[derive(Clone)]
pub struct TelegramBlobStore {
    client: Client,
    config: TelegramConfig,
}

impl TelegramBlobStore {
    pub fn new(config: TelegramConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: TelegramConfig) -> Self {
        Self { client, config }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.config.api_base, self.config.token, method)
    }

    fn file_url(&self, file_path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.config.api_base, self.config.token, file_path
        )
    }

    /// Telegram 出错时同样返回 JSON（HTTP 4xx + `ok: false`），所以先解析再看 `ok`
    async fn decode<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> BlobStoreResult<T> {
        let status = response.status();
        let body: TelegramResponse<T> = response.json().await.map_err(|err| {
            BlobStoreError::unavailable(format!("{context}: http {status}: {err}"))
        })?;

        if !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("{context} failed with http {status}"));
            return Err(BlobStoreError::rejected(description));
        }

        body.result
            .ok_or_else(|| BlobStoreError::unavailable(format!("{context}: missing result")))
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> BlobStoreError {
    BlobStoreError::unavailable(format!("{context}: {err}"))
}

#[async_trait]
impl BlobStore for TelegramBlobStore {
    async fn upload(&self, file_name: String, bytes: Vec<u8>) -> BlobStoreResult<Vec<BlobVariant>> {
        debug!(file_name = %file_name, size = bytes.len(), "[upload] 上传到 Telegram");

        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .part("photo", Part::bytes(bytes).file_name(file_name.clone()));

        let response = self
            .client
            .post(self.method_url("sendPhoto"))
            .multipart(form)
            .send()
            .await
            .map_err(|err| transport_error("sendPhoto", err))?;

        let message: SentMessage = Self::decode(response, "sendPhoto").await.map_err(|err| {
            warn!(file_name = %file_name, error = %err, "[upload] Telegram 拒绝上传");
            err
        })?;

        info!(file_name = %file_name, variants = message.photo.len(), "[upload] 上传完成");
        Ok(message
            .photo
            .into_iter()
            .map(|photo| BlobVariant {
                file_id: photo.file_id,
                file_size: photo.file_size,
            })
            .collect())
    }

    async fn download(&self, file_id: String) -> BlobStoreResult<Vec<u8>> {
        let response = self
            .client
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id.as_str())])
            .send()
            .await
            .map_err(|err| transport_error("getFile", err))?;

        let file: TelegramFile = Self::decode(response, "getFile").await?;
        let file_path = file
            .file_path
            .ok_or_else(|| BlobStoreError::NotFound(file_id.clone()))?;

        let response = self
            .client
            .get(self.file_url(&file_path))
            .send()
            .await
            .map_err(|err| transport_error("file download", err))?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(BlobStoreError::NotFound(file_id)),
            status => {
                return Err(BlobStoreError::unavailable(format!(
                    "file download failed with http {status}"
                )))
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_error("file download", err))?;

        info!(file_id = %file_id, size = bytes.len(), "[download] 已从 Telegram 下载");
        Ok(bytes.to_vec())
    }
}
