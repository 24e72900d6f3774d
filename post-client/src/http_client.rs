use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

use crate::api::PostsApi;
use crate::error::{Operation, PostClientError, PostClientResult};
use crate::models::{NewPost, Post};

/// Публичная песочница REST API, с которой работает клиент по умолчанию.
pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Clone)]
/// Параметры HTTP-клиента.
pub struct ClientConfig {
    /// Базовый URL ресурса, без `/posts`.
    pub base_url: String,
    /// Таймаут установки соединения.
    pub connect_timeout: Duration,
    /// Таймаут всего запроса.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl ClientConfig {
    /// Конфигурация с другим базовым URL и таймаутами по умолчанию.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
/// HTTP-клиент ресурса `/posts`.
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    /// Создаёт клиент с заданной конфигурацией.
    pub fn new(config: ClientConfig) -> PostClientResult<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            base_url: config.base_url,
            client,
        })
    }

    /// Базовый URL, с которым создан клиент.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    async fn send(
        &self,
        operation: Operation,
        request: reqwest::RequestBuilder,
    ) -> PostClientResult<reqwest::Response> {
        let response = request.send().await?;
        let status = response.status();
        debug!(%operation, %status, "posts api responded");

        if !status.is_success() {
            return Err(PostClientError::Status {
                operation,
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(
        operation: Operation,
        response: reqwest::Response,
    ) -> PostClientResult<T> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|err| PostClientError::Decode {
            operation,
            message: err.to_string(),
        })
    }

    /// универсальный helper для запросов с json-payload
    async fn send_json<TReq, TRes>(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: &TReq,
    ) -> PostClientResult<TRes>
    where
        TReq: Serialize + ?Sized,
        TRes: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|err| PostClientError::Encode {
            operation,
            message: err.to_string(),
        })?;
        let request = self
            .client
            .request(method, self.endpoint(path))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(payload);

        let response = self.send(operation, request).await?;
        Self::decode(operation, response).await
    }
}

#[async_trait]
impl PostsApi for HttpClient {
    async fn list_posts(&self) -> PostClientResult<Vec<Post>> {
        let request = self.client.request(Method::GET, self.endpoint("/posts"));
        let response = self.send(Operation::FetchPosts, request).await?;
        Self::decode(Operation::FetchPosts, response).await
    }

    async fn create_post(&self, post: &NewPost) -> PostClientResult<Post> {
        self.send_json(Operation::CreatePost, Method::POST, "/posts", post)
            .await
    }

    async fn update_post(&self, post: &Post) -> PostClientResult<Post> {
        self.send_json(
            Operation::UpdatePost,
            Method::PUT,
            &format!("/posts/{}", post.id),
            post,
        )
        .await
    }

    async fn delete_post(&self, id: i64) -> PostClientResult<()> {
        let request = self
            .client
            .request(Method::DELETE, self.endpoint(&format!("/posts/{id}")));
        self.send(Operation::DeletePost, request).await?;
        Ok(())
    }
}
