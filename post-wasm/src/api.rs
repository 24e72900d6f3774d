use gloo_net::http::{Request, RequestBuilder, Response};
use post_client::{NewPost, Operation, Post};
use serde::{Serialize, de::DeserializeOwned};

const API_BASE_URL: &str = match option_env!("WASM_API_BASE_URL") {
    Some(value) => value,
    None => "https://jsonplaceholder.typicode.com",
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Debug, Clone)]
pub(crate) enum ApiError {
    Network(String),
    Http { operation: Operation, status: u16 },
    Encode { operation: Operation, message: String },
    Decode(String),
}

impl core::fmt::Display for ApiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "network error: {msg}"),
            Self::Http { operation, status } => {
                write!(f, "failed to {operation}: http status {status}")
            }
            Self::Encode { operation, message } => {
                write!(f, "failed to {operation}: could not encode request body: {message}")
            }
            Self::Decode(msg) => write!(f, "decode error: {msg}"),
        }
    }
}

fn endpoint(path: &str) -> String {
    format!(
        "{}/{}",
        API_BASE_URL.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

async fn send(operation: Operation, request: Request) -> Result<Response, ApiError> {
    let response = request
        .send()
        .await
        .map_err(|err| ApiError::Network(err.to_string()))?;

    if !response.ok() {
        return Err(ApiError::Http {
            operation,
            status: response.status(),
        });
    }
    Ok(response)
}

async fn send_json<T: Serialize>(
    operation: Operation,
    builder: RequestBuilder,
    payload: &T,
) -> Result<Post, ApiError> {
    let body = serde_json::to_string(payload).map_err(|err| ApiError::Encode {
        operation,
        message: err.to_string(),
    })?;
    let request = builder
        .header("Content-type", JSON_CONTENT_TYPE)
        .body(body)
        .map_err(|err| ApiError::Network(err.to_string()))?;

    let response = send(operation, request).await?;
    parse_json(response).await
}

pub(crate) async fn list_posts() -> Result<Vec<Post>, ApiError> {
    let request = Request::get(&endpoint("/posts"))
        .build()
        .map_err(|err| ApiError::Network(err.to_string()))?;
    let response = send(Operation::FetchPosts, request).await?;
    parse_json(response).await
}

pub(crate) async fn create_post(post: &NewPost) -> Result<Post, ApiError> {
    send_json(Operation::CreatePost, Request::post(&endpoint("/posts")), post).await
}

pub(crate) async fn update_post(post: &Post) -> Result<Post, ApiError> {
    let url = endpoint(&format!("/posts/{}", post.id));
    send_json(Operation::UpdatePost, Request::put(&url), post).await
}

pub(crate) async fn delete_post(id: i64) -> Result<(), ApiError> {
    let request = Request::delete(&endpoint(&format!("/posts/{id}")))
        .build()
        .map_err(|err| ApiError::Network(err.to_string()))?;
    send(Operation::DeletePost, request).await?;
    Ok(())
}
