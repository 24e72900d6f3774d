use core::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Операция над ресурсом `/posts`, в рамках которой произошла ошибка.
pub enum Operation {
    /// `GET /posts`.
    FetchPosts,
    /// `POST /posts`.
    CreatePost,
    /// `PUT /posts/{id}`.
    UpdatePost,
    /// `DELETE /posts/{id}`.
    DeletePost,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::FetchPosts => "fetch posts",
            Self::CreatePost => "add post",
            Self::UpdatePost => "update post",
            Self::DeletePost => "delete post",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Error)]
/// Ошибки клиентской библиотеки `post-client`.
pub enum PostClientError {
    /// Ошибка HTTP-транспорта (`reqwest`).
    #[cfg(feature = "http")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Сервер ответил неуспешным статусом.
    #[error("failed to {operation}: http status {status}")]
    Status {
        /// Операция, которая завершилась ошибкой.
        operation: Operation,
        /// HTTP-статус ответа.
        status: u16,
    },

    /// Тело ответа не удалось разобрать.
    #[error("failed to {operation}: invalid response body: {message}")]
    Decode {
        /// Операция, ответ которой не разобрался.
        operation: Operation,
        /// Описание ошибки десериализации.
        message: String,
    },

    /// Тело запроса не удалось сериализовать.
    #[error("failed to {operation}: could not encode request body: {message}")]
    Encode {
        /// Операция, запрос которой не собрался.
        operation: Operation,
        /// Описание ошибки сериализации.
        message: String,
    },

    /// Поля формы не прошли проверку.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Предыдущая отправка формы ещё не завершилась.
    #[error("submission already in flight")]
    SubmitInFlight,
}

/// Результат операций `post-client`.
pub type PostClientResult<T> = Result<T, PostClientError>;
