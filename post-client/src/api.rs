use async_trait::async_trait;

use crate::error::PostClientResult;
use crate::models::{NewPost, Post};

#[async_trait]
/// REST-ресурс `/posts`, поверх которого работает query-клиент.
///
/// Реализуется `HttpClient`; в тестах подменяется заглушкой в памяти.
pub trait PostsApi: Send + Sync {
    /// `GET /posts`.
    async fn list_posts(&self) -> PostClientResult<Vec<Post>>;

    /// `POST /posts`; сервер присваивает `id`.
    async fn create_post(&self, post: &NewPost) -> PostClientResult<Post>;

    /// `PUT /posts/{id}` с полным телом поста.
    async fn update_post(&self, post: &Post) -> PostClientResult<Post>;

    /// `DELETE /posts/{id}`.
    async fn delete_post(&self, id: i64) -> PostClientResult<()>;
}
