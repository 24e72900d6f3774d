//! Клиентская библиотека для ресурса `/posts` (REST-песочница
//! `jsonplaceholder.typicode.com`).
//!
//! Предоставляет:
//! - модель поста и REST-клиент (`reqwest`, feature `http`);
//! - кэш запросов с окном свежести и удержанием (`QueryCache`);
//! - query-клиент, который ретраит загрузку списка и патчит кэш после мутаций;
//! - состояние списка (`ListView`) и формы (`PostForm`) для любого фронтенда.
//!
//! Без feature `http` крейт не тянет сетевой стек и собирается под `wasm32`.
#![warn(missing_docs)]

pub mod cache;
pub mod collection;
mod error;
pub mod form;
pub mod list;
mod models;
pub mod retry;

#[cfg(feature = "http")]
mod api;
#[cfg(feature = "http")]
pub mod controller;
#[cfg(feature = "http")]
mod http_client;
#[cfg(feature = "http")]
mod query;

#[cfg(all(test, feature = "http"))]
mod testing;

pub use cache::{CacheOptions, POSTS_KEY, QueryCache, QueryState};
pub use error::{Operation, PostClientError, PostClientResult};
pub use form::{FormMode, PostForm, SubmitState};
pub use list::{FETCH_ERROR_BANNER, ListView};
pub use models::{NewPost, Post, PostDraft, Submission};
pub use retry::RetryPolicy;

#[cfg(feature = "http")]
pub use api::PostsApi;
#[cfg(feature = "http")]
pub use controller::{PostFormController, PostList};
#[cfg(feature = "http")]
pub use http_client::{ClientConfig, DEFAULT_BASE_URL, HttpClient};
#[cfg(feature = "http")]
pub use query::{PostsQueryClient, QueryObserver};
