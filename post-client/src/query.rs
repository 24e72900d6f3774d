//! Query-клиент коллекции постов: загрузка с ретраями и кэшем, мутации,
//! которые патчат кэш вместо перезагрузки.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::api::PostsApi;
use crate::cache::{CacheOptions, POSTS_KEY, QueryCache, QueryState};
use crate::collection::{append_post, dedupe_by_id, remove_post, replace_post};
use crate::error::PostClientResult;
use crate::models::{NewPost, Post, Submission};
use crate::retry::RetryPolicy;

type SharedCache = Arc<Mutex<QueryCache<Vec<Post>>>>;

fn lock(cache: &Mutex<QueryCache<Vec<Post>>>) -> MutexGuard<'_, QueryCache<Vec<Post>>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
/// Наблюдатель записи `"posts"`; пока он жив, запись не собирается сборщиком.
pub struct QueryObserver {
    cache: SharedCache,
}

impl Drop for QueryObserver {
    /// Последний снятый наблюдатель планирует удаление записи через `gc_time`.
    fn drop(&mut self) {
        let (left, unused_since, gc_time) = {
            let mut cache = lock(&self.cache);
            let left = cache.remove_observer_at(POSTS_KEY, Utc::now());
            (left, cache.unused_since(POSTS_KEY), cache.options().gc_time)
        };
        debug!(observers = left, "posts observer released");

        let Some(since) = unused_since else {
            return;
        };
        // вне рантайма планировать некому
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let cache = Arc::clone(&self.cache);
        runtime.spawn(async move {
            tokio::time::sleep(gc_time).await;
            let mut cache = lock(&cache);
            // за это время запись могли снова начать наблюдать
            if cache.unused_since(POSTS_KEY) == Some(since) && cache.remove(POSTS_KEY) {
                debug!(?gc_time, "unused posts evicted from cache");
            }
        });
    }
}

#[derive(Debug)]
/// Клиент, который делят между собой список и форма.
pub struct PostsQueryClient<A> {
    api: Arc<A>,
    cache: SharedCache,
    retry: RetryPolicy,
}

impl<A> Clone for PostsQueryClient<A> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            cache: Arc::clone(&self.cache),
            retry: self.retry,
        }
    }
}

impl<A: PostsApi> PostsQueryClient<A> {
    /// Создаёт клиент с заданными параметрами кэша и ретраев.
    pub fn new(api: A, options: CacheOptions, retry: RetryPolicy) -> Self {
        Self {
            api: Arc::new(api),
            cache: Arc::new(Mutex::new(QueryCache::new(options))),
            retry,
        }
    }

    /// Клиент с окном свежести 5 минут, удержанием 15 минут и тремя ретраями.
    pub fn with_defaults(api: A) -> Self {
        Self::new(api, CacheOptions::default(), RetryPolicy::default())
    }

    /// Транспорт, через который идут запросы.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Снимок запроса `"posts"`.
    pub fn posts_state(&self) -> QueryState<Vec<Post>> {
        lock(&self.cache).state(POSTS_KEY)
    }

    /// Закэшированная коллекция, если она есть.
    pub fn cached_posts(&self) -> Option<Vec<Post>> {
        lock(&self.cache).data(POSTS_KEY).cloned()
    }

    /// Регистрирует наблюдателя коллекции.
    pub fn observe_posts(&self) -> QueryObserver {
        let count = lock(&self.cache).add_observer_at(POSTS_KEY, Utc::now());
        debug!(observers = count, "posts observer registered");
        QueryObserver {
            cache: Arc::clone(&self.cache),
        }
    }

    /// Возвращает коллекцию: из кэша, если она свежая, иначе из сети.
    pub async fn fetch_posts(&self) -> PostClientResult<Vec<Post>> {
        let cached = lock(&self.cache)
            .fresh_data_at(POSTS_KEY, Utc::now())
            .cloned();
        if let Some(posts) = cached {
            debug!(count = posts.len(), "serving fresh posts from cache");
            return Ok(posts);
        }
        self.refetch_posts().await
    }

    /// Загружает коллекцию из сети независимо от свежести кэша.
    pub async fn refetch_posts(&self) -> PostClientResult<Vec<Post>> {
        lock(&self.cache).begin_fetch_at(POSTS_KEY, Utc::now());

        match self.fetch_with_retry().await {
            Ok(mut posts) => {
                dedupe_by_id(&mut posts);
                lock(&self.cache).set_data_at(POSTS_KEY, posts.clone(), Utc::now());
                Ok(posts)
            }
            Err(err) => {
                lock(&self.cache).fail_fetch_at(POSTS_KEY, err.to_string(), Utc::now());
                Err(err)
            }
        }
    }

    async fn fetch_with_retry(&self) -> PostClientResult<Vec<Post>> {
        let mut failures = 0;
        loop {
            match self.api.list_posts().await {
                Ok(posts) => return Ok(posts),
                Err(err) => {
                    failures += 1;
                    if !self.retry.should_retry(failures) {
                        warn!(attempts = failures, error = %err, "fetching posts failed");
                        return Err(err);
                    }
                    let delay = self.retry.delay_for(failures - 1);
                    debug!(attempt = failures, ?delay, error = %err, "retrying posts fetch");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Перезагружает устаревшую коллекцию, если её кто-то наблюдает.
    ///
    /// Если загрузка уже идёт (например, ждёт очередного ретрая), вторая не
    /// запускается.
    ///
    /// Вызывается при возвращении фокуса и при восстановлении сети.
    pub async fn refetch_if_stale(&self) -> Option<PostClientResult<Vec<Post>>> {
        let should_refetch = {
            let cache = lock(&self.cache);
            cache.observer_count(POSTS_KEY) > 0
                && !cache.is_fetching(POSTS_KEY)
                && cache.is_stale_at(POSTS_KEY, Utc::now())
        };
        if !should_refetch {
            return None;
        }
        Some(self.refetch_posts().await)
    }

    /// Окно приложения снова получило фокус.
    pub async fn on_focus(&self) -> Option<PostClientResult<Vec<Post>>> {
        debug!("focus regained");
        self.refetch_if_stale().await
    }

    /// Сеть снова доступна.
    pub async fn on_reconnect(&self) -> Option<PostClientResult<Vec<Post>>> {
        debug!("network reconnected");
        self.refetch_if_stale().await
    }

    /// Помечает коллекцию устаревшей; следующая загрузка пойдёт в сеть.
    pub fn invalidate_posts(&self) {
        lock(&self.cache).invalidate(POSTS_KEY);
    }

    /// Создаёт пост и дописывает ответ сервера в конец коллекции.
    pub async fn create_post(&self, post: NewPost) -> PostClientResult<Post> {
        let created = self.api.create_post(&post).await?;
        info!(id = created.id, "post created");

        let created_for_cache = created.clone();
        let patched = lock(&self.cache).update_data_at(POSTS_KEY, Utc::now(), move |posts| {
            append_post(posts, created_for_cache)
        });
        if patched.is_none() {
            debug!("posts are not cached yet, skipping append");
        }
        Ok(created)
    }

    /// Полностью заменяет пост и подменяет запись в коллекции ответом сервера.
    pub async fn update_post(&self, post: Post) -> PostClientResult<Post> {
        let updated = self.api.update_post(&post).await?;
        info!(id = updated.id, "post updated");

        let updated_for_cache = updated.clone();
        let replaced = lock(&self.cache).update_data_at(POSTS_KEY, Utc::now(), move |posts| {
            replace_post(posts, updated_for_cache)
        });
        if replaced != Some(true) {
            debug!(id = updated.id, "updated post is not in cache");
        }
        Ok(updated)
    }

    /// Удаляет пост и убирает его из коллекции по `id`.
    pub async fn delete_post(&self, id: i64) -> PostClientResult<()> {
        self.api.delete_post(id).await?;
        info!(id, "post deleted");

        let removed = lock(&self.cache).update_data_at(POSTS_KEY, Utc::now(), |posts| {
            remove_post(posts, id)
        });
        if removed != Some(true) {
            debug!(id, "deleted post is not in cache");
        }
        Ok(())
    }

    /// Отправляет то, что собрала форма.
    pub async fn submit(&self, submission: Submission) -> PostClientResult<Post> {
        match submission {
            Submission::Create(post) => self.create_post(post).await,
            Submission::Update(post) => self.update_post(post).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::error::PostClientError;
    use crate::list::ListView;
    use crate::testing::{FakeApi, sample_post};

    fn client() -> PostsQueryClient<FakeApi> {
        PostsQueryClient::with_defaults(FakeApi::seeded())
    }

    fn always_stale(api: FakeApi) -> PostsQueryClient<FakeApi> {
        PostsQueryClient::new(
            api,
            CacheOptions {
                stale_time: Duration::ZERO,
                ..CacheOptions::default()
            },
            RetryPolicy::default(),
        )
    }

    #[tokio::test]
    async fn fetch_renders_every_returned_post() {
        let client = client();
        let posts = client.fetch_posts().await.expect("fetch must succeed");
        assert_eq!(posts.len(), 10);

        let state = client.posts_state();
        assert_eq!(ListView::from_state(&state).rendered_count(), 10);
    }

    #[tokio::test]
    async fn fetch_drops_duplicate_ids() {
        let api = FakeApi::with_posts(vec![
            sample_post(1, "a"),
            sample_post(1, "dup"),
            sample_post(2, "b"),
        ]);
        let client = PostsQueryClient::with_defaults(api);
        let posts = client.fetch_posts().await.expect("fetch must succeed");

        let ids: Vec<i64> = posts.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn fetch_within_freshness_window_hits_cache() {
        let client = client();
        let first = client.fetch_posts().await.expect("first fetch");
        let second = client.fetch_posts().await.expect("second fetch");

        assert_eq!(first, second);
        assert_eq!(client.api().count("GET"), 1);
    }

    #[tokio::test]
    async fn stale_data_is_fetched_again() {
        let client = always_stale(FakeApi::seeded());
        client.fetch_posts().await.expect("first fetch");
        client.fetch_posts().await.expect("second fetch");
        assert_eq!(client.api().count("GET"), 2);
    }

    #[tokio::test]
    async fn invalidated_data_is_fetched_again() {
        let client = client();
        client.fetch_posts().await.expect("first fetch");
        client.invalidate_posts();
        client.fetch_posts().await.expect("second fetch");
        assert_eq!(client.api().count("GET"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_retries_with_exponential_backoff() {
        let api = FakeApi::seeded();
        api.fail_next_lists(2);
        let client = PostsQueryClient::with_defaults(api);

        let started = tokio::time::Instant::now();
        let posts = client.fetch_posts().await.expect("third attempt succeeds");

        assert_eq!(posts.len(), 10);
        assert_eq!(client.api().count("GET"), 3);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert!(client.posts_state().error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_error_banner() {
        let api = FakeApi::seeded();
        api.fail_next_lists(u32::MAX);
        let client = PostsQueryClient::with_defaults(api);

        let result = client.fetch_posts().await;
        assert!(matches!(result, Err(PostClientError::Status { status: 500, .. })));
        assert_eq!(client.api().count("GET"), 4);

        let state = client.posts_state();
        assert!(!state.is_fetching);
        assert!(matches!(ListView::from_state(&state), ListView::Failed(_)));
    }

    #[tokio::test]
    async fn create_appends_server_post() {
        let client = client();
        client.fetch_posts().await.expect("fetch");

        let created = client
            .create_post(NewPost {
                user_id: 1,
                title: "Hello".to_string(),
                body: "World".to_string(),
            })
            .await
            .expect("create must succeed");

        let cached = client.cached_posts().expect("posts cached");
        assert_eq!(cached.len(), 11);
        assert!(cached.iter().any(|p| p.id == created.id && p.title == "Hello"));
        assert_eq!(client.api().count("GET"), 1);
    }

    #[tokio::test]
    async fn update_replaces_entry_in_place() {
        let client = client();
        client.fetch_posts().await.expect("fetch");

        let mut post = sample_post(7, "Updated");
        post.body = "new body".to_string();
        client.update_post(post).await.expect("update must succeed");

        let cached = client.cached_posts().expect("posts cached");
        assert_eq!(cached.len(), 10);
        let entry = cached.iter().find(|p| p.id == 7).expect("post 7 cached");
        assert_eq!(entry.title, "Updated");
        assert_eq!(entry.body, "new body");
        assert!(client.api().requests().contains(&"PUT /posts/7".to_string()));
    }

    #[tokio::test]
    async fn delete_removes_entry_without_refetch() {
        let client = client();
        client.fetch_posts().await.expect("fetch");

        client.delete_post(3).await.expect("delete must succeed");

        let cached = client.cached_posts().expect("posts cached");
        assert_eq!(cached.len(), 9);
        assert!(cached.iter().all(|p| p.id != 3));
        assert_eq!(client.api().count("GET"), 1);
        assert!(client.api().requests().contains(&"DELETE /posts/3".to_string()));
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_untouched_and_is_not_retried() {
        let client = client();
        client.fetch_posts().await.expect("fetch");
        client.api().fail_mutations(true);

        let result = client.delete_post(3).await;
        assert!(matches!(result, Err(PostClientError::Status { status: 500, .. })));
        assert_eq!(client.cached_posts().map(|p| p.len()), Some(10));
        assert_eq!(client.api().count("DELETE"), 1);
    }

    #[tokio::test]
    async fn mutation_before_first_fetch_does_not_create_collection() {
        let client = client();
        client
            .create_post(NewPost {
                user_id: 1,
                title: "t".to_string(),
                body: "b".to_string(),
            })
            .await
            .expect("create must succeed");
        assert!(client.cached_posts().is_none());
    }

    #[tokio::test]
    async fn focus_refetches_only_observed_stale_posts() {
        let client = always_stale(FakeApi::seeded());
        client.fetch_posts().await.expect("fetch");

        assert!(client.on_focus().await.is_none());

        let _observer = client.observe_posts();
        let refetched = client.on_reconnect().await.expect("observed stale posts refetch");
        assert!(refetched.is_ok());
        assert_eq!(client.api().count("GET"), 2);
    }

    #[tokio::test]
    async fn focus_keeps_fresh_posts() {
        let client = client();
        let _observer = client.observe_posts();
        client.fetch_posts().await.expect("fetch");

        assert!(client.on_focus().await.is_none());
        assert_eq!(client.api().count("GET"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_during_retry_backoff_does_not_start_second_fetch() {
        let api = FakeApi::seeded();
        api.fail_next_lists(1);
        let client = PostsQueryClient::with_defaults(api);
        let _observer = client.observe_posts();

        let (fetched, focused) = tokio::join!(client.fetch_posts(), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            assert!(client.posts_state().is_fetching);
            client.on_focus().await
        });

        assert!(fetched.is_ok());
        assert!(focused.is_none());
        assert_eq!(client.api().count("GET"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn released_posts_are_evicted_after_gc_time() {
        let client = PostsQueryClient::new(
            FakeApi::seeded(),
            CacheOptions {
                gc_time: Duration::from_secs(60),
                ..CacheOptions::default()
            },
            RetryPolicy::default(),
        );
        let observer = client.observe_posts();
        client.fetch_posts().await.expect("fetch");
        drop(observer);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(client.cached_posts().is_some());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(client.cached_posts().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn re_observed_posts_are_not_evicted() {
        let client = PostsQueryClient::new(
            FakeApi::seeded(),
            CacheOptions {
                gc_time: Duration::from_secs(60),
                ..CacheOptions::default()
            },
            RetryPolicy::default(),
        );
        let observer = client.observe_posts();
        client.fetch_posts().await.expect("fetch");
        drop(observer);

        tokio::time::sleep(Duration::from_secs(10)).await;
        let _observer = client.observe_posts();

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert!(client.cached_posts().is_some());
    }
}
