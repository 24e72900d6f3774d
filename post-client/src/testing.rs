//! Заглушка `PostsApi` в памяти для unit-тестов.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU32, Ordering};

use async_trait::async_trait;

use crate::api::PostsApi;
use crate::error::{Operation, PostClientError, PostClientResult};
use crate::models::{NewPost, Post};

pub(crate) fn sample_post(id: i64, title: &str) -> Post {
    Post {
        id,
        user_id: 1,
        title: title.to_string(),
        body: format!("body {id}"),
    }
}

pub(crate) struct FakeApi {
    posts: Mutex<Vec<Post>>,
    requests: Mutex<Vec<String>>,
    list_failures_left: AtomicU32,
    fail_mutations: AtomicBool,
    next_id: AtomicI64,
}

impl FakeApi {
    pub(crate) fn with_posts(posts: Vec<Post>) -> Self {
        Self {
            posts: Mutex::new(posts),
            requests: Mutex::new(Vec::new()),
            list_failures_left: AtomicU32::new(0),
            fail_mutations: AtomicBool::new(false),
            next_id: AtomicI64::new(101),
        }
    }

    pub(crate) fn seeded() -> Self {
        Self::with_posts((1..=10).map(|id| sample_post(id, &format!("post {id}"))).collect())
    }

    /// Следующие `count` загрузок списка ответят 500.
    pub(crate) fn fail_next_lists(&self, count: u32) {
        self.list_failures_left.store(count, Ordering::SeqCst);
    }

    pub(crate) fn fail_mutations(&self, fail: bool) {
        self.fail_mutations.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn count(&self, prefix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .count()
    }

    fn record(&self, request: String) {
        self.requests.lock().expect("requests lock").push(request);
    }

    fn mutation_guard(&self, operation: Operation) -> PostClientResult<()> {
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(PostClientError::Status {
                operation,
                status: 500,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl PostsApi for FakeApi {
    async fn list_posts(&self) -> PostClientResult<Vec<Post>> {
        self.record("GET /posts".to_string());
        let left = self.list_failures_left.load(Ordering::SeqCst);
        if left > 0 {
            self.list_failures_left.store(left - 1, Ordering::SeqCst);
            return Err(PostClientError::Status {
                operation: Operation::FetchPosts,
                status: 500,
            });
        }
        Ok(self.posts.lock().expect("posts lock").clone())
    }

    async fn create_post(&self, post: &NewPost) -> PostClientResult<Post> {
        self.record("POST /posts".to_string());
        self.mutation_guard(Operation::CreatePost)?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(Post {
            id,
            user_id: post.user_id,
            title: post.title.clone(),
            body: post.body.clone(),
        })
    }

    async fn update_post(&self, post: &Post) -> PostClientResult<Post> {
        self.record(format!("PUT /posts/{}", post.id));
        self.mutation_guard(Operation::UpdatePost)?;
        Ok(post.clone())
    }

    async fn delete_post(&self, id: i64) -> PostClientResult<()> {
        self.record(format!("DELETE /posts/{id}"));
        self.mutation_guard(Operation::DeletePost)
    }
}
