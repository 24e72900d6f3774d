use leptos::prelude::*;
use post_client::{POSTS_KEY, Post, QueryCache, QueryState, RetryPolicy};

#[derive(Debug, Clone, Copy)]
pub(crate) struct AppState {
    pub(crate) cache: RwSignal<QueryCache<Vec<Post>>>,
    pub(crate) selected_post: RwSignal<Option<Post>>,
    pub(crate) retry: RetryPolicy,
}

impl AppState {
    pub(crate) fn new() -> Self {
        Self {
            cache: RwSignal::new(QueryCache::default()),
            selected_post: RwSignal::new(None),
            retry: RetryPolicy::default(),
        }
    }

    /// Реактивный снимок запроса `"posts"`.
    pub(crate) fn posts_state(&self) -> QueryState<Vec<Post>> {
        self.cache.with(|cache| cache.state(POSTS_KEY))
    }

    /// Патч коллекции после успешной мутации.
    pub(crate) fn patch_posts(&self, patch: impl FnOnce(&mut Vec<Post>)) {
        self.cache.update(|cache| {
            cache.update_data(POSTS_KEY, patch);
        });
    }
}
