use std::time::Duration;

use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use post_client::POSTS_KEY;
use post_client::collection::dedupe_by_id;
use wasm_bindgen::JsValue;

use crate::api::{self, ApiError};
use crate::logging;
use crate::state::AppState;

async fn sleep(delay: Duration) {
    let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
    let promise = js_sys::Promise::new(&mut |resolve, _reject| {
        let scheduled = web_sys::window().and_then(|window| {
            window
                .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, millis)
                .ok()
        });
        if scheduled.is_none() {
            let _ = resolve.call0(&JsValue::NULL);
        }
    });
    let _ = wasm_bindgen_futures::JsFuture::from(promise).await;
}

async fn fetch_with_retry(state: AppState) -> Result<Vec<post_client::Post>, ApiError> {
    let mut failures = 0;
    loop {
        match api::list_posts().await {
            Ok(posts) => return Ok(posts),
            Err(err) => {
                failures += 1;
                if !state.retry.should_retry(failures) {
                    return Err(err);
                }
                let delay = state.retry.delay_for(failures - 1);
                logging::warn(&format!("fetching posts failed ({err}), retry in {delay:?}"));
                sleep(delay).await;
            }
        }
    }
}

/// Загружает посты, если в кэше нет свежих и загрузка ещё не идёт.
pub(crate) fn load_posts(state: AppState) {
    let skip = state.cache.with_untracked(|cache| {
        cache.is_fetching(POSTS_KEY) || cache.fresh_data_at(POSTS_KEY, Utc::now()).is_some()
    });
    if !skip {
        refetch_posts(state);
    }
}

pub(crate) fn refetch_posts(state: AppState) {
    state
        .cache
        .update(|cache| cache.begin_fetch_at(POSTS_KEY, Utc::now()));

    spawn_local(async move {
        match fetch_with_retry(state).await {
            Ok(mut posts) => {
                dedupe_by_id(&mut posts);
                state
                    .cache
                    .update(|cache| cache.set_data_at(POSTS_KEY, posts, Utc::now()));
            }
            Err(err) => {
                logging::warn(&format!("fetching posts failed: {err}"));
                state
                    .cache
                    .update(|cache| cache.fail_fetch_at(POSTS_KEY, err.to_string(), Utc::now()));
            }
        }
    });
}

/// Фокус окна или восстановление сети: перезагрузка, если список смонтирован и устарел.
pub(crate) fn refetch_if_stale(state: AppState) {
    let should_refetch = state.cache.with_untracked(|cache| {
        cache.observer_count(POSTS_KEY) > 0
            && !cache.is_fetching(POSTS_KEY)
            && cache.is_stale_at(POSTS_KEY, Utc::now())
    });
    if should_refetch {
        refetch_posts(state);
    }
}

pub(crate) fn collect_garbage(state: AppState) {
    let evicted = state
        .cache
        .try_update(|cache| cache.collect_garbage_at(Utc::now()))
        .unwrap_or(0);
    if evicted > 0 {
        logging::info(&format!("evicted {evicted} unused cache entries"));
    }
}
