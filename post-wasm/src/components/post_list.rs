use chrono::Utc;
use leptos::prelude::*;
use leptos::task::spawn_local;
use post_client::collection::remove_post;
use post_client::{FETCH_ERROR_BANNER, ListView, POSTS_KEY, Post};

use crate::state::AppState;
use crate::{api, logging, query};

#[component]
pub(crate) fn PostList(state: AppState, on_post_click: Callback<Post>) -> impl IntoView {
    state
        .cache
        .update(|cache| cache.add_observer_at(POSTS_KEY, Utc::now()));
    on_cleanup(move || {
        state
            .cache
            .try_update(|cache| cache.remove_observer_at(POSTS_KEY, Utc::now()));
    });
    query::load_posts(state);

    let on_delete = Callback::new(move |post_id: i64| {
        spawn_local(async move {
            match api::delete_post(post_id).await {
                Ok(()) => {
                    state.patch_posts(|posts| {
                        remove_post(posts, post_id);
                    });
                    logging::info("Post deleted successfully");
                }
                Err(err) => logging::warn(&format!("Error deleting post: {err}")),
            }
        });
    });

    let render_post = move |post: Post| {
        let post_id = post.id;
        let selected = post.clone();
        view! {
            <div class="card mb-3">
                <div class="card-body">
                    <h5 class="card-title">{post.title}</h5>
                    <p class="card-text">{post.body}</p>
                    <button
                        class="btn btn-primary me-2"
                        on:click=move |_| on_post_click.run(selected.clone())
                    >
                        "Edit"
                    </button>
                    <button class="btn btn-danger" on:click=move |_| on_delete.run(post_id)>
                        "Delete"
                    </button>
                </div>
            </div>
        }
    };

    view! {
        <div>
            {move || {
                let snapshot = state.posts_state();
                match ListView::from_state(&snapshot) {
                    ListView::Loading => {
                        view! {
                            <div class="spinner-border" role="status">
                                <span class="visually-hidden">"Loading..."</span>
                            </div>
                        }
                            .into_any()
                    }
                    ListView::Failed(_) => {
                        view! { <div class="alert alert-danger">{FETCH_ERROR_BANNER}</div> }
                            .into_any()
                    }
                    ListView::Ready(posts) => {
                        posts.iter().cloned().map(render_post).collect_view().into_any()
                    }
                }
            }}
        </div>
    }
}
