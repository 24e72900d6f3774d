use std::time::Duration;

use leptos::ev;
use leptos::prelude::*;
use post_client::Post;

use crate::components::post_form::PostForm;
use crate::components::post_list::PostList;
use crate::query;
use crate::state::AppState;

const GC_INTERVAL: Duration = Duration::from_secs(60);

#[component]
pub fn App() -> impl IntoView {
    let state = AppState::new();

    let on_post_click = Callback::new(move |post: Post| state.selected_post.set(Some(post)));
    let reset_selected_post = Callback::new(move |_: ()| {
        if state.selected_post.with_untracked(Option::is_some) {
            state.selected_post.set(None);
        }
    });

    // вкладка снова в фокусе или вернулась сеть
    let _ = window_event_listener(ev::focus, move |_| query::refetch_if_stale(state));
    let _ = window_event_listener(ev::online, move |_| query::refetch_if_stale(state));
    set_interval(move || query::collect_garbage(state), GC_INTERVAL);

    view! {
        <div class="container mt-4">
            <h1 class="mb-4">"Posts"</h1>
            <div class="row">
                <div class="col-md-5">
                    <h2>{move || if state.selected_post.get().is_some() { "Edit Post" } else { "New Post" }}</h2>
                    <PostForm state=state reset_selected_post=reset_selected_post />
                </div>
                <div class="col-md-7">
                    <PostList state=state on_post_click=on_post_click />
                </div>
            </div>
        </div>
    }
}
