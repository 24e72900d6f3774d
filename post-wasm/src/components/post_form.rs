use chrono::Utc;
use leptos::ev::SubmitEvent;
use leptos::prelude::*;
use leptos::task::spawn_local;
use post_client::collection::{append_post, replace_post};
use post_client::form::{RESET_SELECTION_DELAY, SUCCESS_BANNER_DURATION};
use post_client::{PostForm as FormState, Submission};

use crate::state::AppState;
use crate::{api, logging};

#[component]
pub(crate) fn PostForm(state: AppState, reset_selected_post: Callback<()>) -> impl IntoView {
    let form = RwSignal::new(FormState::new(state.selected_post.get_untracked()));
    // баннер успеха зависит от времени, перерисовываем его по таймеру
    let banner_tick = RwSignal::new(0_u32);

    Effect::new(move |_| {
        let selected = state.selected_post.get();
        form.update(|f| f.set_post(selected));
    });

    let on_submit = move |ev: SubmitEvent| {
        ev.prevent_default();

        let Some(Ok(submission)) = form.try_update(|f| f.begin_submit()) else {
            return;
        };

        spawn_local(async move {
            let result = match &submission {
                Submission::Create(new_post) => api::create_post(new_post).await.inspect(|post| {
                    state.patch_posts(|posts| append_post(posts, post.clone()));
                    logging::info(&format!("Post created with ID: {}", post.id));
                }),
                Submission::Update(post) => api::update_post(post).await.inspect(|updated| {
                    state.patch_posts(|posts| {
                        replace_post(posts, updated.clone());
                    });
                    logging::info(&format!("Post updated with ID: {}", updated.id));
                }),
            };

            match result {
                Ok(_) => {
                    form.update(|f| f.succeed(Utc::now()));
                    set_timeout(
                        move || banner_tick.update(|tick| *tick += 1),
                        SUCCESS_BANNER_DURATION,
                    );
                    set_timeout(
                        move || {
                            // за секунду форму могли отправить снова или начать править
                            let due = form
                                .try_with_untracked(|f| f.selection_reset_due_at(Utc::now()))
                                .unwrap_or(false);
                            if due {
                                reset_selected_post.run(());
                            }
                        },
                        RESET_SELECTION_DELAY,
                    );
                }
                Err(err) => {
                    logging::warn(&format!("submit failed: {err}"));
                    form.update(|f| f.fail(err.to_string()));
                }
            }
        });
    };

    let success_banner = move || {
        banner_tick.track();
        form.with(|f| f.success_banner_at(Utc::now()))
    };
    let error_banner = move || form.with(|f| f.error_banner());

    view! {
        <form class="mb-4" on:submit=on_submit>
            <div class="mb-3">
                <label class="form-label">"Title"</label>
                <input
                    class="form-control"
                    type="text"
                    required
                    prop:value=move || form.with(|f| f.title().to_string())
                    on:input=move |ev| form.update(|f| f.set_title(event_target_value(&ev)))
                />
            </div>
            <div class="mb-3">
                <label class="form-label">"User ID"</label>
                <input
                    class="form-control"
                    type="number"
                    required
                    prop:value=move || form.with(|f| f.user_id().to_string())
                    on:input=move |ev| form.update(|f| f.set_user_id(event_target_value(&ev)))
                />
            </div>
            <div class="mb-3">
                <label class="form-label">"Body"</label>
                <textarea
                    class="form-control"
                    required
                    prop:value=move || form.with(|f| f.body().to_string())
                    on:input=move |ev| form.update(|f| f.set_body(event_target_value(&ev)))
                />
            </div>
            <button
                class="btn btn-primary"
                type="submit"
                disabled=move || form.with(|f| f.is_submitting())
            >
                {move || form.with(|f| f.submit_label())}
            </button>
            {move || {
                success_banner()
                    .map(|message| view! { <div class="alert alert-success mt-3">{message}</div> })
            }}
            {move || {
                error_banner()
                    .map(|message| view! { <div class="alert alert-danger mt-3">{message}</div> })
            }}
        </form>
    }
}
