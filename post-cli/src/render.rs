use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use post_client::{FETCH_ERROR_BANNER, ListView, Post, PostClientError, PostForm};

pub fn render_list(view: &ListView<'_>) -> String {
    match view {
        ListView::Loading => "Loading...".to_string(),
        ListView::Failed(_) => format!("[error] {FETCH_ERROR_BANNER}"),
        ListView::Ready(posts) if posts.is_empty() => "Постов нет".to_string(),
        ListView::Ready(posts) => {
            let mut out = format!("Постов: {}\n", posts.len());
            for post in posts.iter() {
                let _ = writeln!(out, "{}", render_card(post));
            }
            out.trim_end().to_string()
        }
    }
}

fn render_card(post: &Post) -> String {
    format!(
        "- [{}] {} (userId={})\n    {}\n    [edit {}] [delete {}]",
        post.id,
        post.title,
        post.user_id,
        post.body.replace('\n', "\n    "),
        post.id,
        post.id
    )
}

pub fn render_post(title: &str, post: &Post) -> String {
    format!(
        "{title}\nid: {}\nuserId: {}\ntitle: {}\nbody: {}",
        post.id, post.user_id, post.title, post.body
    )
}

pub fn render_form(form: &PostForm, now: DateTime<Utc>) -> String {
    let mut out = String::new();
    if let Some(error) = form.error_banner() {
        let _ = writeln!(out, "[error] {error}");
    }
    if let Some(success) = form.success_banner_at(now) {
        let _ = writeln!(out, "[ok] {success}");
    }

    out.push_str("Post Form\n");
    let _ = writeln!(out, "  Title:  {}", form.title());
    let _ = writeln!(out, "  UserID: {}", form.user_id());
    let _ = writeln!(out, "  Body:   {}", form.body());

    let disabled = if form.is_submitting() { " (disabled)" } else { "" };
    let _ = write!(out, "  [{}]{disabled}", form.submit_label());
    out
}

/// Сообщение об ошибке клиента для пользователя.
pub fn describe_error(err: &PostClientError) -> String {
    match err {
        PostClientError::Status { operation, status } => {
            format!("сервер отклонил запрос ({operation}): HTTP {status}")
        }
        PostClientError::Decode { operation, message } => {
            format!("некорректный ответ сервера ({operation}): {message}")
        }
        PostClientError::Encode { operation, message } => {
            format!("не удалось сформировать запрос ({operation}): {message}")
        }
        PostClientError::InvalidInput(message) => format!("некорректные данные: {message}"),
        PostClientError::SubmitInFlight => "предыдущая отправка ещё не завершилась".to_string(),
        PostClientError::Http(err) => format!("ошибка HTTP: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(id: i64) -> Post {
        Post {
            id,
            user_id: 1,
            title: format!("title {id}"),
            body: "body".to_string(),
        }
    }

    #[test]
    fn ready_list_renders_one_card_per_post() {
        let posts = vec![sample_post(1), sample_post(2), sample_post(3)];
        let out = render_list(&ListView::Ready(&posts));
        assert!(out.starts_with("Постов: 3"));
        assert_eq!(out.matches("[edit ").count(), 3);
        assert!(out.contains("[delete 2]"));
    }

    #[test]
    fn failed_list_renders_banner_only() {
        let out = render_list(&ListView::Failed("http status 500"));
        assert_eq!(out, "[error] Error fetching data");
    }

    #[test]
    fn loading_list_renders_spinner_text() {
        assert_eq!(render_list(&ListView::Loading), "Loading...");
    }

    #[test]
    fn form_shows_label_for_mode() {
        let form = PostForm::new(Some(sample_post(7)));
        let out = render_form(&form, Utc::now());
        assert!(out.contains("Title:  title 7"));
        assert!(out.ends_with("[Update Post]"));
    }

    #[test]
    fn in_flight_form_shows_disabled_button() {
        let mut form = PostForm::new(None);
        form.set_user_id("1");
        form.set_title("Hello");
        form.set_body("World");
        form.begin_submit().expect("valid form");

        let out = render_form(&form, Utc::now());
        assert!(out.ends_with("[Adding...] (disabled)"));
    }

    #[test]
    fn status_error_mentions_operation() {
        let err = PostClientError::Status {
            operation: post_client::Operation::DeletePost,
            status: 404,
        };
        assert_eq!(describe_error(&err), "сервер отклонил запрос (delete post): HTTP 404");
    }

    #[test]
    fn encode_error_is_not_blamed_on_user_input() {
        let err = PostClientError::Encode {
            operation: post_client::Operation::CreatePost,
            message: "key must be a string".to_string(),
        };
        assert_eq!(
            describe_error(&err),
            "не удалось сформировать запрос (add post): key must be a string"
        );
    }
}
