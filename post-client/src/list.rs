use crate::cache::QueryState;
use crate::models::Post;

/// Текст баннера, который заменяет список при ошибке загрузки.
pub const FETCH_ERROR_BANNER: &str = "Error fetching data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Что должен показать список постов.
pub enum ListView<'a> {
    /// Данных ещё нет, идёт загрузка (спиннер).
    Loading,
    /// Последняя загрузка упала (баннер вместо списка).
    Failed(&'a str),
    /// Карточки постов с кнопками Edit и Delete.
    Ready(&'a [Post]),
}

impl<'a> ListView<'a> {
    /// Выводит вид из снимка запроса. Ошибка важнее закэшированных данных.
    pub fn from_state(state: &'a QueryState<Vec<Post>>) -> Self {
        if let Some(error) = state.error.as_deref() {
            return Self::Failed(error);
        }
        match state.data.as_deref() {
            Some(posts) => Self::Ready(posts),
            None => Self::Loading,
        }
    }

    /// Сколько карточек будет отрисовано.
    pub fn rendered_count(&self) -> usize {
        match self {
            Self::Ready(posts) => posts.len(),
            _ => 0,
        }
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
    fn empty_state_is_loading() {
        let state = QueryState::default();
        assert_eq!(ListView::from_state(&state), ListView::Loading);
    }

    #[test]
    fn data_renders_every_post() {
        let state = QueryState {
            data: Some(vec![sample_post(1), sample_post(2)]),
            ..QueryState::default()
        };
        let view = ListView::from_state(&state);
        assert_eq!(view.rendered_count(), 2);
    }

    #[test]
    fn error_wins_over_cached_data() {
        let state = QueryState {
            data: Some(vec![sample_post(1)]),
            error: Some("failed to fetch posts: http status 500".to_string()),
            ..QueryState::default()
        };
        let view = ListView::from_state(&state);
        assert!(matches!(view, ListView::Failed(_)));
        assert_eq!(view.rendered_count(), 0);
    }
}
