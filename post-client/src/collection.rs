//! Патчи коллекции постов в кэше. Все операции сохраняют уникальность `id`.

use std::collections::HashSet;

use tracing::warn;

use crate::models::Post;

/// Оставляет первое вхождение каждого `id`, порядок сохраняется.
pub fn dedupe_by_id(posts: &mut Vec<Post>) -> usize {
    let before = posts.len();
    let mut seen = HashSet::with_capacity(posts.len());
    posts.retain(|post| seen.insert(post.id));
    let dropped = before - posts.len();
    if dropped > 0 {
        warn!(dropped, "server returned duplicate post ids");
    }
    dropped
}

/// Добавляет созданный пост в конец коллекции.
///
/// Если пост с таким `id` уже есть, он заменяется на месте.
pub fn append_post(posts: &mut Vec<Post>, post: Post) {
    if let Some(existing) = posts.iter_mut().find(|p| p.id == post.id) {
        warn!(id = post.id, "created post id already cached, replacing entry");
        *existing = post;
        return;
    }
    posts.push(post);
}

/// Заменяет пост с тем же `id`. Возвращает `false`, если такого поста нет.
pub fn replace_post(posts: &mut [Post], post: Post) -> bool {
    match posts.iter_mut().find(|p| p.id == post.id) {
        Some(existing) => {
            *existing = post;
            true
        }
        None => false,
    }
}

/// Удаляет пост по `id`. Возвращает `false`, если такого поста нет.
pub fn remove_post(posts: &mut Vec<Post>, id: i64) -> bool {
    let before = posts.len();
    posts.retain(|p| p.id != id);
    posts.len() != before
}

/// Ищет пост по `id`.
pub fn find_post(posts: &[Post], id: i64) -> Option<&Post> {
    posts.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post(id: i64, title: &str) -> Post {
        Post {
            id,
            user_id: 1,
            title: title.to_string(),
            body: "body".to_string(),
        }
    }

    #[test]
    fn dedupe_keeps_first_occurrence() {
        let mut posts = vec![sample_post(1, "a"), sample_post(2, "b"), sample_post(1, "c")];
        assert_eq!(dedupe_by_id(&mut posts), 1);
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].title, "a");
    }

    #[test]
    fn append_adds_new_post_at_the_end() {
        let mut posts = vec![sample_post(1, "a")];
        append_post(&mut posts, sample_post(101, "new"));
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[1].id, 101);
    }

    #[test]
    fn append_with_known_id_replaces_instead_of_duplicating() {
        let mut posts = vec![sample_post(101, "first")];
        append_post(&mut posts, sample_post(101, "second"));
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "second");
    }

    #[test]
    fn replace_keeps_length_and_position() {
        let mut posts = vec![sample_post(1, "a"), sample_post(7, "b"), sample_post(9, "c")];
        assert!(replace_post(&mut posts, sample_post(7, "Updated")));
        assert_eq!(posts.len(), 3);
        assert_eq!(posts[1].title, "Updated");
    }

    #[test]
    fn replace_missing_post_changes_nothing() {
        let mut posts = vec![sample_post(1, "a")];
        assert!(!replace_post(&mut posts, sample_post(2, "b")));
        assert_eq!(posts, vec![sample_post(1, "a")]);
    }

    #[test]
    fn remove_drops_exactly_one_post() {
        let mut posts = vec![sample_post(1, "a"), sample_post(3, "b")];
        assert!(remove_post(&mut posts, 3));
        assert_eq!(posts.len(), 1);
        assert!(find_post(&posts, 3).is_none());
        assert!(!remove_post(&mut posts, 3));
    }
}
