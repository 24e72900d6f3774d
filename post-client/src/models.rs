use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Пост, которому сервер уже присвоил идентификатор.
pub struct Post {
    /// Идентификатор поста (назначается сервером).
    pub id: i64,
    /// Идентификатор автора.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Заголовок поста.
    pub title: String,
    /// Текст поста.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Payload создания поста: id ещё не существует.
pub struct NewPost {
    /// Идентификатор автора.
    #[serde(rename = "userId")]
    pub user_id: i64,
    /// Заголовок поста.
    pub title: String,
    /// Текст поста.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// То, что собирает форма при отправке.
///
/// `id` есть только если форма редактирует существующий пост.
pub struct PostDraft {
    /// Идентификатор редактируемого поста.
    pub id: Option<i64>,
    /// Идентификатор автора.
    pub user_id: i64,
    /// Заголовок поста.
    pub title: String,
    /// Текст поста.
    pub body: String,
}

impl PostDraft {
    /// Разделяет черновик на payload создания или полного обновления.
    pub fn into_submission(self) -> Submission {
        match self.id {
            Some(id) => Submission::Update(Post {
                id,
                user_id: self.user_id,
                title: self.title,
                body: self.body,
            }),
            None => Submission::Create(NewPost {
                user_id: self.user_id,
                title: self.title,
                body: self.body,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Мутация, которую нужно отправить на сервер после submit формы.
pub enum Submission {
    /// `POST /posts`.
    Create(NewPost),
    /// `PUT /posts/{id}`.
    Update(Post),
}
