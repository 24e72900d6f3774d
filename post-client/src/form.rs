//! Состояние формы создания/редактирования поста.
//!
//! Режим формы определяется только тем, передан ли ей пост: без поста форма
//! создаёт новый, с постом делает полное обновление по его `id`.
//! Жизненный цикл одной отправки:
//! `Idle -> InFlight -> Succeeded` (баннер 1 с, затем сброс выбора)
//! или `Idle -> InFlight -> Failed` (баннер с ошибкой, поля не трогаются).

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::{PostClientError, PostClientResult};
use crate::models::{Post, PostDraft, Submission};

/// Сколько показывается баннер успеха.
pub const SUCCESS_BANNER_DURATION: Duration = Duration::from_secs(1);
/// Через сколько после успеха вызывающему сообщают сбросить выбранный пост.
pub const RESET_SELECTION_DELAY: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Режим формы.
pub enum FormMode {
    /// Создание нового поста.
    Create,
    /// Обновление поста с данным `id`.
    Update {
        /// Идентификатор редактируемого поста.
        id: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Состояние последней отправки формы.
pub enum SubmitState {
    /// Ничего не отправлялось.
    Idle,
    /// Мутация в полёте, кнопка заблокирована.
    InFlight {
        /// Режим, в котором ушла отправка.
        mode: FormMode,
    },
    /// Мутация прошла успешно.
    Succeeded {
        /// Режим, в котором прошла отправка.
        mode: FormMode,
        /// Момент успеха.
        at: DateTime<Utc>,
    },
    /// Мутация или проверка полей завершилась ошибкой.
    Failed {
        /// Текст ошибки для баннера.
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Редактируемые поля формы и состояние отправки.
pub struct PostForm {
    post: Option<Post>,
    title: String,
    body: String,
    user_id: String,
    state: SubmitState,
}

impl Default for PostForm {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PostForm {
    /// Создаёт форму; поля заполняются из поста, если он передан.
    pub fn new(post: Option<Post>) -> Self {
        let mut form = Self {
            post: None,
            title: String::new(),
            body: String::new(),
            user_id: String::new(),
            state: SubmitState::Idle,
        };
        form.set_post(post);
        form
    }

    /// Меняет редактируемый пост и сбрасывает поля под него.
    pub fn set_post(&mut self, post: Option<Post>) {
        match &post {
            Some(post) => {
                self.title = post.title.clone();
                self.body = post.body.clone();
                self.user_id = post.user_id.to_string();
            }
            None => self.clear_fields(),
        }
        self.post = post;
    }

    /// Текущий режим формы.
    pub fn mode(&self) -> FormMode {
        match &self.post {
            Some(post) => FormMode::Update { id: post.id },
            None => FormMode::Create,
        }
    }

    /// Заголовок.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Текст.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Идентификатор автора в том виде, в каком его ввели.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Меняет заголовок.
    pub fn set_title(&mut self, value: impl Into<String>) {
        self.title = value.into();
    }

    /// Меняет текст.
    pub fn set_body(&mut self, value: impl Into<String>) {
        self.body = value.into();
    }

    /// Меняет идентификатор автора.
    pub fn set_user_id(&mut self, value: impl Into<String>) {
        self.user_id = value.into();
    }

    /// Состояние последней отправки.
    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Идёт ли сейчас отправка.
    pub fn is_submitting(&self) -> bool {
        matches!(self.state, SubmitState::InFlight { .. })
    }

    /// Подпись кнопки отправки.
    pub fn submit_label(&self) -> &'static str {
        match (self.mode(), self.is_submitting()) {
            (FormMode::Create, false) => "Add Post",
            (FormMode::Create, true) => "Adding...",
            (FormMode::Update { .. }, false) => "Update Post",
            (FormMode::Update { .. }, true) => "Updating...",
        }
    }

    /// Собирает черновик поста из текущих полей.
    pub fn draft(&self) -> PostClientResult<PostDraft> {
        if self.title.trim().is_empty() {
            return Err(PostClientError::InvalidInput("title is required".to_string()));
        }
        if self.body.trim().is_empty() {
            return Err(PostClientError::InvalidInput("body is required".to_string()));
        }
        let user_id = self.user_id.trim().parse::<i64>().map_err(|_| {
            PostClientError::InvalidInput("userId must be an integer".to_string())
        })?;

        Ok(PostDraft {
            id: self.post.as_ref().map(|post| post.id),
            user_id,
            title: self.title.clone(),
            body: self.body.clone(),
        })
    }

    /// Начинает отправку: проверяет поля и переводит форму в `InFlight`.
    ///
    /// Ошибка проверки сразу показывается в баннере и до сети не доходит.
    pub fn begin_submit(&mut self) -> PostClientResult<Submission> {
        if self.is_submitting() {
            return Err(PostClientError::SubmitInFlight);
        }

        match self.draft() {
            Ok(draft) => {
                self.state = SubmitState::InFlight { mode: self.mode() };
                Ok(draft.into_submission())
            }
            Err(err) => {
                self.state = SubmitState::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Отмечает успешную мутацию и очищает поля.
    pub fn succeed(&mut self, now: DateTime<Utc>) {
        let mode = match self.state {
            SubmitState::InFlight { mode } => mode,
            _ => self.mode(),
        };
        self.state = SubmitState::Succeeded { mode, at: now };
        self.clear_fields();
    }

    /// Отмечает неудачную мутацию. Поля остаются для повторной попытки.
    pub fn fail(&mut self, message: impl Into<String>) {
        self.state = SubmitState::Failed {
            message: message.into(),
        };
    }

    /// Текст баннера успеха, пока он должен быть виден.
    pub fn success_banner_at(&self, now: DateTime<Utc>) -> Option<String> {
        let SubmitState::Succeeded { mode, at } = &self.state else {
            return None;
        };
        if elapsed(*at, now) >= SUCCESS_BANNER_DURATION {
            return None;
        }
        let verb = match mode {
            FormMode::Create => "created",
            FormMode::Update { .. } => "updated",
        };
        Some(format!("Post successfully {verb}"))
    }

    /// Текст баннера ошибки.
    pub fn error_banner(&self) -> Option<String> {
        match &self.state {
            SubmitState::Failed { message } => Some(format!("An error occurred: {message}")),
            _ => None,
        }
    }

    /// Пора ли сообщить вызывающему, что выбранный пост нужно сбросить.
    pub fn selection_reset_due_at(&self, now: DateTime<Utc>) -> bool {
        match &self.state {
            SubmitState::Succeeded { at, .. } => elapsed(*at, now) >= RESET_SELECTION_DELAY,
            _ => false,
        }
    }

    fn clear_fields(&mut self) {
        self.title.clear();
        self.body.clear();
        self.user_id.clear();
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}
