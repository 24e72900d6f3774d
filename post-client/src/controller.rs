//! Компоненты интерфейса без привязки к способу отрисовки.
//!
//! `PostList` и `PostFormController` работают через один `PostsQueryClient`,
//! поэтому мутации формы сразу видны в списке. Связь между ними идёт через
//! колбэки: список сообщает о выбранном посте, форма просит сбросить выбор.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::warn;

use crate::api::PostsApi;
use crate::cache::QueryState;
use crate::collection::find_post;
use crate::error::PostClientResult;
use crate::form::{PostForm, RESET_SELECTION_DELAY};
use crate::models::Post;
use crate::query::{PostsQueryClient, QueryObserver};

/// Колбэк выбора поста для редактирования.
pub type PostCallback = Arc<dyn Fn(Post) + Send + Sync>;
/// Колбэк сброса выбранного поста.
pub type ResetCallback = Arc<dyn Fn() + Send + Sync>;

/// Список постов: загрузка, выбор для редактирования, удаление.
pub struct PostList<A> {
    client: PostsQueryClient<A>,
    on_post_click: PostCallback,
    _observer: QueryObserver,
}

impl<A: PostsApi> PostList<A> {
    /// Монтирует список; пока он жив, коллекция считается наблюдаемой.
    pub fn mount(
        client: PostsQueryClient<A>,
        on_post_click: impl Fn(Post) + Send + Sync + 'static,
    ) -> Self {
        let observer = client.observe_posts();
        Self {
            client,
            on_post_click: Arc::new(on_post_click),
            _observer: observer,
        }
    }

    /// Загружает коллекцию (или берёт свежую из кэша) и возвращает снимок.
    ///
    /// Ошибка загрузки не возвращается отдельно: она лежит в снимке и
    /// отрисовывается баннером.
    pub async fn load(&self) -> QueryState<Vec<Post>> {
        if let Err(err) = self.client.fetch_posts().await {
            warn!(error = %err, "post list failed to load");
        }
        self.view_state()
    }

    /// Query-клиент, через который работает список.
    pub fn client(&self) -> &PostsQueryClient<A> {
        &self.client
    }

    /// Текущий снимок без сетевых запросов.
    pub fn view_state(&self) -> QueryState<Vec<Post>> {
        self.client.posts_state()
    }

    /// Кнопка Edit: передаёт пост вызывающему. `false`, если поста нет в кэше.
    pub fn edit(&self, id: i64) -> bool {
        let selected = self
            .client
            .cached_posts()
            .and_then(|posts| find_post(&posts, id).cloned());
        match selected {
            Some(post) => {
                (self.on_post_click)(post);
                true
            }
            None => false,
        }
    }

    /// Кнопка Delete.
    pub async fn delete(&self, id: i64) -> PostClientResult<()> {
        self.client.delete_post(id).await.inspect_err(|err| {
            warn!(id, error = %err, "delete failed");
        })
    }
}

/// Форма создания/редактирования поверх `PostForm`.
pub struct PostFormController<A> {
    client: PostsQueryClient<A>,
    form: Mutex<PostForm>,
    reset_selected_post: ResetCallback,
}

impl<A: PostsApi> PostFormController<A> {
    /// Создаёт форму для поста (или пустую форму создания).
    pub fn new(
        client: PostsQueryClient<A>,
        post: Option<Post>,
        reset_selected_post: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            client,
            form: Mutex::new(PostForm::new(post)),
            reset_selected_post: Arc::new(reset_selected_post),
        }
    }

    fn form(&self) -> MutexGuard<'_, PostForm> {
        self.form.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Вызывающий сменил выбранный пост.
    pub fn set_post(&self, post: Option<Post>) {
        self.form().set_post(post);
    }

    /// Правка полей формы.
    pub fn edit<R>(&self, edit: impl FnOnce(&mut PostForm) -> R) -> R {
        edit(&mut self.form())
    }

    /// Копия текущего состояния формы для отрисовки.
    pub fn snapshot(&self) -> PostForm {
        self.form().clone()
    }

    /// Submit: создание или обновление в зависимости от режима формы.
    ///
    /// После успеха поля очищаются, а через секунду вызывается колбэк сброса
    /// выбранного поста. При ошибке поля сохраняются.
    pub async fn submit(&self) -> PostClientResult<Post> {
        let submission = self.form().begin_submit()?;

        match self.client.submit(submission).await {
            Ok(post) => {
                self.form().succeed(Utc::now());
                let reset = Arc::clone(&self.reset_selected_post);
                tokio::spawn(async move {
                    tokio::time::sleep(RESET_SELECTION_DELAY).await;
                    reset();
                });
                Ok(post)
            }
            Err(err) => {
                self.form().fail(err.to_string());
                Err(err)
            }
        }
    }
}
