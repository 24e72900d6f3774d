use std::process;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use post_client::{
    HttpClient, ListView, Post, PostClientError, PostFormController, PostList, PostsQueryClient,
};
use tracing::debug;

mod logging;
mod render;
mod settings;
mod shell;

use logging::init_logging;
use render::{describe_error, render_list, render_post};
use settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "post-cli", version, about = "CLI клиент для ресурса /posts")]
struct Cli {
    /// Адрес REST API (по умолчанию POSTS_API_URL или песочница jsonplaceholder).
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Список постов.
    List {
        /// Печатать коллекцию как JSON.
        #[arg(long)]
        json: bool,
    },
    /// Создание поста.
    Create {
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        body: String,
    },
    /// Полное обновление поста.
    ///
    /// Не указанные поля берутся из текущей версии поста.
    Update {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        user_id: Option<i64>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
    },
    /// Удаление поста.
    Delete {
        #[arg(long)]
        id: i64,
    },
    /// Интерактивный режим со списком и формой.
    Shell,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Ошибка: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;
    init_logging(&settings.log_level)?;

    let cli = Cli::parse();
    let config = settings.client_config(cli.server);

    let http = HttpClient::new(config).context("не удалось создать HTTP-клиент")?;
    debug!(base_url = %http.base_url(), "using posts api");
    let client = PostsQueryClient::new(http, settings.cache_options(), settings.retry_policy());

    match cli.command {
        Command::List { json } => {
            let list = PostList::mount(client, |_| {});
            let state = list.load().await;
            let view = ListView::from_state(&state);
            match (json, view) {
                (true, ListView::Ready(posts)) => {
                    let raw = serde_json::to_string_pretty(posts)
                        .context("не удалось сериализовать посты")?;
                    println!("{raw}");
                }
                (_, ListView::Failed(message)) => {
                    println!("{}", render_list(&view));
                    return Err(anyhow!("не удалось загрузить посты: {message}"));
                }
                (_, view) => println!("{}", render_list(&view)),
            }
        }
        Command::Create {
            user_id,
            title,
            body,
        } => {
            let form = PostFormController::new(client, None, || {});
            form.edit(|f| {
                f.set_user_id(user_id.to_string());
                f.set_title(title);
                f.set_body(body);
            });
            let post = form.submit().await.map_err(map_client_error)?;
            println!("{}", render_post("Post successfully created", &post));
        }
        Command::Update {
            id,
            user_id,
            title,
            body,
        } => {
            let selected = Arc::new(Mutex::new(None::<Post>));
            let list = PostList::mount(client.clone(), {
                let selected = Arc::clone(&selected);
                move |post| *selection(&selected) = Some(post)
            });
            let state = list.load().await;
            if let Some(error) = state.error {
                return Err(anyhow!("не удалось загрузить посты: {error}"));
            }
            if !list.edit(id) {
                return Err(anyhow!("пост {id} не найден"));
            }
            let post = selection(&selected).take();

            let form = PostFormController::new(client, post, || {});
            form.edit(|f| {
                if let Some(user_id) = user_id {
                    f.set_user_id(user_id.to_string());
                }
                if let Some(title) = title {
                    f.set_title(title);
                }
                if let Some(body) = body {
                    f.set_body(body);
                }
            });
            let post = form.submit().await.map_err(map_client_error)?;
            println!("{}", render_post("Post successfully updated", &post));
        }
        Command::Delete { id } => {
            let list = PostList::mount(client, |_| {});
            list.load().await;
            list.delete(id).await.map_err(map_client_error)?;
            let state = list.view_state();
            println!(
                "Пост удалён: id={id}, осталось {}",
                ListView::from_state(&state).rendered_count()
            );
        }
        Command::Shell => shell::run_shell(client).await?,
    }

    Ok(())
}

/// Выбор поста из колбэка списка; отравленный мьютекс выбор не теряет.
fn selection(selected: &Mutex<Option<Post>>) -> MutexGuard<'_, Option<Post>> {
    selected.lock().unwrap_or_else(PoisonError::into_inner)
}

fn map_client_error(err: PostClientError) -> anyhow::Error {
    anyhow!(describe_error(&err))
}
