//! Интерактивный режим: список и форма живут в одной сессии и делят кэш.

use std::io::Write as _;

use anyhow::{Context, Result};
use chrono::Utc;
use post_client::{ListView, Post, PostFormController, PostList, PostsApi, PostsQueryClient};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::render::{describe_error, render_form, render_list, render_post};

const HELP: &str = "\
Команды:
  list               показать посты (свежий кэш не перезагружается)
  edit <id>          выбрать пост для редактирования
  title <текст>      заголовок в форме
  body <текст>       текст в форме
  user <id>          userId в форме
  form               показать форму
  submit             отправить форму (Add Post / Update Post)
  cancel             сбросить выбранный пост
  delete <id>        удалить пост
  focus | reconnect  перезагрузить устаревший список
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    List,
    Edit(i64),
    Title(String),
    Body(String),
    User(String),
    Form,
    Submit,
    Cancel,
    Delete(i64),
    Focus,
    Reconnect,
    Help,
    Quit,
}

#[derive(Debug)]
enum ShellEvent {
    Selected(Post),
    ResetSelection,
}

fn parse_id(raw: &str) -> Result<i64, String> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| format!("ожидался числовой id, получено `{}`", raw.trim()))
}

fn parse_command(line: &str) -> Result<Option<ShellCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (name, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match name {
        "list" | "ls" => ShellCommand::List,
        "edit" => ShellCommand::Edit(parse_id(rest)?),
        "title" => ShellCommand::Title(rest.to_string()),
        "body" => ShellCommand::Body(rest.to_string()),
        "user" => ShellCommand::User(rest.to_string()),
        "form" => ShellCommand::Form,
        "submit" => ShellCommand::Submit,
        "cancel" => ShellCommand::Cancel,
        "delete" | "rm" => ShellCommand::Delete(parse_id(rest)?),
        "focus" => ShellCommand::Focus,
        "reconnect" => ShellCommand::Reconnect,
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" => ShellCommand::Quit,
        other => return Err(format!("неизвестная команда `{other}`, см. `help`")),
    };
    Ok(Some(command))
}

struct Shell<A> {
    list: PostList<A>,
    form: PostFormController<A>,
    events: mpsc::UnboundedReceiver<ShellEvent>,
}

impl<A: PostsApi> Shell<A> {
    fn new(client: PostsQueryClient<A>) -> Self {
        let (tx, events) = mpsc::unbounded_channel();

        let list = PostList::mount(client.clone(), {
            let tx = tx.clone();
            move |post| {
                let _ = tx.send(ShellEvent::Selected(post));
            }
        });
        let form = PostFormController::new(client, None, move || {
            let _ = tx.send(ShellEvent::ResetSelection);
        });

        Self { list, form, events }
    }

    fn print_list(&self) {
        let state = self.list.view_state();
        println!("{}", render_list(&ListView::from_state(&state)));
    }

    fn print_form(&self) {
        println!("{}", render_form(&self.form.snapshot(), Utc::now()));
    }

    fn handle_event(&self, event: ShellEvent) {
        match event {
            ShellEvent::Selected(post) => {
                self.form.set_post(Some(post));
                self.print_form();
            }
            ShellEvent::ResetSelection => {
                self.form.set_post(None);
                println!("\n(форма вернулась в режим создания)");
            }
        }
    }

    fn report_refetch(&self, refetched: bool) {
        if refetched {
            self.print_list();
        } else {
            println!("список свежий, перезагрузка не нужна");
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.handle_event(event);
        }
    }

    /// `false` — пора выходить.
    async fn execute(&mut self, command: ShellCommand) -> bool {
        match command {
            ShellCommand::List => {
                self.list.load().await;
                self.print_list();
            }
            ShellCommand::Edit(id) => {
                if !self.list.edit(id) {
                    println!("пост {id} не найден в списке");
                }
            }
            ShellCommand::Title(value) => self.form.edit(|f| f.set_title(value)),
            ShellCommand::Body(value) => self.form.edit(|f| f.set_body(value)),
            ShellCommand::User(value) => self.form.edit(|f| f.set_user_id(value)),
            ShellCommand::Form => self.print_form(),
            ShellCommand::Submit => {
                match self.form.submit().await {
                    Ok(post) => println!("{}", render_post("Сервер вернул:", &post)),
                    Err(err) => println!("{}", describe_error(&err)),
                }
                self.print_form();
            }
            ShellCommand::Cancel => {
                self.form.set_post(None);
                self.print_form();
            }
            ShellCommand::Delete(id) => match self.list.delete(id).await {
                Ok(()) => self.print_list(),
                Err(err) => println!("{}", describe_error(&err)),
            },
            ShellCommand::Focus => {
                let refetched = self.list.client().on_focus().await;
                self.report_refetch(refetched.is_some());
            }
            ShellCommand::Reconnect => {
                let refetched = self.list.client().on_reconnect().await;
                self.report_refetch(refetched.is_some());
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => return false,
        }
        self.drain_events();
        true
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

pub async fn run_shell<A: PostsApi>(client: PostsQueryClient<A>) -> Result<()> {
    let mut shell = Shell::new(client);
    println!("{HELP}\n");

    shell.list.load().await;
    shell.print_list();
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = shell.events.recv() => {
                shell.handle_event(event);
                prompt();
            }
            line = lines.next_line() => {
                let Some(line) = line.context("не удалось прочитать stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if !shell.execute(command).await {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(message) => println!("{message}"),
                }
                prompt();
            }
        }
    }

    Ok(())
}
