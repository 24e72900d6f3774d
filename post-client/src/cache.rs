//! Клиентский кэш запросов.
//!
//! Записи адресуются строковым ключом (`"posts"` для коллекции постов).
//! Запись свежая в течение `stale_time` после последней записи данных и
//! удаляется сборщиком через `gc_time` после того, как у неё не осталось
//! наблюдателей. Все методы с суффиксом `_at` принимают текущее время явно;
//! обёртки без суффикса берут `Utc::now()`.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Ключ коллекции постов.
pub const POSTS_KEY: &str = "posts";

/// Окно свежести по умолчанию.
pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(5 * 60);
/// Время удержания неиспользуемой записи по умолчанию.
pub const DEFAULT_GC_TIME: Duration = Duration::from_secs(15 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Параметры свежести и удержания записей.
pub struct CacheOptions {
    /// Сколько данные считаются свежими после записи.
    pub stale_time: Duration,
    /// Сколько живёт запись без наблюдателей.
    pub gc_time: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_time: DEFAULT_STALE_TIME,
            gc_time: DEFAULT_GC_TIME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Снимок состояния одного запроса.
pub struct QueryState<T> {
    /// Последние успешно полученные (или пропатченные) данные.
    pub data: Option<T>,
    /// Сообщение последней неудачной загрузки.
    pub error: Option<String>,
    /// Идёт ли сейчас загрузка.
    pub is_fetching: bool,
    /// Когда данные записывались в последний раз.
    pub data_updated_at: Option<DateTime<Utc>>,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            is_fetching: false,
            data_updated_at: None,
        }
    }
}

#[derive(Debug)]
struct CacheEntry<T> {
    data: Option<T>,
    data_updated_at: Option<DateTime<Utc>>,
    error: Option<String>,
    fetching: bool,
    invalidated: bool,
    observers: usize,
    unused_since: Option<DateTime<Utc>>,
}

impl<T> CacheEntry<T> {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            data: None,
            data_updated_at: None,
            error: None,
            fetching: false,
            invalidated: false,
            observers: 0,
            unused_since: Some(now),
        }
    }
}

fn elapsed(since: DateTime<Utc>, now: DateTime<Utc>) -> Duration {
    (now - since).to_std().unwrap_or(Duration::ZERO)
}

#[derive(Debug)]
/// Кэш запросов со свежестью, наблюдателями и сборкой мусора.
pub struct QueryCache<T> {
    options: CacheOptions,
    entries: HashMap<String, CacheEntry<T>>,
}

impl<T> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<T> QueryCache<T> {
    /// Создаёт пустой кэш.
    pub fn new(options: CacheOptions) -> Self {
        Self {
            options,
            entries: HashMap::new(),
        }
    }

    /// Параметры кэша.
    pub fn options(&self) -> CacheOptions {
        self.options
    }

    /// Количество записей.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Пуст ли кэш.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Есть ли запись с таким ключом.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn entry_mut(&mut self, key: &str, now: DateTime<Utc>) -> &mut CacheEntry<T> {
        self.entries
            .entry(key.to_string())
            .or_insert_with(|| CacheEntry::new(now))
    }

    /// Данные записи независимо от свежести.
    pub fn data(&self, key: &str) -> Option<&T> {
        self.entries.get(key).and_then(|entry| entry.data.as_ref())
    }

    /// Снимок состояния запроса.
    pub fn state(&self, key: &str) -> QueryState<T>
    where
        T: Clone,
    {
        match self.entries.get(key) {
            Some(entry) => QueryState {
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_fetching: entry.fetching,
                data_updated_at: entry.data_updated_at,
            },
            None => QueryState::default(),
        }
    }

    /// Устарели ли данные к моменту `now`. Отсутствующие данные всегда устаревшие.
    pub fn is_stale_at(&self, key: &str, now: DateTime<Utc>) -> bool {
        let Some(entry) = self.entries.get(key) else {
            return true;
        };
        if entry.invalidated || entry.data.is_none() {
            return true;
        }
        match entry.data_updated_at {
            Some(updated_at) => elapsed(updated_at, now) >= self.options.stale_time,
            None => true,
        }
    }

    /// Устарели ли данные сейчас.
    pub fn is_stale(&self, key: &str) -> bool {
        self.is_stale_at(key, Utc::now())
    }

    /// Данные, если они ещё свежие.
    pub fn fresh_data_at(&self, key: &str, now: DateTime<Utc>) -> Option<&T> {
        if self.is_stale_at(key, now) {
            return None;
        }
        self.data(key)
    }

    /// Записывает данные, сбрасывает ошибку и отметку инвалидации.
    pub fn set_data_at(&mut self, key: &str, data: T, now: DateTime<Utc>) {
        let entry = self.entry_mut(key, now);
        entry.data = Some(data);
        entry.data_updated_at = Some(now);
        entry.error = None;
        entry.fetching = false;
        entry.invalidated = false;
    }

    /// Записывает данные с текущим временем.
    pub fn set_data(&mut self, key: &str, data: T) {
        self.set_data_at(key, data, Utc::now());
    }

    /// Патчит данные на месте. Без данных ничего не делает и возвращает `None`.
    pub fn update_data_at<R>(
        &mut self,
        key: &str,
        now: DateTime<Utc>,
        update: impl FnOnce(&mut T) -> R,
    ) -> Option<R> {
        let entry = self.entries.get_mut(key)?;
        let data = entry.data.as_mut()?;
        let result = update(data);
        entry.data_updated_at = Some(now);
        entry.error = None;
        entry.invalidated = false;
        Some(result)
    }

    /// Патчит данные с текущим временем.
    pub fn update_data<R>(&mut self, key: &str, update: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.update_data_at(key, Utc::now(), update)
    }

    /// Отмечает начало загрузки.
    pub fn begin_fetch_at(&mut self, key: &str, now: DateTime<Utc>) {
        self.entry_mut(key, now).fetching = true;
    }

    /// Отмечает неудачную загрузку. Данные, если были, сохраняются.
    pub fn fail_fetch_at(&mut self, key: &str, message: impl Into<String>, now: DateTime<Utc>) {
        let entry = self.entry_mut(key, now);
        entry.error = Some(message.into());
        entry.fetching = false;
    }

    /// Помечает данные устаревшими, не удаляя их.
    pub fn invalidate(&mut self, key: &str) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.invalidated = true;
        }
    }

    /// Удаляет запись целиком.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Регистрирует наблюдателя; возвращает их новое количество.
    pub fn add_observer_at(&mut self, key: &str, now: DateTime<Utc>) -> usize {
        let entry = self.entry_mut(key, now);
        entry.observers += 1;
        entry.unused_since = None;
        entry.observers
    }

    /// Снимает наблюдателя; последний снятый запускает отсчёт удержания.
    pub fn remove_observer_at(&mut self, key: &str, now: DateTime<Utc>) -> usize {
        let Some(entry) = self.entries.get_mut(key) else {
            return 0;
        };
        entry.observers = entry.observers.saturating_sub(1);
        if entry.observers == 0 && entry.unused_since.is_none() {
            entry.unused_since = Some(now);
        }
        entry.observers
    }

    /// Количество наблюдателей записи.
    pub fn observer_count(&self, key: &str) -> usize {
        self.entries.get(key).map_or(0, |entry| entry.observers)
    }

    /// Идёт ли сейчас загрузка записи.
    pub fn is_fetching(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|entry| entry.fetching)
    }

    /// С какого момента у записи нет наблюдателей.
    pub fn unused_since(&self, key: &str) -> Option<DateTime<Utc>> {
        self.entries
            .get(key)
            .filter(|entry| entry.observers == 0)
            .and_then(|entry| entry.unused_since)
    }

    /// Удаляет записи без наблюдателей, простоявшие дольше `gc_time`.
    pub fn collect_garbage_at(&mut self, now: DateTime<Utc>) -> usize {
        let gc_time = self.options.gc_time;
        let before = self.entries.len();
        self.entries.retain(|_, entry| match entry.unused_since {
            Some(since) if entry.observers == 0 => elapsed(since, now) < gc_time,
            _ => true,
        });
        before - self.entries.len()
    }
}
