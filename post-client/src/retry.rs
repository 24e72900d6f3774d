use std::time::Duration;

/// Сколько раз повторяется загрузка списка после первой неудачи.
pub const DEFAULT_RETRIES: u32 = 3;
/// Задержка перед первым повтором.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
/// Потолок экспоненциальной задержки.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Экспоненциальный backoff для загрузки списка постов.
///
/// Задержка перед повтором с индексом `n` (с нуля) равна
/// `min(base_delay * 2^n, max_delay)`.
pub struct RetryPolicy {
    /// Количество повторов после первой попытки.
    pub retries: u32,
    /// Базовая задержка.
    pub base_delay: Duration,
    /// Максимальная задержка.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Политика без повторов.
    pub fn none() -> Self {
        Self {
            retries: 0,
            ..Self::default()
        }
    }

    /// Общее число запросов, которое может сделать загрузка.
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Нужно ли повторять после `failures` неудачных попыток подряд.
    pub fn should_retry(&self, failures: u32) -> bool {
        failures <= self.retries && failures > 0
    }

    /// Задержка перед повтором номер `attempt_index` (с нуля).
    pub fn delay_for(&self, attempt_index: u32) -> Duration {
        let factor = 2u32.checked_pow(attempt_index).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}
