use std::{net::SocketAddr, str::FromStr, time::Duration};

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    pub api_key: Option<String>,
    pub daily_limit: i32,
    pub hourly_limit: Option<i32>,
    pub sync_interval: Duration,
    pub batch_pacing: Duration,
    pub broadcast_interval: Duration,
    pub max_subscribers: usize,
    pub call_log_retention_days: i64,
    pub cache_enabled: bool,
}

/// Reads `key` and parses it, falling back to `default` when the variable is
/// missing or malformed.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

fn env_opt<T: FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring invalid {}={:?}", key, raw);
            None
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default_addr = SocketAddr::from(([0, 0, 0, 0], 8080));
        let listen_addr = env_or("SP_LISTEN_ADDR", default_addr);
        let db_path =
            std::env::var("SP_DB_PATH").unwrap_or_else(|_| "./data/stockpulse.db".into());
        let cors_allow = std::env::var("SP_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_or("SP_REQUEST_TIMEOUT_MS", 30_000);
        let api_key = std::env::var("ALPHA_VANTAGE_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            api_key,
            daily_limit: env_or("SP_DAILY_LIMIT", 25),
            hourly_limit: env_opt("SP_HOURLY_LIMIT"),
            sync_interval: Duration::from_secs(env_or("SP_SYNC_INTERVAL_SECS", 3600u64).max(1)),
            batch_pacing: Duration::from_millis(env_or("SP_BATCH_PACING_MS", 1000)),
            broadcast_interval: Duration::from_secs(
                env_or("SP_BROADCAST_INTERVAL_SECS", 5u64).max(1),
            ),
            max_subscribers: env_or("SP_MAX_SUBSCRIBERS", 3),
            call_log_retention_days: env_or("SP_CALL_LOG_RETENTION_DAYS", 30),
            cache_enabled: env_or("SP_CACHE_ENABLED", true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let value = tracing::subscriber::with_default(subscriber, f);
        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        (value, logs)
    }

    #[test]
    fn test_invalid_value_falls_back_and_is_logged() {
        std::env::set_var("SP_TEST_CONFIG_LIMIT", "lots");

        let (value, logs) = with_captured_logs(|| env_or("SP_TEST_CONFIG_LIMIT", 25_i32));

        assert_eq!(value, 25);
        assert!(logs.contains("WARN"));
        assert!(logs.contains("SP_TEST_CONFIG_LIMIT"));
        std::env::remove_var("SP_TEST_CONFIG_LIMIT");
    }

    #[test]
    fn test_blank_optional_value_is_unset_without_warning() {
        std::env::set_var("SP_TEST_CONFIG_HOURLY", "  ");

        let (value, logs) = with_captured_logs(|| env_opt::<i32>("SP_TEST_CONFIG_HOURLY"));

        assert_eq!(value, None);
        assert!(logs.is_empty());
        std::env::remove_var("SP_TEST_CONFIG_HOURLY");
    }
}
