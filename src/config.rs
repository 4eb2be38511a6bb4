use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// ClientConfig
///
/// Holds the client's entire configuration state. Loaded once at startup and
/// handed to every component by value, so nothing reads the environment after boot.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    // Base URL of the events API (no trailing slash).
    pub api_base_url: String,
    // File that holds the persisted session token.
    pub token_store_path: PathBuf,
    // Upper bound on how long a navigation waits for hydration. `None` waits forever.
    pub hydration_timeout: Option<Duration>,
    // Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
    // Runtime environment marker. Selects log format and fail-fast behaviour.
    pub env: Env,
}

/// Env
///
/// Runtime context. Local gets permissive defaults, Production demands explicit values.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TOKEN_STORE_PATH: &str = ".eventboard/token";
const DEFAULT_HYDRATION_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 15_000;

impl Default for ClientConfig {
    /// Safe, non-panicking values for tests and local scaffolding.
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            token_store_path: PathBuf::from(DEFAULT_TOKEN_STORE_PATH),
            hydration_timeout: Some(Duration::from_millis(DEFAULT_HYDRATION_TIMEOUT_MS)),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
            env: Env::Local,
        }
    }
}

impl ClientConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in `Env::Production` when `API_BASE_URL` or `TOKEN_STORE_PATH`
    /// is missing, so a misconfigured deployment never starts against localhost.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let (api_base_url, token_store_path) = match env {
            Env::Production => (
                env::var("API_BASE_URL").expect("FATAL: API_BASE_URL required in prod"),
                env::var("TOKEN_STORE_PATH").expect("FATAL: TOKEN_STORE_PATH required in prod"),
            ),
            Env::Local => (
                env::var("API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_BASE_URL.to_string()),
                env::var("TOKEN_STORE_PATH")
                    .unwrap_or_else(|_| DEFAULT_TOKEN_STORE_PATH.to_string()),
            ),
        };

        // A zero timeout turns the bound off entirely.
        let hydration_ms = millis_var("HYDRATION_TIMEOUT_MS", DEFAULT_HYDRATION_TIMEOUT_MS);
        let hydration_timeout = (hydration_ms > 0).then(|| Duration::from_millis(hydration_ms));

        Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            token_store_path: PathBuf::from(token_store_path),
            hydration_timeout,
            request_timeout: Duration::from_millis(millis_var(
                "REQUEST_TIMEOUT_MS",
                DEFAULT_REQUEST_TIMEOUT_MS,
            )),
            env,
        }
    }
}

fn millis_var(name: &str, default: u64) -> u64 {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(var = name, value = %raw, "ignoring unparsable duration, using default");
            default
        }),
        Err(_) => default,
    }
}
