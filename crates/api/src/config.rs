use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `600`; generation runs long).
    pub request_timeout_secs: u64,
    /// Root directory holding rosters, letter scripts and artifact dirs.
    pub data_root: PathBuf,
    /// Interpreter used for the letter scripts (default: `python3`).
    pub script_interpreter: String,
    /// Program used for the roster analyzer helper (default: `python3`).
    pub analyzer_program: String,
    /// Roster analyzer script path.
    pub analyzer_script: PathBuf,
    /// Display name used as the email sender identity.
    pub sender_name: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                          |
    /// |------------------------|----------------------------------|
    /// | `HOST`                 | `0.0.0.0`                        |
    /// | `PORT`                 | `3000`                           |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`          |
    /// | `REQUEST_TIMEOUT_SECS` | `600`                            |
    /// | `DATA_ROOT`            | `./data`                         |
    /// | `SCRIPT_INTERPRETER`   | `python3`                        |
    /// | `ANALYZER_PROGRAM`     | `python3`                        |
    /// | `ANALYZER_SCRIPT`      | `<DATA_ROOT>/roster_analyzer.py` |
    /// | `SENDER_NAME`          | `NICL Collections`               |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let data_root =
            PathBuf::from(std::env::var("DATA_ROOT").unwrap_or_else(|_| "./data".into()));

        let script_interpreter =
            std::env::var("SCRIPT_INTERPRETER").unwrap_or_else(|_| "python3".into());

        let analyzer_program =
            std::env::var("ANALYZER_PROGRAM").unwrap_or_else(|_| "python3".into());

        let analyzer_script = std::env::var("ANALYZER_SCRIPT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_root.join("roster_analyzer.py"));

        let sender_name =
            std::env::var("SENDER_NAME").unwrap_or_else(|_| "NICL Collections".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            data_root,
            script_interpreter,
            analyzer_program,
            analyzer_script,
            sender_name,
        }
    }
}
