use std::path::PathBuf;

const WORKSPACE_VAR: &str = "GRADEBOOKD_WORKSPACE";
const LOG_VAR: &str = "GRADEBOOKD_LOG";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Workspace opened at startup, same as a `workspace.select` call.
    pub workspace: Option<PathBuf>,
    pub log_filter: String,
}

/// What happened to the `.env` file. Reported by the caller once logging is up.
pub type DotenvOutcome = Result<Option<PathBuf>, dotenvy::Error>;

impl Config {
    pub fn from_env() -> (Self, DotenvOutcome) {
        let dotenv = match dotenvy::dotenv() {
            Ok(path) => Ok(Some(path)),
            Err(e) if e.not_found() => Ok(None),
            Err(e) => Err(e),
        };
        (Self::from_lookup(|key| dotenvy::var(key).ok()), dotenv)
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let workspace = lookup(WORKSPACE_VAR)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let log_filter = lookup(LOG_VAR)
            .or_else(|| lookup("RUST_LOG"))
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
        Self {
            workspace,
            log_filter,
        }
    }
}
