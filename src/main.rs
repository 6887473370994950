mod attendance;
mod config;
mod db;
mod error;
mod grades;
mod ipc;
mod logging;
mod model;
mod store;
mod students;

use std::io::{self, BufRead, Write};
use tracing::{debug, error, info, warn};

fn main() {
    let (cfg, dotenv) = config::Config::from_env();
    logging::init_logging(&cfg.log_filter);
    match dotenv {
        Ok(Some(path)) => debug!("loaded environment from {}", path.display()),
        Ok(None) => {}
        Err(e) => warn!("could not load .env file: {e}"),
    }
    info!(version = env!("CARGO_PKG_VERSION"), "gradebookd starting");

    let mut state = ipc::AppState::empty();
    if let Some(path) = cfg.workspace.as_deref() {
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            error!(workspace = %path.display(), "failed to open workspace: {e:?}");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let _ = writeln!(stdout, "{}", ipc::bad_json(e.to_string()));
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed, exiting");
}
