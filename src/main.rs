mod config;
mod db;
mod error;
mod exchange;
mod generate;
mod ipc;
mod logging;
mod lookup;
mod model;
mod reconcile;
mod seed;
mod sheet;
mod stats;
mod store;

use std::io::{self, BufRead, Write};

fn main() {
    let _ = dotenvy::dotenv();
    logging::init_tracing();
    let config = config::Config::from_env();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "rosterd starting");

    let mut state = ipc::AppState::new(config);
    if let Some(path) = state.config.workspace.clone() {
        match db::open_db(&path, state.config.schedule_startup) {
            Ok(conn) => {
                tracing::info!(workspace = %path.display(), "workspace opened from environment");
                state.workspace = Some(path);
                state.db = Some(conn);
            }
            // Stay up; the client can still pick a workspace.
            Err(e) => tracing::error!(workspace = %path.display(), error = ?e, "workspace open failed"),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                tracing::error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            Err(e) => {
                tracing::warn!(error = %e, "unparseable request line");
                ipc::err("", "bad_json", e.to_string(), None)
            }
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
    tracing::info!("stdin closed, shutting down");
}
