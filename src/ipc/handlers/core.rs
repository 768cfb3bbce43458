use crate::config;
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::get_required_str;
use crate::ipc::types::{AppState, Request};
use crate::marksheet::FileActivityLog;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match get_required_str(&req.params, "path") {
        Ok(v) => PathBuf::from(v),
        Err(e) => return e.response(&req.id),
    };

    if let Err(e) = std::fs::create_dir_all(&path) {
        return err(&req.id, "workspace_invalid", e.to_string(), None);
    }
    let cfg = match config::load(&path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "config_invalid", format!("{e:#}"), None),
    };

    let log_path = cfg.log_path(&path);
    let activity = match FileActivityLog::open(&log_path) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "workspace_invalid",
                format!("cannot open activity log {}: {}", log_path.display(), e),
                None,
            )
        }
    };
    state.activity = Box::new(activity);
    state
        .activity
        .info(&format!("Workspace selected: {}", path.to_string_lossy()));
    tracing::info!(workspace = %path.display(), "workspace selected");

    let cfg_json = serde_json::to_value(&cfg).unwrap_or_else(|_| json!({}));
    state.config = cfg;
    state.workspace = Some(path.clone());
    ok(
        &req.id,
        json!({ "workspacePath": path.to_string_lossy(), "config": cfg_json }),
    )
}

fn handle_config_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    match serde_json::to_value(&state.config) {
        Ok(v) => ok(&req.id, v),
        Err(e) => err(&req.id, "internal", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "config.get" => Some(handle_config_get(state, req)),
        _ => None,
    }
}
