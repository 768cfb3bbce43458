use crate::courses::clean_subjects;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_opt_string_list, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::marksheet::{self, ActivityLog, MarksheetError, MarksheetRequest, TemplateBuilder};
use serde_json::json;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Explicit `outputDir` wins; relative values resolve against the workspace
/// when there is one. Otherwise the configured workspace output directory.
fn resolve_output_dir(state: &AppState, params: &serde_json::Value) -> Result<PathBuf, HandlerErr> {
    if let Some(dir) = get_opt_str(params, "outputDir")?.filter(|s| !s.trim().is_empty()) {
        let dir = PathBuf::from(dir);
        return Ok(match &state.workspace {
            Some(ws) if dir.is_relative() => ws.join(dir),
            _ => dir,
        });
    }
    match &state.workspace {
        Some(ws) => Ok(state.config.output_dir(ws)),
        None => Err(HandlerErr::new(
            "no_workspace",
            "select a workspace or pass outputDir",
        )),
    }
}

/// Reads the request, falling back to `fallback` when `subjects` is absent.
fn request_from_params(
    params: &serde_json::Value,
    fallback: impl FnOnce() -> Vec<String>,
) -> Result<MarksheetRequest, HandlerErr> {
    let subjects = match get_opt_string_list(params, "subjects")? {
        Some(raw) => clean_subjects(&raw),
        None => fallback(),
    };
    Ok(MarksheetRequest {
        subjects,
        student_name: get_opt_str(params, "studentName")?,
        student_id: get_opt_str(params, "studentId")?,
        semester: get_opt_str(params, "semester")?,
    })
}

fn build_and_save(
    log: &dyn ActivityLog,
    request: &MarksheetRequest,
    path: &Path,
) -> Result<serde_json::Value, HandlerErr> {
    let build_id = Uuid::new_v4().to_string();
    let workbook = TemplateBuilder::new(log).build(request)?;
    match marksheet::save(&workbook, path) {
        Ok(saved) => {
            log.info(&format!(
                "Marksheet template saved as {} (build {})",
                saved.path.to_string_lossy(),
                build_id
            ));
            Ok(json!({
                "buildId": build_id,
                "path": saved.path.to_string_lossy(),
                "fileName": saved.file_name,
                "sheetCount": saved.sheet_count,
                "sheets": workbook.sheet_names(),
                "bytes": saved.bytes,
                "sha256": saved.sha256,
            }))
        }
        Err(e) => {
            log.error(&format!("Error creating marksheet: {}", e));
            Err(e.into())
        }
    }
}

fn generate(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let log = &*state.activity;
    let request = request_from_params(params, || state.courses.subjects())?;

    if request.subjects.is_empty() {
        log.error("No courses provided");
        return Err(MarksheetError::Validation("no subjects".to_string()).into());
    }
    let file_name = match request.file_name() {
        Ok(v) => v,
        Err(e) => {
            log.error("Missing student name or semester");
            return Err(e.into());
        }
    };

    let out_dir = resolve_output_dir(state, params)?;
    let result = build_and_save(log, &request, &out_dir.join(file_name))?;
    log.info(&format!(
        "Marksheet generated for {} courses",
        request.subjects.len()
    ));
    Ok(result)
}

/// The non-interactive variant: fixed file name, placeholder identity.
fn template(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let subjects = match get_opt_string_list(params, "subjects")? {
        Some(raw) => clean_subjects(&raw),
        None => state.config.default_subjects.clone(),
    };
    let request = MarksheetRequest::new(subjects);
    let out_dir = resolve_output_dir(state, params)?;
    build_and_save(
        &*state.activity,
        &request,
        &out_dir.join(&state.config.template_file),
    )
}

fn preview(state: &AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let request = request_from_params(params, || state.courses.subjects())?;
    let workbook = TemplateBuilder::new(&*state.activity).build(&request)?;
    serde_json::to_value(&workbook).map_err(|e| HandlerErr::new("internal", e.to_string()))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "marksheet.generate" => generate(state, &req.params),
        "marksheet.template" => template(state, &req.params),
        "marksheet.preview" => preview(state, &req.params),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
