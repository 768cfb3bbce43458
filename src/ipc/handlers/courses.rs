use crate::courses::CourseListError;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_opt_str, get_required_index, get_required_str, HandlerErr};
use crate::ipc::types::{AppState, Request};
use serde_json::json;

impl From<CourseListError> for HandlerErr {
    fn from(e: CourseListError) -> Self {
        let code = match e {
            CourseListError::IndexOutOfRange { .. } => "bad_params",
            CourseListError::LastEntry => "last_course",
        };
        HandlerErr::new(code, e.to_string())
    }
}

fn courses_json(state: &AppState) -> serde_json::Value {
    json!(state.courses.entries())
}

fn add(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_opt_str(params, "name")?.unwrap_or_default();
    let index = state.courses.add(name);
    state.activity.info("Added new course entry field");
    Ok(json!({ "index": index, "courses": courses_json(state) }))
}

fn update(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params, "index")?;
    let name = get_required_str(params, "name")?;
    state.courses.update(index, name)?;
    Ok(json!({ "courses": courses_json(state) }))
}

fn remove(state: &mut AppState, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let index = get_required_index(params, "index")?;
    match state.courses.remove(index) {
        Ok(_) => {
            state.activity.info("Removed course entry field");
            Ok(json!({ "courses": courses_json(state) }))
        }
        Err(CourseListError::LastEntry) => {
            state.activity.warning("Attempted to remove last course entry");
            Err(CourseListError::LastEntry.into())
        }
        Err(e) => Err(e.into()),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let res = match req.method.as_str() {
        "courses.list" => Ok(json!({ "courses": courses_json(state) })),
        "courses.add" => add(state, &req.params),
        "courses.update" => update(state, &req.params),
        "courses.remove" => remove(state, &req.params),
        _ => return None,
    };
    Some(match res {
        Ok(v) => ok(&req.id, v),
        Err(e) => e.response(&req.id),
    })
}
