use std::path::PathBuf;

use serde::Deserialize;

use crate::config::GeneratorConfig;
use crate::courses::CourseList;
use crate::marksheet::{ActivityLog, TracingLog};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub config: GeneratorConfig,
    pub courses: CourseList,
    /// Swapped for the workspace log file once a workspace is selected.
    pub activity: Box<dyn ActivityLog>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            config: GeneratorConfig::default(),
            courses: CourseList::default(),
            activity: Box::new(TracingLog),
        }
    }
}
