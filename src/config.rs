use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::marksheet::activity::DEFAULT_LOG_FILE;

pub const CONFIG_FILE: &str = "marksheet.config.json";
pub const DEFAULT_TEMPLATE_FILE: &str = "marksheet_template_enhanced.xlsx";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Relative paths resolve against the workspace.
    pub output_dir: Option<PathBuf>,
    pub log_file: String,
    pub template_file: String,
    pub default_subjects: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            log_file: DEFAULT_LOG_FILE.to_string(),
            template_file: DEFAULT_TEMPLATE_FILE.to_string(),
            default_subjects: [
                "Statistical Inferences",
                "Intro to Macroeconomics",
                "Cal-1",
                "Philosophy",
                "Psychology",
                "IST",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

impl GeneratorConfig {
    pub fn output_dir(&self, workspace: &Path) -> PathBuf {
        match &self.output_dir {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => workspace.join(p),
            None => workspace.to_path_buf(),
        }
    }

    pub fn log_path(&self, workspace: &Path) -> PathBuf {
        workspace.join(&self.log_file)
    }
}

/// Reads `marksheet.config.json` from the workspace. A missing file yields
/// the defaults; a malformed one is an error.
pub fn load(workspace: &Path) -> anyhow::Result<GeneratorConfig> {
    let path = workspace.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(GeneratorConfig::default());
    }
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))?;
    let cfg: GeneratorConfig = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.to_string_lossy()))?;
    if cfg.log_file.trim().is_empty() {
        anyhow::bail!("{}: logFile cannot be empty", path.to_string_lossy());
    }
    if cfg.template_file.trim().is_empty() {
        anyhow::bail!("{}: templateFile cannot be empty", path.to_string_lossy());
    }
    Ok(cfg)
}
