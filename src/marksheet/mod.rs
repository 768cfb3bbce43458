//! Marksheet template generation: the grading catalog, the per-subject
//! sheet layout, and rendering to xlsx.

pub mod activity;
pub mod builder;
pub mod catalog;
pub mod error;
pub mod layout;
pub mod sanitize;
pub mod writer;

pub use activity::{ActivityLog, FileActivityLog, TracingLog};
pub use builder::{MarksheetRequest, TemplateBuilder};
pub use error::MarksheetError;
pub use writer::save;
