pub mod activity_service;
pub mod context;
pub mod extraction_service;
pub mod import_service;

pub use activity_service::ActivityService;
pub use context::TeacherContext;
pub use extraction_service::ExtractionService;
pub use import_service::{ImportService, ImportStats};
