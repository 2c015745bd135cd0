pub mod import_lock_service;
pub mod import_workflow;

pub use import_lock_service::ImportLockService;
pub use import_workflow::ImportRun;
