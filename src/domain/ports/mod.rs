pub mod import_lock_repository;
pub mod time_service;
