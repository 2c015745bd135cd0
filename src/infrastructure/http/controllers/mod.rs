pub mod health;
pub mod import_locks;
