pub mod import_lock;

pub use import_lock::*;
