pub mod lock_sweeper;

pub use lock_sweeper::LockSweeper;
