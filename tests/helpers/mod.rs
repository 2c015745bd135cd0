#![allow(dead_code, unused_imports)]
pub mod clock;
pub mod test_db;

pub use clock::*;
pub use test_db::*;
