#![forbid(unsafe_code)]

pub mod machine;
pub mod model;
pub mod time;

pub use time::Clock;
