#![forbid(unsafe_code)]

pub mod model;
pub mod reference;
pub mod time;

pub use time::Clock;
