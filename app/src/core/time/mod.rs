pub mod builder;
mod duration;

pub use duration::Duration;
