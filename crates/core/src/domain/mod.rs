pub mod comments;
pub mod display;
pub mod stats;
