pub mod demo;
pub mod sweep;
