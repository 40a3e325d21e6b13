pub mod algorithm;
pub mod content;
pub mod file;
pub mod project;
