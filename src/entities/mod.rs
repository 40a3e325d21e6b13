pub mod prelude;

pub mod algorithm_contents;
pub mod algorithms;
pub mod projects;
pub mod uploaded_files;
