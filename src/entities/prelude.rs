pub use super::algorithm_contents::Entity as AlgorithmContents;
pub use super::algorithms::Entity as Algorithms;
pub use super::projects::Entity as Projects;
pub use super::uploaded_files::Entity as UploadedFiles;
