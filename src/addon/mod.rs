pub mod descriptor;
pub mod install;
pub mod summary;
