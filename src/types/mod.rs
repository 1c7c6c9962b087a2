pub mod addon;
pub mod project;
