pub mod plan;
pub mod screen;
