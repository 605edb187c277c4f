pub mod builtin;
pub mod loader;
pub mod matcher;
pub mod model;
