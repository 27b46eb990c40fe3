pub mod models;
pub mod prelude;
