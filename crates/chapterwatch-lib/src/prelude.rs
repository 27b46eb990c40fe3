pub use super::models::*;
