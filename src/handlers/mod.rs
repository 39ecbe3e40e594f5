pub mod health;
pub mod todos;

pub use health::{health_handler, root_handler};
pub use todos::{create_handler, delete_handler, update_handler};
