mod core;
pub mod model;

pub use self::core::{Job, JobBuilder};
pub use model::{JobSpec, KEY_SEPARATOR};
