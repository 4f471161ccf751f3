pub mod config;
pub mod db;
pub mod error;
pub mod lesson;
pub mod logging;
pub mod service;
pub mod store;

pub use error::LessonError;
pub use service::{LessonService, SubmitResult};
pub use store::{StoreError, WordStore};
