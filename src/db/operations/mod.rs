pub mod stats;
pub mod users;
pub mod words;

pub use stats::*;
pub use users::*;
pub use words::*;
