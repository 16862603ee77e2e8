mod consumer_wrapper;
mod member_assignment;
mod settings;

pub use consumer_wrapper::*;
pub use member_assignment::*;
pub use settings::*;
