mod aggregator;
mod handler;
mod request;
mod response;

pub use aggregator::*;
pub use handler::*;
pub use request::*;
pub use response::*;
