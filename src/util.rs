pub mod duration;
pub mod endpoint;
pub mod quote;
