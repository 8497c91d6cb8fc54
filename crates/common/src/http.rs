mod cookie;
mod logging;

pub use cookie::*;
pub use logging::*;
