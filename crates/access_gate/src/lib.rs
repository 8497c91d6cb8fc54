pub mod access_gate;
pub mod domain;
pub mod http;

pub use crate::access_gate::*;
pub use crate::domain::*;
pub use crate::http::*;
