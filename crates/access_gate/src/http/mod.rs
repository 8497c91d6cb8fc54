mod error;
mod gate_layer;
pub mod handlers;
mod redirect;
mod router;
mod server;

pub use error::*;
pub use gate_layer::*;
pub use redirect::*;
pub use router::*;
pub use server::*;
