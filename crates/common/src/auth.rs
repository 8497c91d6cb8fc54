mod caller;
mod config;
mod identity_token;

pub use caller::*;
pub use config::*;
pub use identity_token::*;

#[cfg(any(test, feature = "testing"))]
pub use identity_token::MockIdentityTokenInspector;
