pub mod auth;
pub mod domain;
pub mod http;
pub mod postgres;
pub mod telemetry;

// Re-export mocks when testing feature is enabled
#[cfg(any(test, feature = "testing"))]
pub use auth::MockIdentityTokenInspector;
#[cfg(any(test, feature = "testing"))]
pub use domain::MockUserRoleRepository;
