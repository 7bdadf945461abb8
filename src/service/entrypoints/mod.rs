//! Services API namespaces
//!
//! One struct per endpoint namespace. Each method returns an unsent
//! [`Query`](super::query::Query) or [`ListQuery`](super::query::ListQuery)
//! carrying the endpoint's documented errors. `ambra generate` renders
//! modules in this same shape from the API reference.

pub mod account;
pub mod audit;
pub mod group;
pub mod namespace;
pub mod session;
pub mod study;
pub mod user;

pub use account::Account;
pub use audit::Audit;
pub use group::Group;
pub use namespace::Namespace;
pub use session::Session;
pub use study::Study;
pub use user::User;
