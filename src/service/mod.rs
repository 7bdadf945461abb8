//! Ambra services, Storage and WebSocket clients
//!
//! - [`transport`]: HTTP sending, retry and response decoding
//! - [`session`]: login and sid handling
//! - [`client`]: the authenticated client every call goes through
//! - [`query`]: single calls and paginated lists
//! - [`entrypoints`]: one struct per services namespace
//! - [`storage`]: Storage API calls
//! - [`ws`]: channel subscriptions over WebSocket

pub mod client;
pub mod entrypoints;
pub mod filtering;
pub mod params;
pub mod query;
pub mod session;
pub mod storage;
pub mod transport;
pub mod ws;

pub use client::ServiceClient;
pub use filtering::{Field, Filter, FilterCondition, Sorter};
pub use params::ParamValue;
pub use query::{ListFeatures, ListQuery, Page, Query};
pub use session::{CredentialSession, SessionProvider, StaticSession};
pub use storage::{Storage, StudyLocator};
pub use transport::{HttpTransport, Params};
pub use ws::{ChannelEvent, Subscription, WsConfig, WsManager};
