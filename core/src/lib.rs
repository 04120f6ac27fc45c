//! Synchronous client core for the feedback portal API.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). A `Transport` supplied by
//! the host performs the round-trip, which keeps the core deterministic and
//! testable.
//!
//! # Design
//! - `ApiClient` is stateless. It holds only `base_url` and receives the
//!   bearer token per call.
//! - `Session` owns the token and the cached user, and writes the token
//!   through a `TokenStore`.
//! - `Presenter` renders every outcome as a `{timestamp, status, data}`
//!   envelope onto any `io::Write`.
//! - `Controller` ties the pieces together with one method per user action.
//!   Callers hold it explicitly; there is no global state.

pub mod client;
pub mod controller;
pub mod envelope;
pub mod error;
pub mod http;
pub mod presenter;
pub mod session;
pub mod types;

pub use client::ApiClient;
pub use controller::Controller;
pub use envelope::ApiResult;
pub use error::{ApiError, RenderError, StoreError, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use presenter::Presenter;
pub use session::{MemoryTokenStore, Session, SessionState, TokenStore};
pub use types::{
    Credentials, Feedback, NewFeedback, ProfileUpdate, Registration, Role, TokenResponse, User,
    UserUpdate,
};
