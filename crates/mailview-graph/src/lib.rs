//! Read-only Microsoft Graph client for MailView.
//!
//! One fetcher per resource page: newest inbox messages, upcoming
//! calendar events, contacts. Each issues a single top-10 list query
//! with explicit field selection and server-side ordering, and maps the
//! wire shapes into flat display rows; rendering happens elsewhere.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GraphClient, ListQuery};
pub use error::{GraphError, GraphResult};
pub use types::*;
