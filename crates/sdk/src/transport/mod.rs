//! Transport layer for the ServiceNow SDK.

pub mod http;

pub use http::HttpTransport;
