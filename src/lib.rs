//! An XML-RPC client in Rust.
//!
//! The `xmlrpc_client` crate implements the client side of the [XML-RPC spec][spec]: it turns
//! native values into a `methodCall` document, hands it to a [`Transport`], and parses the
//! `methodResponse` that comes back into [`Value`]s or a [`Fault`].
//!
//! Arguments can be built as [`Value`]s directly, or converted from anything implementing
//! `serde::Serialize` with [`to_value`].
//!
//! ```no_run
//! use xmlrpc_client::{Request, Value};
//!
//! let result = Request::new("pow").arg(2).arg(8).call_url("http://localhost:8000")?;
//! assert_eq!(result, vec![Value::Int(256)]);
//! # Ok::<(), xmlrpc_client::Error>(())
//! ```
//!
//! [spec]: http://xmlrpc.scripting.com/spec.html

#![doc(html_root_url = "https://docs.rs/xmlrpc-client/0.1.0")]

#[cfg(feature = "http")]
mod client;
mod error;
mod fault;
mod parser;
mod request;
mod ser;
mod transport;
mod utils;
mod value;

#[cfg(feature = "http")]
pub use client::Client;
pub use error::{BoxError, Error, ParseError};
pub use fault::Fault;
pub use parser::{parse_response, parse_response_str, Response};
pub use request::Request;
pub use ser::to_value;
pub use transport::Transport;
pub use value::Value;

#[cfg(feature = "async")]
pub use transport::AsyncTransport;
#[cfg(feature = "http")]
pub use transport::http;
