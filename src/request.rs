use crate::error::Error;
use crate::parser::{parse_response, Response};
use crate::transport::Transport;
use crate::utils::escape_xml;
use crate::{to_value, Value};

use serde::Serialize;
use tracing::debug;

use std::io::{self, Write};

/// A request to call a procedure.
#[derive(Clone, Debug)]
pub struct Request<'a> {
    name: &'a str,
    args: Vec<Value>,
}

impl<'a> Request<'a> {
    /// Creates a new request to call a function named `name`.
    ///
    /// By default, no arguments are passed. Use the `arg` method to append arguments.
    pub fn new(name: &'a str) -> Self {
        Request {
            name,
            args: Vec::new(),
        }
    }

    /// Appends an argument to be passed to the current list of arguments.
    pub fn arg<T: Into<Value>>(mut self, value: T) -> Self {
        self.args.push(value.into());
        self
    }

    /// Appends several arguments at once.
    pub fn args<I>(mut self, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.args.extend(values.into_iter().map(Into::into));
        self
    }

    /// Appends an arbitrary serializable argument, converted with [`to_value`].
    ///
    /// # Errors
    ///
    /// Fails with [`Error::UnsupportedType`] if `value` has no XML-RPC representation.
    ///
    /// [`to_value`]: fn.to_value.html
    pub fn try_arg<T: ?Sized + Serialize>(self, value: &T) -> Result<Self, Error> {
        let value = to_value(value)?;
        Ok(self.arg(value))
    }

    /// Returns the name of the method to call.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Returns the arguments appended so far.
    pub fn arguments(&self) -> &[Value] {
        &self.args
    }

    /// Performs the request using a [`Transport`].
    ///
    /// If you want to send the request using an HTTP POST request, you can also use [`call_url`],
    /// which creates a suitable [`Transport`] internally.
    ///
    /// # Errors
    ///
    /// Any errors that occur while sending the request using the [`Transport`] will be returned to
    /// the caller. Additionally, if the response is malformed, or indicates that the method call
    /// failed, an error will also be returned.
    ///
    /// [`call_url`]: #method.call_url
    /// [`Transport`]: trait.Transport.html
    pub fn call<T: Transport>(&self, transport: T) -> Result<Vec<Value>, Error> {
        debug!("calling {} with {} argument(s)", self.name, self.args.len());

        let mut reader = transport.transmit(self).map_err(Error::Transport)?;
        let response = parse_response(&mut reader)?;

        self.evaluate(response)
    }

    /// Performs the request using an [`AsyncTransport`].
    ///
    /// Behaves like [`call`], except that the transport is awaited.
    ///
    /// [`call`]: #method.call
    /// [`AsyncTransport`]: trait.AsyncTransport.html
    #[cfg(feature = "async")]
    pub async fn call_async<T: crate::AsyncTransport>(&self, transport: T) -> Result<Vec<Value>, Error> {
        debug!("calling {} with {} argument(s)", self.name, self.args.len());

        let body = transport.transmit(self).await.map_err(Error::Transport)?;
        let response = crate::parse_response_str(&body)?;

        self.evaluate(response)
    }

    /// Performs the request on a URL.
    ///
    /// You can pass a `&str` or an already parsed reqwest URL.
    ///
    /// This is a convenience method that will internally create a new `reqwest::blocking::Client`
    /// and send an HTTP POST request to the given URL. Use [`Client`] to reuse a connection
    /// configuration across calls.
    ///
    /// This method is only available when the `http` feature is enabled (this is the default).
    ///
    /// # Errors
    ///
    /// Since this is just a convenience wrapper around [`Request::call`], the same error conditions
    /// apply.
    ///
    /// [`Request::call`]: #method.call
    /// [`Client`]: struct.Client.html
    #[cfg(feature = "http")]
    pub fn call_url<U: reqwest::IntoUrl>(&self, url: U) -> Result<Vec<Value>, Error> {
        use reqwest::header::USER_AGENT;

        let builder = reqwest::blocking::Client::new()
            .post(url)
            .header(USER_AGENT, crate::http::DEFAULT_USER_AGENT);
        self.call(builder)
    }

    /// Turns a parsed response into the call's result.
    fn evaluate(&self, response: Response) -> Result<Vec<Value>, Error> {
        match response {
            Ok(values) => {
                debug!("{} returned {} value(s)", self.name, values.len());
                Ok(values)
            }
            Err(fault) => {
                debug!("{} returned fault {}", self.name, fault);
                Err(Error::Fault(fault))
            }
        }
    }

    /// Formats this `Request` as a UTF-8 encoded XML document.
    ///
    /// # Errors
    ///
    /// Any errors reported by the writer will be propagated to the caller. If the writer never
    /// returns an error, neither will this method.
    pub fn write_as_xml<W: Write>(&self, fmt: &mut W) -> io::Result<()> {
        write!(fmt, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
        write!(fmt, r#"<methodCall>"#)?;
        write!(fmt, r#"<methodName>{}</methodName>"#, escape_xml(self.name))?;
        write!(fmt, r#"<params>"#)?;
        for value in &self.args {
            write!(fmt, r#"<param>"#)?;
            value.write_as_xml(fmt)?;
            write!(fmt, r#"</param>"#)?;
        }
        write!(fmt, r#"</params>"#)?;
        write!(fmt, r#"</methodCall>"#)?;
        Ok(())
    }

    /// Returns the XML document `write_as_xml` would write.
    ///
    /// # Errors
    ///
    /// Fails if an argument holds a `DateTime` that has no `YYYYMMDDTHH:MM:SS` form.
    pub fn to_xml(&self) -> io::Result<String> {
        let mut body = Vec::new();
        self.write_as_xml(&mut body)?;
        String::from_utf8(body).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}
