use crate::error::BoxError;
use crate::Request;

use std::io::Read;

/// Request and response transport abstraction.
///
/// The `Transport` trait provides a way to send a `Request` to a server and to receive the
/// corresponding response. A `Transport` implementor is passed to [`Request::call`] in order to use
/// it to perform that request. The destination of the request is part of the transport.
///
/// The most commonly used transport is simple HTTP: If the `http` feature is enabled (it is by
/// default), the reqwest `blocking::RequestBuilder` will implement this trait and send the XML-RPC
/// [`Request`] via HTTP.
///
/// You can implement this trait for your own types if you want to customize how requests are sent.
/// You can modify HTTP headers or wrap requests in a completely different protocol.
///
/// [`Request::call`]: struct.Request.html#method.call
/// [`Request`]: struct.Request.html
pub trait Transport {
    /// The response stream returned by `transmit`.
    type Stream: Read;

    /// Transmits an XML-RPC request and returns the server's response.
    ///
    /// The response is returned as a `Self::Stream` - some type implementing the `Read` trait. The
    /// library will read all of the data and parse it as a response. It must be UTF-8 encoded XML,
    /// otherwise the call will fail.
    ///
    /// # Errors
    ///
    /// If a transport error occurs, it should be returned as a boxed error - the library will then
    /// return an appropriate [`Error`] to the caller.
    ///
    /// [`Error`]: enum.Error.html
    fn transmit(self, request: &Request) -> Result<Self::Stream, BoxError>;
}

/// Asynchronous counterpart of [`Transport`], used by [`Request::call_async`].
///
/// The request document must be produced before the returned future is created, so the future
/// does not borrow the request.
///
/// [`Transport`]: trait.Transport.html
/// [`Request::call_async`]: struct.Request.html#method.call_async
#[cfg(feature = "async")]
pub trait AsyncTransport {
    /// Transmits an XML-RPC request and resolves to the complete response document.
    fn transmit(self, request: &Request) -> futures::future::BoxFuture<'static, Result<String, BoxError>>;
}

/// Provides helpers for implementing custom [`Transport`]s using reqwest.
///
/// This module will be disabled if the `http` feature is not enabled.
///
/// The default [`Transport`] implementation for `RequestBuilder` looks roughly like
/// this:
///
/// ```notrust
/// // serialize request into `body` (a `Vec<u8>`)
///
/// build_headers(builder, body.len());
///
/// // send `body` using `builder` and get response
///
/// check_response(&response)?;
/// ```
///
/// From this, you can build your own custom transports.
///
/// [`Transport`]: ../trait.Transport.html
#[cfg(feature = "http")]
pub mod http {
    use crate::error::BoxError;
    use crate::{Request, Transport};

    use mime::Mime;
    use reqwest::blocking::{RequestBuilder, Response};
    use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
    use reqwest::StatusCode;
    use tracing::trace;

    /// `User-Agent` sent by [`Request::call_url`] and, unless configured otherwise, by `Client`.
    ///
    /// [`Request::call_url`]: ../struct.Request.html#method.call_url
    pub const DEFAULT_USER_AGENT: &str = "Rust xmlrpc-client";

    /// Appends the HTTP headers required by the XML-RPC specification to the `RequestBuilder`.
    ///
    /// More specifically, the following headers are set:
    ///
    /// ```notrust
    /// Content-Type: text/xml; charset=utf-8
    /// Content-Length: $body_len
    /// ```
    ///
    /// The `User-Agent` is left to the caller, so that it can be chosen freely.
    pub fn build_headers(builder: RequestBuilder, body_len: u64) -> RequestBuilder {
        // NB: The `Host` header is also required, but reqwest adds it automatically, since
        // HTTP/1.1 requires it.
        builder
            .header(CONTENT_TYPE, "text/xml; charset=utf-8")
            .header(CONTENT_LENGTH, body_len)
    }

    /// Checks that a reqwest `Response` has a status code indicating success and, if it declares a
    /// `Content-Type`, that it is XML.
    pub fn check_response(response: &Response) -> Result<(), BoxError> {
        check_status_and_type(response.status(), response.headers())
    }

    pub(crate) fn check_status_and_type(status: StatusCode, headers: &HeaderMap) -> Result<(), BoxError> {
        if !status.is_success() {
            return Err(format!("server response indicates error: {}", status).into());
        }

        // "The Content-Type is text/xml."
        // (we ignore this if the header is missing completely)
        if let Some(content_type) = headers.get(CONTENT_TYPE) {
            let mime: Mime = content_type.to_str()?.parse()?;
            let is_xml = mime.subtype() == mime::XML
                && (mime.type_() == mime::TEXT || mime.type_() == mime::APPLICATION);
            if !is_xml {
                return Err(format!(
                    "expected Content-Type 'text/xml', got '{}/{}'",
                    mime.type_(),
                    mime.subtype()
                )
                .into());
            }
        }

        Ok(())
    }

    /// Use a `RequestBuilder` as the transport.
    ///
    /// The request will be sent as specified in the XML-RPC specification, with the correct
    /// `Content-Type` and `Content-Length`.
    impl Transport for RequestBuilder {
        type Stream = Response;

        fn transmit(self, request: &Request) -> Result<Self::Stream, BoxError> {
            let body = request.to_xml()?;
            trace!("sending XML-RPC body: {}", body);

            let response = build_headers(self, body.len() as u64).body(body).send()?;

            check_response(&response)?;

            Ok(response)
        }
    }

    /// Use an asynchronous reqwest `RequestBuilder` as the transport.
    #[cfg(feature = "async")]
    impl crate::AsyncTransport for reqwest::RequestBuilder {
        fn transmit(
            self,
            request: &Request,
        ) -> futures::future::BoxFuture<'static, Result<String, BoxError>> {
            let body = match request.to_xml() {
                Ok(body) => body,
                Err(e) => return Box::pin(futures::future::err::<String, BoxError>(Box::new(e))),
            };
            trace!("sending XML-RPC body: {}", body);

            let builder = self
                .header(CONTENT_TYPE, "text/xml; charset=utf-8")
                .header(CONTENT_LENGTH, body.len() as u64)
                .body(body);

            Box::pin(async move {
                let response = builder.send().await?;
                check_status_and_type(response.status(), response.headers())?;
                Ok(response.text().await?)
            })
        }
    }

}
