//! This demo shows how to transmit a request with a custom HTTP header.

use xmlrpc_client::http::{build_headers, check_response, DEFAULT_USER_AGENT};
use xmlrpc_client::{BoxError, Request, Transport};

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{COOKIE, USER_AGENT};

/// Custom transport that adds a cookie header.
struct MyTransport(RequestBuilder);

impl Transport for MyTransport {
    type Stream = Response;

    fn transmit(self, request: &Request) -> Result<Self::Stream, BoxError> {
        let mut body = Vec::new();
        request.write_as_xml(&mut body)?;

        let response = build_headers(self.0, body.len() as u64)
            .header(USER_AGENT, DEFAULT_USER_AGENT)
            .header(COOKIE, "SESSION=123abc") // Our custom header will be a `Cookie` header
            .body(body)
            .send()?;

        check_response(&response)?;

        Ok(response)
    }
}

fn main() {
    let request = Request::new("pow").arg(2).arg(8);

    let tp = MyTransport(Client::new().post("http://localhost/target"));
    let result = request.call(tp);

    println!("Result: {:?}", result);
}
