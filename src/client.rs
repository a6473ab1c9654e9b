use crate::error::Error;
use crate::http::DEFAULT_USER_AGENT;
use crate::{Request, Value};

use reqwest::header::USER_AGENT;
use reqwest::{IntoUrl, Url};

/// An XML-RPC endpoint reachable over HTTP.
///
/// A `Client` remembers the endpoint URL and the `User-Agent` to send, and reuses one
/// `reqwest::blocking::Client` (and therefore its connection pool) for all calls.
///
/// ```no_run
/// use xmlrpc_client::{Client, Value};
///
/// let client = Client::new("http://localhost:8000")?.with_user_agent("my-app/1.0");
/// let result = client.call("pow", &[Value::Int(2), Value::Int(8)])?;
/// assert_eq!(result, vec![Value::Int(256)]);
/// # Ok::<(), xmlrpc_client::Error>(())
/// ```
#[derive(Clone, Debug)]
pub struct Client {
    url: Url,
    user_agent: String,
    http: reqwest::blocking::Client,
}

impl Client {
    /// Creates a client for the endpoint at `url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if `url` is not a valid URL.
    pub fn new<U: IntoUrl>(url: U) -> Result<Self, Error> {
        let url = url.into_url().map_err(|e| Error::Transport(Box::new(e)))?;

        Ok(Client {
            url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            http: reqwest::blocking::Client::new(),
        })
    }

    /// Sets the `User-Agent` header sent with every call.
    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Returns the endpoint calls are sent to.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the `User-Agent` sent with every call.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Points the client at a different endpoint.
    pub fn set_url<U: IntoUrl>(&mut self, url: U) -> Result<(), Error> {
        self.url = url.into_url().map_err(|e| Error::Transport(Box::new(e)))?;
        Ok(())
    }

    /// Calls `method` with `args` and returns the response parameters.
    ///
    /// # Errors
    ///
    /// The same conditions as for [`Request::call`] apply.
    ///
    /// [`Request::call`]: struct.Request.html#method.call
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Vec<Value>, Error> {
        let builder = self
            .http
            .post(self.url.clone())
            .header(USER_AGENT, self.user_agent.as_str());

        Request::new(method).args(args.iter().cloned()).call(builder)
    }
}
