//! Exercises `Request::call_async` with an in-memory transport.

use xmlrpc_client::{AsyncTransport, BoxError, Error, Request, Value};

use futures::future::BoxFuture;

/// Answers every request with a fixed document after yielding once.
struct Deferred(&'static str);

impl AsyncTransport for Deferred {
    fn transmit(self, request: &Request) -> BoxFuture<'static, Result<String, BoxError>> {
        let method = request.name().to_string();
        let reply = self.0;
        Box::pin(async move {
            tokio::task::yield_now().await;
            if method.is_empty() {
                return Err("no method given".into());
            }
            Ok(reply.to_string())
        })
    }
}

#[tokio::test]
async fn resolves_values() {
    let result = Request::new("pow")
        .arg(2)
        .arg(8)
        .call_async(Deferred(
            "<methodResponse><params><param><value><i4>256</i4></value></param></params></methodResponse>",
        ))
        .await;

    assert_eq!(result.unwrap(), vec![Value::Int(256)]);
}

#[tokio::test]
async fn resolves_faults_and_transport_errors() {
    let fault = Request::new("pow")
        .call_async(Deferred(
            "<methodResponse><fault><value><struct></struct></value></fault></methodResponse>",
        ))
        .await
        .unwrap_err();
    let fault = fault.fault().unwrap();
    assert_eq!((fault.code(), fault.string()), (0, "Unknown"));

    match Request::new("").call_async(Deferred("")).await {
        Err(Error::Transport(e)) => assert_eq!(e.to_string(), "no method given"),
        other => panic!("expected transport error, got {:?}", other),
    }
}
