//! You can use this demo by executing `python3 -m xmlrpc.server` and then running
//! `cargo run --example client`.

use xmlrpc_client::{Client, Request, Value};

fn main() {
    // The Python example server exports Python's `pow` method. Let's call it!
    let pow_request = Request::new("pow").arg(2).arg(8); // Compute 2**8

    let request_result = pow_request.call_url("http://127.0.0.1:8000");

    println!("Result: {:?}", request_result);

    let pow_result = request_result.unwrap();
    assert_eq!(pow_result, vec![Value::Int(2i32.pow(8))]);

    // A `Client` keeps the endpoint and user agent around for repeated calls.
    let client = Client::new("http://127.0.0.1:8000")
        .unwrap()
        .with_user_agent("xmlrpc-client demo");
    let sum = client.call("add", &[Value::from(2), Value::from(4)]);

    println!("Result: {:?}", sum);
}
