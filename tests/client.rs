//! Drives the request facade against an in-memory transport.

use xmlrpc_client::{BoxError, Error, Fault, Request, Transport, Value};

use serde::Serialize;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Cursor;

/// Records the request document and answers with a fixed response.
struct Loopback<'a> {
    sent: &'a RefCell<Option<String>>,
    reply: &'static str,
}

impl<'a> Transport for Loopback<'a> {
    type Stream = Cursor<Vec<u8>>;

    fn transmit(self, request: &Request) -> Result<Self::Stream, BoxError> {
        *self.sent.borrow_mut() = Some(request.to_xml()?);
        Ok(Cursor::new(self.reply.as_bytes().to_vec()))
    }
}

fn call(request: &Request, reply: &'static str) -> (String, Result<Vec<Value>, Error>) {
    let sent = RefCell::new(None);
    let result = request.call(Loopback { sent: &sent, reply });
    (sent.into_inner().expect("transport was not used"), result)
}

#[test]
fn sends_arguments_and_returns_params_in_order() {
    let request = Request::new("echo").arg("Ümlaut String").arg("Normal String");
    let (sent, result) = call(
        &request,
        r#"<?xml version="1.0"?>
<methodResponse>
  <params>
    <param><value><string>Ümlaut String</string></value></param>
    <param><value>Normal String</value></param>
  </params>
</methodResponse>"#,
    );

    assert!(sent.contains(
        "<params><param><value><string>Ümlaut String</string></value></param>\
         <param><value><string>Normal String</string></value></param></params>"
    ));
    assert_eq!(result.unwrap(), vec![Value::from("Ümlaut String"), Value::from("Normal String")]);
}

#[test]
fn returns_nested_arrays() {
    let (_, result) = call(
        &Request::new("matrix"),
        "<methodResponse><params><param><value><array><data>\
         <value><array><data><value>Str 00</value><value>Str 01</value></data></array></value>\
         <value><array><data><value>Str 10</value><value>Str 11</value></data></array></value>\
         </data></array></value></param></params></methodResponse>",
    );

    let row = |a: &str, b: &str| Value::Array(vec![Value::from(a), Value::from(b)]);
    assert_eq!(
        result.unwrap(),
        vec![Value::Array(vec![row("Str 00", "Str 01"), row("Str 10", "Str 11")])]
    );
}

#[test]
fn surfaces_faults() {
    let (_, result) = call(
        &Request::new("pow").arg(2).arg(2).arg("BLA"),
        "<methodResponse><fault><value><struct>\
         <member><name>faultString</name><value><string>Too many parameters</string></value></member>\
         <member><name>faultCode</name><value><int>4</int></value></member>\
         </struct></value></fault></methodResponse>",
    );

    let err = result.unwrap_err();
    assert_eq!(err.fault(), Some(&Fault::new(4, "Too many parameters")));
    assert_eq!(err.to_string(), "server returned a fault: Too many parameters (4)");
}

#[test]
fn surfaces_malformed_responses() {
    let (_, result) = call(&Request::new("pow"), "<methodResponse><params><param>");

    match result {
        Err(Error::Parse(e)) => assert!(e.is_malformed_document()),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[derive(Serialize)]
struct Query {
    term: String,
    limit: u16,
    exact: bool,
    weights: Vec<f64>,
}

#[test]
fn marshals_serializable_arguments() {
    let query = Query {
        term: "rust & xml".to_string(),
        limit: 10,
        exact: false,
        weights: vec![1.0, 0.5],
    };
    let request = Request::new("search").try_arg(&query).unwrap();

    let mut expected = BTreeMap::new();
    expected.insert("exact".to_string(), Value::Bool(false));
    expected.insert("limit".to_string(), Value::Int(10));
    expected.insert("term".to_string(), Value::from("rust & xml"));
    expected.insert(
        "weights".to_string(),
        Value::Array(vec![Value::Double(1.0), Value::Double(0.5)]),
    );
    assert_eq!(request.arguments(), &[Value::Struct(expected)][..]);

    let (sent, _) = call(&request, "<methodResponse><params/></methodResponse>");
    assert!(sent.contains("<member><name>term</name><value><string>rust &amp; xml</string></value></member>"));
    assert!(sent.contains("<value><double>1.0</double></value><value><double>0.5</double></value>"));
}
