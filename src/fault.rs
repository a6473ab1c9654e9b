use crate::Value;

use thiserror::Error;

use std::collections::BTreeMap;

/// `faultCode` assumed when the server omits it (or sends something that isn't an integer).
const DEFAULT_CODE: i32 = 0;
/// `faultString` assumed when the server omits it (or sends something that isn't a string).
const DEFAULT_STRING: &str = "Unknown";

/// A `<fault>` response, indicating that a request failed.
///
/// The XML-RPC specification requires that a `faultCode` and `faultString` is returned in the
/// `<fault>` case, further describing the error. Servers don't always comply, so both members are
/// optional when reading a fault: a missing code reads as `0`, a missing string as `"Unknown"`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{string} ({code})")]
pub struct Fault {
    code: i32,
    string: String,
}

impl Fault {
    /// Creates a new `Fault` from an error code and a message.
    pub fn new<S: Into<String>>(code: i32, string: S) -> Fault {
        Fault {
            code,
            string: string.into(),
        }
    }

    /// Returns the fault code.
    ///
    /// The meaning of this code is not specified by XML-RPC and depends on the service you are
    /// implementing/using.
    pub fn code(&self) -> i32 {
        self.code
    }

    /// Returns the error message sent by the server.
    pub fn string(&self) -> &str {
        &self.string
    }

    /// Creates a `Fault` from the `Value` found inside a `<fault>` element.
    ///
    /// Members other than `faultCode` and `faultString` are ignored. Missing or mistyped members
    /// fall back to the defaults, so this never fails; a non-struct value yields the default
    /// fault.
    pub fn from_value(value: &Value) -> Self {
        let code = value
            .get("faultCode")
            .and_then(Value::as_i32)
            .unwrap_or(DEFAULT_CODE);
        let string = value
            .get("faultString")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_STRING);

        Fault::new(code, string)
    }

    /// Turns this `Fault` into an equivalent `Value`.
    ///
    /// The returned value can be turned back into a `Fault` using `Fault::from_value`.
    pub fn to_value(&self) -> Value {
        let mut map = BTreeMap::new();
        map.insert("faultCode".to_string(), Value::from(self.code));
        map.insert("faultString".to_string(), Value::from(self.string.as_str()));

        Value::Struct(map)
    }
}
