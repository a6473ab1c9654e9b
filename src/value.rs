//! Contains the different types of values understood by XML-RPC.

use crate::utils::{escape_xml, format_datetime, format_double};

use base64::encode;
use iso8601::DateTime;
use serde::ser::{self, Error as _, Serialize, SerializeSeq};

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::mem;

/// Newtype name used to smuggle a `Value::DateTime` through serde untouched.
///
/// `ser::Serializer` recognizes it and turns the payload back into a `DateTime`.
pub(crate) const DATETIME_TOKEN: &str = "$xmlrpc_client::DateTime";
/// Newtype name wrapped around `Value::Struct`, so that an empty struct stays a struct.
pub(crate) const STRUCT_TOKEN: &str = "$xmlrpc_client::Struct";

/// The possible XML-RPC values.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// `<i4>` or `<int>`, 32-bit signed integer.
    Int(i32),
    /// `<boolean>`, 0 == `false`, 1 == `true`.
    Bool(bool),
    /// `<string>`, or the bare text of an untyped `<value>`.
    String(String),
    /// `<double>`
    Double(f64),
    /// `<dateTime.iso8601>`, a date and time of day without timezone.
    ///
    /// On the wire this is always `YYYYMMDDTHH:MM:SS`: milliseconds and timezone offsets are
    /// dropped when sending, and parsed values carry neither.
    DateTime(DateTime),
    /// `<base64>`, base64-encoded binary data.
    Base64(Vec<u8>),

    /// `<struct>`, a mapping of named values.
    Struct(BTreeMap<String, Value>),
    /// `<array>`, a list of arbitrary (heterogeneous) values.
    Array(Vec<Value>),
}

impl Value {
    /// If the `Value` is an `Int`, returns it.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::Int(i) => Some(i),
            _ => None,
        }
    }

    /// If the `Value` is a `Bool`, returns it.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// If the `Value` is a `String`, returns a reference to it.
    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Value::String(ref s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// If the `Value` is a `Double`, returns it.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Double(d) => Some(d),
            _ => None,
        }
    }

    /// If the `Value` is a `DateTime`, returns it.
    pub fn as_datetime(&self) -> Option<DateTime> {
        match *self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    /// If the `Value` is `Base64`, returns the decoded bytes.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match *self {
            Value::Base64(ref data) => Some(data.as_slice()),
            _ => None,
        }
    }

    /// If the `Value` is an `Array`, returns its elements.
    pub fn as_array(&self) -> Option<&[Value]> {
        match *self {
            Value::Array(ref array) => Some(array.as_slice()),
            _ => None,
        }
    }

    /// If the `Value` is a `Struct`, returns its members.
    pub fn as_struct(&self) -> Option<&BTreeMap<String, Value>> {
        match *self {
            Value::Struct(ref map) => Some(map),
            _ => None,
        }
    }

    /// Looks up the member `name` of a `Struct`.
    ///
    /// Returns `None` if `self` is not a `Struct` or has no such member.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_struct().and_then(|map| map.get(name))
    }

    /// Formats this `Value` as an XML `<value>` element.
    pub fn write_as_xml<W: Write>(&self, fmt: &mut W) -> io::Result<()> {
        write!(fmt, "<value>")?;

        match *self {
            Value::Int(i) => {
                write!(fmt, "<int>{}</int>", i)?;
            }
            Value::Bool(b) => {
                write!(fmt, "<boolean>{}</boolean>", if b { "1" } else { "0" })?;
            }
            Value::String(ref s) => {
                write!(fmt, "<string>{}</string>", escape_xml(s))?;
            }
            Value::Double(d) => {
                write!(fmt, "<double>{}</double>", format_double(d))?;
            }
            Value::DateTime(ref date_time) => {
                let text = format_datetime(date_time).ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "dateTime cannot be written as YYYYMMDDTHH:MM:SS",
                    )
                })?;
                write!(fmt, "<dateTime.iso8601>{}</dateTime.iso8601>", text)?;
            }
            Value::Base64(ref data) => {
                write!(fmt, "<base64>{}</base64>", encode(data))?;
            }
            Value::Struct(ref map) => {
                write!(fmt, "<struct>")?;
                for (name, value) in map {
                    write!(fmt, "<member><name>{}</name>", escape_xml(name))?;
                    value.write_as_xml(fmt)?;
                    write!(fmt, "</member>")?;
                }
                write!(fmt, "</struct>")?;
            }
            Value::Array(ref array) => {
                write!(fmt, "<array><data>")?;
                for value in array {
                    value.write_as_xml(fmt)?;
                }
                write!(fmt, "</data></array>")?;
            }
        }

        write!(fmt, "</value>")?;
        Ok(())
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        // Nested containers are released from a flat work list, so dropping an arbitrarily deep
        // value doesn't recurse.
        let mut pending = match self {
            Value::Array(items) if !items.is_empty() => mem::take(items),
            Value::Struct(members) if !members.is_empty() => mem::take(members).into_values().collect(),
            _ => return,
        };

        while let Some(mut value) = pending.pop() {
            match &mut value {
                Value::Array(items) => pending.append(items),
                Value::Struct(members) => pending.extend(mem::take(members).into_values()),
                _ => {}
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        match *self {
            Value::Int(i) => serializer.serialize_i32(i),
            Value::Bool(b) => serializer.serialize_bool(b),
            Value::String(ref s) => serializer.serialize_str(s),
            Value::Double(d) => serializer.serialize_f64(d),
            Value::DateTime(ref date_time) => {
                let text = format_datetime(date_time)
                    .ok_or_else(|| S::Error::custom("dateTime cannot be written as YYYYMMDDTHH:MM:SS"))?;
                serializer.serialize_newtype_struct(DATETIME_TOKEN, &text)
            }
            Value::Base64(ref bytes) => serializer.serialize_bytes(bytes),
            Value::Struct(ref map) => serializer.serialize_newtype_struct(STRUCT_TOKEN, map),
            Value::Array(ref values) => {
                let mut state = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    state.serialize_element(value)?;
                }
                state.end()
            }
        }
    }
}

impl From<i32> for Value {
    fn from(other: i32) -> Self {
        Value::Int(other)
    }
}

impl From<bool> for Value {
    fn from(other: bool) -> Self {
        Value::Bool(other)
    }
}

impl From<String> for Value {
    fn from(other: String) -> Self {
        Value::String(other)
    }
}

impl<'a> From<&'a str> for Value {
    fn from(other: &'a str) -> Self {
        Value::String(other.to_string())
    }
}

impl From<f64> for Value {
    fn from(other: f64) -> Self {
        Value::Double(other)
    }
}

impl From<DateTime> for Value {
    fn from(other: DateTime) -> Self {
        Value::DateTime(other)
    }
}

impl From<Vec<Value>> for Value {
    fn from(other: Vec<Value>) -> Self {
        Value::Array(other)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(other: BTreeMap<String, Value>) -> Self {
        Value::Struct(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str;

    fn xml(value: &Value) -> String {
        let mut output: Vec<u8> = Vec::new();
        value.write_as_xml(&mut output).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn escapes_strings() {
        assert_eq!(
            xml(&Value::from("<xml>&nbsp;string")),
            "<value><string>&lt;xml&gt;&amp;nbsp;string</string></value>"
        );
    }

    #[test]
    fn escapes_struct_member_names() {
        let mut map: BTreeMap<String, Value> = BTreeMap::new();
        map.insert("x&<x".to_string(), Value::from(true));

        assert_eq!(
            xml(&Value::Struct(map)),
            "<value><struct><member><name>x&amp;&lt;x</name><value><boolean>1</boolean></value></member></struct></value>"
        );
    }

    #[test]
    fn writes_scalars() {
        assert_eq!(xml(&Value::from(12)), "<value><int>12</int></value>");
        assert_eq!(xml(&Value::from(true)), "<value><boolean>1</boolean></value>");
        assert_eq!(xml(&Value::from(false)), "<value><boolean>0</boolean></value>");
        assert_eq!(xml(&Value::from(3.0)), "<value><double>3.0</double></value>");
        assert_eq!(
            xml(&Value::Base64(b"you can't read this!".to_vec())),
            "<value><base64>eW91IGNhbid0IHJlYWQgdGhpcyE=</base64></value>"
        );

        let date_time = DateTime {
            date: iso8601::Date::YMD { year: 1998, month: 7, day: 17 },
            time: iso8601::Time {
                hour: 14,
                minute: 8,
                second: 55,
                millisecond: 123,
                tz_offset_hours: 2,
                tz_offset_minutes: 0,
            },
        };
        assert_eq!(
            xml(&Value::from(date_time)),
            "<value><dateTime.iso8601>19980717T14:08:55</dateTime.iso8601></value>"
        );
    }

    #[test]
    fn writes_nested_arrays_in_order() {
        let value = Value::Array(vec![
            Value::Array(vec![Value::from("a"), Value::from(1)]),
            Value::Array(vec![]),
        ]);

        assert_eq!(
            xml(&value),
            "<value><array><data>\
             <value><array><data><value><string>a</string></value><value><int>1</int></value></data></array></value>\
             <value><array><data></data></array></value>\
             </data></array></value>"
        );
    }

    #[test]
    fn refuses_impossible_datetimes() {
        let date_time = DateTime {
            date: iso8601::Date::YMD { year: 2015, month: 2, day: 30 },
            time: iso8601::Time {
                hour: 0,
                minute: 0,
                second: 0,
                millisecond: 0,
                tz_offset_hours: 0,
                tz_offset_minutes: 0,
            },
        };

        let err = Value::from(date_time).write_as_xml(&mut Vec::new()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn drops_deeply_nested_values() {
        let mut value = Value::from("leaf");
        for depth in 0..200_000 {
            value = if depth % 2 == 0 {
                Value::Array(vec![value, Value::Int(depth)])
            } else {
                let mut members = BTreeMap::new();
                members.insert("inner".to_string(), value);
                Value::Struct(members)
            };
        }
        drop(value);
    }

    #[test]
    fn accessors() {
        let mut map = BTreeMap::new();
        map.insert("answer".to_string(), Value::Int(42));
        let value = Value::Struct(map);

        assert_eq!(value.get("answer").and_then(Value::as_i32), Some(42));
        assert_eq!(value.get("question"), None);
        assert_eq!(Value::Int(1).get("answer"), None);
        assert_eq!(Value::from("s").as_str(), Some("s"));
        assert_eq!(Value::from("s").as_i32(), None);
        assert_eq!(Value::Base64(vec![1, 2]).as_bytes(), Some(&[1u8, 2][..]));
        assert_eq!(str::from_utf8(Value::Base64(b"hi".to_vec()).as_bytes().unwrap()), Ok("hi"));
    }
}
