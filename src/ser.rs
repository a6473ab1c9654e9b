//! Conversion of native Rust data into `Value`s via serde.
//!
//! XML-RPC only knows one keyed container, `<struct>`, and one ordered one, `<array>`. Rust data
//! is mapped as follows:
//!
//! * sequences, tuples and tuple structs become arrays,
//! * structs become structs,
//! * maps become arrays if their keys are the integers `0..n` in iteration order, and structs
//!   otherwise. An empty map becomes an empty array.
//!
//! Anything without an XML-RPC counterpart (`()`, `None`, integers outside the `i32` range,
//! non-finite floats, ...) is rejected with `Error::UnsupportedType`.

use crate::error::Error;
use crate::utils::parse_datetime;
use crate::value::{DATETIME_TOKEN, STRUCT_TOKEN};
use crate::Value;

use serde::ser::{self, Error as _, Impossible, Serialize};

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt::{self, Display};
use std::iter;

impl ser::Error for Error {
    fn custom<T>(msg: T) -> Self
    where
        T: Display,
    {
        Error::UnsupportedType(msg.to_string())
    }
}

impl Error {
    fn key_must_be_string_or_int() -> Self {
        Error::unsupported("map keys must be strings or integers")
    }
}

pub type Result<T> = ::std::result::Result<T, Error>;

/// Converts any serializable value into an XML-RPC `Value`.
///
/// # Errors
///
/// Returns `Error::UnsupportedType` if `value` contains something XML-RPC cannot express, such as
/// a unit value, `None`, an integer that does not fit into 32 bits, a NaN or infinite float, or a
/// map whose keys are neither strings nor integers.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use xmlrpc_client::{to_value, Value};
///
/// let mut dense = BTreeMap::new();
/// dense.insert(0, "a");
/// dense.insert(1, "b");
/// assert_eq!(
///     to_value(&dense).unwrap(),
///     Value::Array(vec![Value::from("a"), Value::from("b")]),
/// );
/// ```
pub fn to_value<T: ?Sized + Serialize>(value: &T) -> Result<Value> {
    value.serialize(Serializer)
}

fn int_value<T: Copy + Display>(v: T) -> Result<Value>
where
    i32: TryFrom<T>,
{
    i32::try_from(v)
        .map(Value::Int)
        .map_err(|_| Error::unsupported(format!("integer {} does not fit into <int>", v)))
}

fn double_value(v: f64) -> Result<Value> {
    if v.is_finite() {
        Ok(Value::Double(v))
    } else {
        Err(Error::unsupported(format!("cannot represent {} as <double>", v)))
    }
}

/// A serializer that produces an XML-RPC `Value`.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Serializer;

impl ser::Serializer for Serializer {
    type Ok = Value;
    type Error = Error;
    type SerializeSeq = SerializeArray;
    type SerializeTuple = Self::SerializeSeq;
    type SerializeTupleStruct = Self::SerializeSeq;
    type SerializeTupleVariant = SerializeTupleVariant;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeStruct;
    type SerializeStructVariant = SerializeStructVariant;

    fn serialize_bool(self, v: bool) -> Result<Self::Ok> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok> {
        self.serialize_i32(v.into())
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok> {
        self.serialize_i32(v.into())
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok> {
        Ok(Value::Int(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok> {
        int_value(v)
    }

    fn serialize_i128(self, v: i128) -> Result<Self::Ok> {
        int_value(v)
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok> {
        self.serialize_i32(v.into())
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok> {
        self.serialize_i32(v.into())
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok> {
        int_value(v)
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok> {
        int_value(v)
    }

    fn serialize_u128(self, v: u128) -> Result<Self::Ok> {
        int_value(v)
    }

    fn serialize_f32(self, v: f32) -> Result<Self::Ok> {
        double_value(v.into())
    }

    fn serialize_f64(self, v: f64) -> Result<Self::Ok> {
        double_value(v)
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Self::Ok> {
        Ok(Value::Base64(v.into()))
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Err(Error::unsupported("cannot serialize `None`: XML-RPC has no nil value"))
    }

    fn serialize_some<T: ?Sized>(self, value: &T) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Err(Error::unsupported("cannot serialize unit-like value: XML-RPC has no nil value"))
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        self.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized>(self, name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        let value = value.serialize(self)?;

        if name == DATETIME_TOKEN {
            if let Some(text) = value.as_str() {
                return parse_datetime(text)
                    .map(Value::DateTime)
                    .ok_or_else(|| Error::unsupported(format!("invalid dateTime {:?}", text)));
            }
        }
        // a `Value::Struct` without members would otherwise come out as an empty array
        if name == STRUCT_TOKEN && value.as_array().map_or(false, <[Value]>::is_empty) {
            return Ok(Value::Struct(BTreeMap::new()));
        }

        Ok(value)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        // enum variant that contains a single, unnamed type
        // we mimic serde_json here and create a struct with a single KV pair
        let value = value.serialize(self)?;

        Ok(Value::Struct(iter::once((variant.to_string(), value)).collect()))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
        Ok(SerializeArray::with_capacity(len.unwrap_or(0)))
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<Self::SerializeTupleStruct> {
        self.serialize_seq(Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Ok(SerializeTupleVariant {
            name: variant,
            values: Vec::with_capacity(len),
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap> {
        Ok(SerializeMap {
            next_key: None,
            entries: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(SerializeStruct {
            fields: BTreeMap::new(),
        })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Ok(SerializeStructVariant {
            variant: variant.to_string(),
            fields: BTreeMap::new(),
        })
    }
}

pub(crate) struct SerializeArray {
    array: Vec<Value>,
}

impl SerializeArray {
    fn with_capacity(cap: usize) -> Self {
        Self {
            array: Vec::with_capacity(cap),
        }
    }

    fn push<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.array.push(value.serialize(Serializer)?);
        Ok(())
    }
}

impl ser::SerializeSeq for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

impl ser::SerializeTuple for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

impl ser::SerializeTupleStruct for SerializeArray {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Array(self.array))
    }
}

pub(crate) struct SerializeTupleVariant {
    name: &'static str,
    values: Vec<Value>,
}

impl ser::SerializeTupleVariant for SerializeTupleVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.values.push(value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Struct(
            iter::once((self.name.to_string(), Value::Array(self.values))).collect(),
        ))
    }
}

/// A map key as seen by `KeySerializer`.
#[derive(Clone, Debug, PartialEq)]
enum MapKey {
    Int(i128),
    Str(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            MapKey::Int(i) => write!(f, "{}", i),
            MapKey::Str(ref s) => f.write_str(s),
        }
    }
}

/// Collects map entries in iteration order, deciding between `<array>` and `<struct>` once the
/// map is complete.
pub(crate) struct SerializeMap {
    next_key: Option<MapKey>,
    entries: Vec<(MapKey, Value)>,
}

impl SerializeMap {
    /// Whether the keys are exactly `0, 1, ..., n-1`, in that order.
    fn is_dense(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(index, (key, _))| *key == MapKey::Int(index as i128))
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T: ?Sized>(&mut self, key: &T) -> Result<()>
    where
        T: Serialize,
    {
        if self.next_key.is_some() {
            return Err(Error::custom("serialize_key called twice in a row"));
        }

        self.next_key = Some(key.serialize(KeySerializer)?);
        Ok(())
    }

    fn serialize_value<T: ?Sized>(&mut self, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        match self.next_key.take() {
            Some(key) => {
                self.entries.push((key, value.serialize(Serializer)?));
                Ok(())
            }
            None => Err(Error::custom("serialize_value called before serialize_key")),
        }
    }

    fn end(self) -> Result<Self::Ok> {
        if self.next_key.is_some() {
            return Err(Error::custom("serialize_key called without serialize_value"));
        }

        if self.is_dense() {
            return Ok(Value::Array(
                self.entries.into_iter().map(|(_, value)| value).collect(),
            ));
        }

        // later entries overwrite earlier ones with the same name
        let map = self
            .entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        Ok(Value::Struct(map))
    }
}

pub(crate) struct SerializeStruct {
    fields: BTreeMap<String, Value>,
}

impl ser::SerializeStruct for SerializeStruct {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.fields.insert(key.to_string(), value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Struct(self.fields))
    }
}

pub(crate) struct SerializeStructVariant {
    variant: String,
    fields: BTreeMap<String, Value>,
}

impl ser::SerializeStructVariant for SerializeStructVariant {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T: ?Sized>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: Serialize,
    {
        self.fields.insert(key.to_string(), value.serialize(Serializer)?);
        Ok(())
    }

    fn end(self) -> Result<Self::Ok> {
        Ok(Value::Struct(
            iter::once((self.variant, Value::Struct(self.fields))).collect(),
        ))
    }
}

/// `Serializer` for map keys. Only supports strings and integers.
struct KeySerializer;

impl ser::Serializer for KeySerializer {
    type Ok = MapKey;
    type Error = Error;
    type SerializeSeq = Impossible<Self::Ok, Self::Error>;
    type SerializeTuple = Impossible<Self::Ok, Self::Error>;
    type SerializeTupleStruct = Impossible<Self::Ok, Self::Error>;
    type SerializeTupleVariant = Impossible<Self::Ok, Self::Error>;
    type SerializeMap = Impossible<Self::Ok, Self::Error>;
    type SerializeStruct = Impossible<Self::Ok, Self::Error>;
    type SerializeStructVariant = Impossible<Self::Ok, Self::Error>;

    fn serialize_bool(self, _v: bool) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_i8(self, v: i8) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_i128(self, v: i128) -> Result<Self::Ok> {
        Ok(MapKey::Int(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Self::Ok> {
        Ok(MapKey::Int(v.into()))
    }

    fn serialize_u128(self, v: u128) -> Result<Self::Ok> {
        // too large to ever be an array index; keep the digits as a struct member name
        Ok(i128::try_from(v).map_or_else(|_| MapKey::Str(v.to_string()), MapKey::Int))
    }

    fn serialize_f32(self, _v: f32) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_f64(self, _v: f64) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_char(self, v: char) -> Result<Self::Ok> {
        Ok(MapKey::Str(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Self::Ok> {
        Ok(MapKey::Str(v.to_string()))
    }

    fn serialize_bytes(self, _v: &[u8]) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_none(self) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_some<T: ?Sized>(self, _value: &T) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_unit(self) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Self::Ok> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Self::Ok> {
        self.serialize_str(variant)
    }

    fn serialize_newtype_struct<T: ?Sized>(self, _name: &'static str, value: &T) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Self::Ok>
    where
        T: Serialize,
    {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Err(Error::key_must_be_string_or_int())
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(Error::key_must_be_string_or_int())
    }
}
