//! XML-RPC response parser.
//!
//! The document is consumed as a flat stream of `xml-rs` events. Every element that carries
//! meaning gets a `Frame` pushed onto an explicit stack when it opens; when it closes, the frame is
//! popped and its result is handed to the frame below. Nesting depth is therefore only limited by
//! memory, not by the call stack.

use crate::error::ParseError;
use crate::utils::parse_datetime;
use crate::{Fault, Value};

use tracing::{debug, trace};
use xml::common::{Position, TextPosition};
use xml::reader::{EventReader, XmlEvent};
use xml::ParserConfig;

use std::collections::BTreeMap;
use std::io::Read;

pub type ParseResult<T> = Result<T, ParseError>;

/// The outcome of an XML-RPC call: the values of all `<param>`s in document order, or the
/// `<fault>` sent by the server.
pub type Response = Result<Vec<Value>, Fault>;

/// The scalar type declared by a type tag inside `<value>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Scalar {
    String,
    Int,
    Boolean,
    Double,
    DateTime,
    Base64,
}

impl Scalar {
    /// Unknown type tags are read as strings.
    fn from_tag(tag: &str) -> Self {
        match tag {
            "int" | "i4" => Scalar::Int,
            "boolean" => Scalar::Boolean,
            "double" => Scalar::Double,
            "dateTime.iso8601" => Scalar::DateTime,
            "base64" => Scalar::Base64,
            _ => Scalar::String,
        }
    }
}

/// How far an `<array>` has progressed through its single `<data>` child.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Data {
    Before,
    Inside,
    After,
}

/// An element that has been opened but not yet closed.
#[derive(Debug)]
enum Frame {
    Response { outcome: Option<Response> },
    Params { values: Vec<Value> },
    Param { value: Option<Value> },
    Fault { value: Option<Value> },
    /// `<value>`: either receives a typed child, or resolves to its own text.
    Value { text: String, typed: Option<Value> },
    Scalar { kind: Scalar, tag: String, text: String },
    Array { items: Vec<Value>, data: Data },
    Struct { members: BTreeMap<String, Value> },
    /// `<member>`: `<name>` and `<value>` may come in either order.
    Member { name: Option<String>, value: Option<Value> },
    Name { text: String },
}

impl Frame {
    /// Describes what this frame accepts next, for error messages.
    fn expected(&self) -> String {
        match *self {
            Frame::Response { outcome: None } => "<params> or <fault>".into(),
            Frame::Response { .. } => "</methodResponse>".into(),
            Frame::Params { .. } => "<param> or </params>".into(),
            Frame::Param { value: None } | Frame::Fault { value: None } => "<value>".into(),
            Frame::Param { .. } => "</param>".into(),
            Frame::Fault { .. } => "</fault>".into(),
            Frame::Value { typed: None, .. } => "type tag or characters".into(),
            Frame::Value { .. } => "</value>".into(),
            Frame::Scalar { ref tag, .. } => format!("characters or </{}>", tag),
            Frame::Array { data: Data::Before, .. } => "<data>".into(),
            Frame::Array { data: Data::Inside, .. } => "<value> or </data>".into(),
            Frame::Array { .. } => "</array>".into(),
            Frame::Struct { .. } => "<member> or </struct>".into(),
            Frame::Member { name: None, value: None } => "<name> or <value>".into(),
            Frame::Member { name: None, .. } => "<name>".into(),
            Frame::Member { value: None, .. } => "<value>".into(),
            Frame::Member { .. } => "</member>".into(),
            Frame::Name { .. } => "characters or </name>".into(),
        }
    }
}

fn unexpected<E: ToString, F: ToString>(expected: E, found: F, position: TextPosition) -> ParseError {
    ParseError::UnexpectedXml {
        expected: expected.to_string(),
        found: found.to_string(),
        position,
    }
}

pub struct Parser<'a, R: Read + 'a> {
    reader: EventReader<&'a mut R>,
    stack: Vec<Frame>,
    result: Option<Response>,
}

impl<'a, R: Read> Parser<'a, R> {
    pub fn new(reader: &'a mut R) -> Self {
        let config = ParserConfig::new()
            .cdata_to_characters(true)
            .coalesce_characters(true);

        Parser {
            reader: EventReader::new_with_config(reader, config),
            stack: Vec::new(),
            result: None,
        }
    }

    fn parse_response(mut self) -> ParseResult<Response> {
        loop {
            match self.reader.next()? {
                XmlEvent::StartElement { name, attributes, .. } => {
                    if !attributes.is_empty() {
                        let position = self.reader.position();
                        return Err(unexpected(
                            format!("tag <{}> without attributes", name.local_name),
                            format!("attribute {}", attributes[0].name),
                            position,
                        ));
                    }
                    self.open(&name.local_name)?;
                }
                XmlEvent::EndElement { name } => self.close(&name.local_name)?,
                XmlEvent::Characters(text) | XmlEvent::Whitespace(text) | XmlEvent::CData(text) => {
                    self.text(text)?;
                }
                XmlEvent::EndDocument => break,
                _ => {} // declarations, comments, processing instructions
            }
        }

        let position = self.reader.position();
        self.result
            .take()
            .ok_or_else(|| unexpected("<methodResponse>", "end of document", position))
    }

    /// Handles an opening tag by pushing the frame it starts.
    fn open(&mut self, tag: &str) -> ParseResult<()> {
        let position = self.reader.position();

        let frame = match (self.stack.last_mut(), tag) {
            (None, "methodResponse") => Frame::Response { outcome: None },
            (None, _) => return Err(unexpected("<methodResponse>", format!("<{}>", tag), position)),

            (Some(Frame::Response { outcome: None }), "params") => Frame::Params { values: Vec::new() },
            (Some(Frame::Response { outcome: None }), "fault") => Frame::Fault { value: None },
            (Some(Frame::Params { .. }), "param") => Frame::Param { value: None },

            (Some(Frame::Param { value: None }), "value")
            | (Some(Frame::Fault { value: None }), "value")
            | (Some(Frame::Array { data: Data::Inside, .. }), "value")
            | (Some(Frame::Member { value: None, .. }), "value") => Frame::Value {
                text: String::new(),
                typed: None,
            },

            (Some(Frame::Value { typed: None, .. }), "array") => Frame::Array {
                items: Vec::new(),
                data: Data::Before,
            },
            (Some(Frame::Array { data, .. }), "data") if *data == Data::Before => {
                *data = Data::Inside;
                return Ok(());
            }
            (Some(Frame::Value { typed: None, .. }), "struct") => Frame::Struct {
                members: BTreeMap::new(),
            },
            (Some(Frame::Struct { .. }), "member") => Frame::Member {
                name: None,
                value: None,
            },
            (Some(Frame::Member { name: None, .. }), "name") => Frame::Name { text: String::new() },
            (Some(Frame::Value { typed: None, .. }), _) => Frame::Scalar {
                kind: Scalar::from_tag(tag),
                tag: tag.to_string(),
                text: String::new(),
            },

            (Some(frame), _) => {
                return Err(unexpected(frame.expected(), format!("<{}>", tag), position))
            }
        };

        self.stack.push(frame);
        Ok(())
    }

    /// Handles character data. Only `<value>`, scalar type tags and `<name>` carry text; elsewhere
    /// only whitespace is tolerated.
    fn text(&mut self, chars: String) -> ParseResult<()> {
        let position = self.reader.position();

        match self.stack.last_mut() {
            Some(Frame::Value { text, .. })
            | Some(Frame::Scalar { text, .. })
            | Some(Frame::Name { text }) => {
                text.push_str(&chars);
                Ok(())
            }
            _ if chars.trim().is_empty() => Ok(()),
            Some(frame) => Err(unexpected(frame.expected(), format!("text {:?}", chars), position)),
            // `xml-rs` rejects text outside of the root element itself
            None => Ok(()),
        }
    }

    /// Handles a closing tag by popping its frame and handing the result to the enclosing frame.
    fn close(&mut self, tag: &str) -> ParseResult<()> {
        let position = self.reader.position();

        // `<data>` has no frame of its own; anywhere else it is an ordinary (unknown) type tag
        if let Some(Frame::Array { data, .. }) = self.stack.last_mut() {
            if tag == "data" && *data == Data::Inside {
                *data = Data::After;
                return Ok(());
            }
        }

        let frame = match self.stack.pop() {
            Some(frame) => frame,
            None => return Err(unexpected("<methodResponse>", format!("</{}>", tag), position)),
        };

        match frame {
            Frame::Response { outcome } => {
                let outcome = outcome
                    .ok_or_else(|| unexpected("<params> or <fault>", "</methodResponse>", position))?;
                self.result = Some(outcome);
            }
            Frame::Params { values } => match self.stack.last_mut() {
                Some(Frame::Response { outcome }) => *outcome = Some(Ok(values)),
                _ => return Err(unexpected("<methodResponse>", "</params>", position)),
            },
            Frame::Param { value } => {
                let value = value.ok_or_else(|| unexpected("<value>", "</param>", position))?;
                match self.stack.last_mut() {
                    Some(Frame::Params { values }) => values.push(value),
                    _ => return Err(unexpected("<params>", "</param>", position)),
                }
            }
            Frame::Fault { value } => {
                let value = value.ok_or_else(|| unexpected("<value>", "</fault>", position))?;
                let fault = Fault::from_value(&value);
                match self.stack.last_mut() {
                    Some(Frame::Response { outcome }) => *outcome = Some(Err(fault)),
                    _ => return Err(unexpected("<methodResponse>", "</fault>", position)),
                }
            }
            Frame::Value { text, typed } => {
                let value = match typed {
                    Some(_) if !text.trim().is_empty() => {
                        return Err(unexpected("a single typed value", format!("text {:?}", text), position));
                    }
                    Some(value) => value,
                    // untyped (or empty) `<value>`s are strings
                    None => Value::String(text),
                };
                self.finish_value(value, position)?;
            }
            Frame::Scalar { kind, text, .. } => {
                let value = convert(kind, text, position)?;
                self.finish_typed(value, tag, position)?;
            }
            Frame::Array { items, data } => {
                if data != Data::After {
                    return Err(unexpected("<data>", "</array>", position));
                }
                self.finish_typed(Value::Array(items), tag, position)?;
            }
            Frame::Struct { members } => {
                self.finish_typed(Value::Struct(members), tag, position)?;
            }
            Frame::Member { name, value } => match (name, value) {
                (Some(name), Some(value)) => match self.stack.last_mut() {
                    Some(Frame::Struct { members }) => {
                        // a repeated name overwrites the earlier member
                        members.insert(name, value);
                    }
                    _ => return Err(unexpected("<struct>", "</member>", position)),
                },
                (name, value) => {
                    let missing = Frame::Member { name, value }.expected();
                    return Err(unexpected(missing, "</member>", position));
                }
            },
            Frame::Name { text } => match self.stack.last_mut() {
                Some(Frame::Member { name, .. }) => *name = Some(text),
                _ => return Err(unexpected("<member>", "</name>", position)),
            },
        }

        Ok(())
    }

    /// Stores a resolved `<value>` in whatever element contains it.
    fn finish_value(&mut self, value: Value, position: TextPosition) -> ParseResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Param { value: slot })
            | Some(Frame::Fault { value: slot })
            | Some(Frame::Member { value: slot, .. }) => *slot = Some(value),
            Some(Frame::Array { items, .. }) => items.push(value),
            _ => return Err(unexpected("<param>, <fault>, <data> or <member>", "</value>", position)),
        }
        Ok(())
    }

    /// Stores the result of a type tag in its enclosing `<value>`.
    fn finish_typed(&mut self, value: Value, tag: &str, position: TextPosition) -> ParseResult<()> {
        match self.stack.last_mut() {
            Some(Frame::Value { typed, .. }) => {
                *typed = Some(value);
                Ok(())
            }
            _ => Err(unexpected("<value>", format!("</{}>", tag), position)),
        }
    }
}

/// Converts the text of a type tag into a value of the declared type.
fn convert(kind: Scalar, text: String, position: TextPosition) -> ParseResult<Value> {
    fn invalid_value(for_type: &'static str, found: String, position: TextPosition) -> ParseError {
        ParseError::InvalidValue {
            for_type,
            found,
            position,
        }
    }

    let value = match kind {
        Scalar::String => Value::String(text),
        // "You can include a plus or minus at the beginning of a string of numeric characters."
        Scalar::Int => match text.trim().parse::<i32>() {
            Ok(i) => Value::Int(i),
            Err(_) => return Err(invalid_value("int", text, position)),
        },
        Scalar::Boolean => Value::Bool(text.trim() == "1"),
        Scalar::Double => match text.trim().parse::<f64>() {
            Ok(d) => Value::Double(d),
            Err(_) => return Err(invalid_value("double", text, position)),
        },
        Scalar::DateTime => match parse_datetime(text.trim()) {
            Some(date_time) => Value::DateTime(date_time),
            None => return Err(ParseError::MalformedDate { found: text, position }),
        },
        Scalar::Base64 => {
            // servers like to wrap long base64 lines
            let mut compact = text;
            compact.retain(|c| !c.is_ascii_whitespace());
            match base64::decode(&compact) {
                Ok(data) => Value::Base64(data),
                Err(_) => return Err(ParseError::MalformedBinary { found: compact, position }),
            }
        }
    };

    Ok(value)
}

/// Parses a response from an XML reader.
pub fn parse_response<R: Read>(reader: &mut R) -> ParseResult<Response> {
    let result = Parser::new(reader).parse_response();

    match result {
        Ok(Ok(ref values)) => trace!("parsed response with {} value(s)", values.len()),
        Ok(Err(ref fault)) => trace!("parsed fault response: {}", fault),
        Err(ref err) => debug!("could not parse response: {}", err),
    }

    result
}

/// Parses a response held in memory.
pub fn parse_response_str(xml: &str) -> ParseResult<Response> {
    parse_response(&mut xml.as_bytes())
}
