//! Defines error types used by this library.

use crate::Fault;

use thiserror::Error as ThisError;
use xml::common::TextPosition;
use xml::reader::Error as XmlError;

use std::error::Error as StdError;

/// Boxed error returned by a [`Transport`](crate::Transport).
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// An error that can occur when building, sending, or evaluating an XML-RPC call.
///
/// If the server sends a well-formed `<fault>` response, the call fails with [`Error::Fault`].
/// All other variants indicate that the call could not be performed or understood.
#[derive(Debug, ThisError)]
pub enum Error {
    /// An argument could not be mapped onto any XML-RPC type.
    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    /// The transport failed to deliver the request or to return a response.
    #[error("transport error: {0}")]
    Transport(BoxError),

    /// The response could not be parsed. This can happen when the server doesn't correctly
    /// implement the XML-RPC spec.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The server returned a `<fault>` response.
    #[error("server returned a fault: {0}")]
    Fault(#[from] Fault),
}

impl Error {
    /// If this error was caused by the server responding with a `<fault>` response,
    /// returns the `Fault` in question.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            Error::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    pub(crate) fn unsupported<T: ToString>(what: T) -> Self {
        Error::UnsupportedType(what.to_string())
    }
}

/// Describes possible errors that can occur when parsing a response.
#[derive(Debug, ThisError)]
pub enum ParseError {
    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] XmlError),

    /// Found a tag, text or attribute that has no place in an XML-RPC response.
    #[error("unexpected XML at {position} (expected {expected}, found {found})")]
    UnexpectedXml {
        /// A short description of what was expected.
        expected: String,
        /// A short description of what was found instead.
        found: String,
        /// The position of the unexpected data inside the XML document.
        position: TextPosition,
    },

    /// A `<dateTime.iso8601>` did not follow the `YYYYMMDDTHH:MM:SS` layout.
    #[error("malformed dateTime.iso8601 at {position}: {found:?}")]
    MalformedDate {
        found: String,
        position: TextPosition,
    },

    /// A `<base64>` did not contain valid base64 data.
    #[error("malformed base64 at {position}: {found:?}")]
    MalformedBinary {
        found: String,
        position: TextPosition,
    },

    /// Could not parse the text of a numeric value.
    ///
    /// For example, `<value><int>AAA</int></value>` describes an invalid value.
    #[error("invalid value for type '{for_type}' at {position}: {found:?}")]
    InvalidValue {
        /// The type for which an invalid value was supplied (`int` or `double`).
        for_type: &'static str,
        /// The value we encountered, as a string.
        found: String,
        /// The position of the invalid value inside the XML document.
        position: TextPosition,
    },
}

impl ParseError {
    /// Returns `true` if the document as a whole is unusable: it is either not well-formed XML,
    /// or not shaped like an XML-RPC `<methodResponse>`.
    ///
    /// Returns `false` when the document is structurally fine but a scalar's content does not
    /// match its declared type.
    pub fn is_malformed_document(&self) -> bool {
        matches!(self, ParseError::Xml(_) | ParseError::UnexpectedXml { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_accessor() {
        let err = Error::from(Fault::new(3, "nope"));
        assert_eq!(err.fault(), Some(&Fault::new(3, "nope")));
        assert_eq!(err.to_string(), "server returned a fault: nope (3)");

        assert!(Error::unsupported("unit").fault().is_none());
    }
}
