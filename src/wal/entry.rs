//! WAL Entry definitions
//!
//! Defines the structure of individual log records and their text encoding.

use std::fmt;

use crate::error::{EmberError, Result};

/// Field delimiter shared by the log and snapshot encodings
pub const DELIMITER: char = ' ';

const PUT_TAG: &str = "PUT";
const DELETE_TAG: &str = "DELETE";

/// A single record in the WAL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Sequence number - monotonically increasing, starting at 0
    pub sequence: u64,

    /// The operation to perform
    pub operation: Operation,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Put a key-value pair
    Put { key: String, value: String },

    /// Delete a key
    Delete { key: String },
}

impl Operation {
    /// Key touched by this operation
    pub fn key(&self) -> &str {
        match self {
            Operation::Put { key, .. } | Operation::Delete { key } => key,
        }
    }

    /// Check that the operation can be encoded without ambiguity
    pub fn validate(&self) -> Result<()> {
        validate_key(self.key())?;
        if let Operation::Put { value, .. } = self {
            validate_value(value)?;
        }
        Ok(())
    }
}

impl LogRecord {
    pub fn new(sequence: u64, operation: Operation) -> Self {
        Self {
            sequence,
            operation,
        }
    }

    /// Encode as one log line, including the trailing newline
    ///
    /// `<sequence> PUT <key> <value>` or `<sequence> DELETE <key>`
    pub fn encode(&self) -> String {
        format!("{}\n", self)
    }

    /// Parse one log line (without its newline)
    ///
    /// `line_no` is 1-based and only used for error reporting.
    pub fn parse(line: &str, line_no: u64) -> Result<Self> {
        let malformed = |reason: String| EmberError::MalformedRecord {
            origin: "log",
            line: line_no,
            reason,
        };

        let mut fields = line.splitn(4, DELIMITER);

        let sequence = fields
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| malformed("missing sequence number".to_string()))?;
        let sequence: u64 = sequence
            .parse()
            .map_err(|_| malformed(format!("invalid sequence number {:?}", sequence)))?;

        let tag = fields
            .next()
            .ok_or_else(|| malformed("missing operation".to_string()))?;

        let key = fields
            .next()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| malformed("missing key".to_string()))?;
        if key.chars().any(char::is_whitespace) {
            return Err(malformed(format!("key {:?} contains whitespace", key)));
        }

        let operation = match (tag, fields.next()) {
            (PUT_TAG, Some(value)) => {
                if value.chars().any(char::is_whitespace) {
                    return Err(malformed("value contains a delimiter".to_string()));
                }
                Operation::Put {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            (PUT_TAG, None) => return Err(malformed("PUT without value".to_string())),
            (DELETE_TAG, None) => Operation::Delete {
                key: key.to_string(),
            },
            (DELETE_TAG, Some(_)) => {
                return Err(malformed("DELETE with trailing value".to_string()))
            }
            (other, _) => return Err(malformed(format!("unknown operation {:?}", other))),
        };

        Ok(Self::new(sequence, operation))
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.operation {
            Operation::Put { key, value } => {
                write!(f, "{} {} {} {}", self.sequence, PUT_TAG, key, value)
            }
            Operation::Delete { key } => write!(f, "{} {} {}", self.sequence, DELETE_TAG, key),
        }
    }
}

/// Keys must be non-empty and free of whitespace
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.chars().any(char::is_whitespace) {
        return Err(EmberError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Values may be empty but must be free of whitespace
pub fn validate_value(value: &str) -> Result<()> {
    if value.chars().any(char::is_whitespace) {
        return Err(EmberError::InvalidValue(value.to_string()));
    }
    Ok(())
}
