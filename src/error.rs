//! Error types for the CLICK driver
//!
//! Errors fall into two families:
//!
//! - **Validation** errors ([`PlcError::Address`], [`PlcError::Value`]) are raised
//!   locally, before any request reaches the PLC. The driver stays usable.
//! - **Transport** errors ([`PlcError::Io`], [`PlcError::Timeout`], ...) come from
//!   the connection and are passed through unchanged.
//!
//! [`PlcError::TagTable`] is raised only while loading a tag table and is fatal to
//! that load attempt.

use std::io;

use thiserror::Error;

/// Result alias used across the crate.
pub type PlcResult<T> = Result<T, PlcError>;

/// Errors produced by the driver and its Modbus plumbing.
#[derive(Error, Debug)]
pub enum PlcError {
    /// Address spec could not be parsed, names an unsupported category,
    /// or lies outside the category bounds.
    #[error("{message}")]
    Address { message: String },

    /// Value does not match the category type, or does not fit the range.
    #[error("{message}")]
    Value { message: String },

    /// Tag table rejected at load time.
    #[error("{message}")]
    TagTable { message: String },

    /// Invalid driver configuration.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Connection could not be established or was lost.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Request did not complete in time.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout { operation: String, timeout_ms: u64 },

    /// Malformed frame or unexpected response.
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// PLC answered with a Modbus exception.
    #[error("Modbus exception: function={function:#04x} code={code:#04x} ({message})")]
    Exception {
        function: u8,
        code: u8,
        message: String,
    },

    /// Request payload rejected before it was framed.
    #[error("Invalid data: {message}")]
    InvalidData { message: String },
}

impl PlcError {
    /// Address parse or bounds error.
    pub fn address<S: Into<String>>(message: S) -> Self {
        PlcError::Address {
            message: message.into(),
        }
    }

    /// Value type or length error.
    pub fn value<S: Into<String>>(message: S) -> Self {
        PlcError::Value {
            message: message.into(),
        }
    }

    /// Tag table schema error.
    pub fn tag_table<S: Into<String>>(message: S) -> Self {
        PlcError::TagTable {
            message: message.into(),
        }
    }

    pub fn configuration<S: Into<String>>(message: S) -> Self {
        PlcError::Configuration {
            message: message.into(),
        }
    }

    pub fn connection<S: Into<String>>(message: S) -> Self {
        PlcError::Connection {
            message: message.into(),
        }
    }

    pub fn timeout<S: Into<String>>(operation: S, timeout_ms: u64) -> Self {
        PlcError::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn protocol<S: Into<String>>(message: S) -> Self {
        PlcError::Protocol {
            message: message.into(),
        }
    }

    pub fn invalid_data<S: Into<String>>(message: S) -> Self {
        PlcError::InvalidData {
            message: message.into(),
        }
    }

    /// Build an exception error from the raw exception code.
    pub fn exception(function: u8, code: u8) -> Self {
        PlcError::Exception {
            function,
            code,
            message: exception_description(code).to_string(),
        }
    }

    /// True for errors raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, PlcError::Address { .. } | PlcError::Value { .. })
    }

    /// True for errors raised by the connection or the PLC itself.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            PlcError::Io(_)
                | PlcError::Connection { .. }
                | PlcError::Timeout { .. }
                | PlcError::Protocol { .. }
                | PlcError::Exception { .. }
        )
    }
}

fn exception_description(code: u8) -> &'static str {
    use crate::constants::*;
    match code {
        EXCEPTION_ILLEGAL_FUNCTION => "illegal function",
        EXCEPTION_ILLEGAL_DATA_ADDRESS => "illegal data address",
        EXCEPTION_ILLEGAL_DATA_VALUE => "illegal data value",
        EXCEPTION_SERVER_DEVICE_FAILURE => "server device failure",
        EXCEPTION_ACKNOWLEDGE => "acknowledge",
        EXCEPTION_SERVER_DEVICE_BUSY => "server device busy",
        EXCEPTION_MEMORY_PARITY_ERROR => "memory parity error",
        EXCEPTION_GATEWAY_PATH_UNAVAILABLE => "gateway path unavailable",
        EXCEPTION_GATEWAY_TARGET_FAILED => "gateway target failed to respond",
        _ => "unknown exception",
    }
}
