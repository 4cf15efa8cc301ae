//! Parameter/resource error taxonomy (spec §7). Never crosses the wire —
//! `status::StatusCode` is what gets reported to a peer or to Services.
//!
//! Mirrors the teacher's hand-rolled `net::result::Error` / `net::error::Error`:
//! a flat enum with unit variants and a manual `From<io::Error>`, no
//! error-handling crate.
use std::io;

use crate::status::StatusCode;

#[derive(Debug, Eq, PartialEq)]
pub enum CoreError {
    InvalidParameter,
    OutOfMemory,
    Closed,
    Io(io::ErrorKind),
    Status(StatusCodeKey),
}

/// `StatusCode` isn't `Eq`/`Hash` friendly for embedding directly (it may
/// grow fields later); store the discriminant name instead.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub struct StatusCodeKey(pub &'static str);

impl From<StatusCode> for CoreError {
    fn from(code: StatusCode) -> Self {
        CoreError::Status(StatusCodeKey(code.name()))
    }
}

impl From<io::Error> for CoreError {
    fn from(io_error: io::Error) -> Self {
        CoreError::Io(io_error.kind())
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
