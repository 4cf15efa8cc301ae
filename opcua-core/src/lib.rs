//! OPC UA TCP transport and Secure Conversation core.
//!
//! Implements the UACP framing handshake (`HEL`/`ACK`/`ERR`), the
//! Secure Conversation chunk layer (signing, encryption, sequencing)
//! and the connection state machine that drives `OpenSecureChannel`
//! issue/renew and `CloseSecureChannel`. Has no information model and
//! executes no service itself — see `collaborators` for the seams
//! where an embedder plugs in a socket, a crypto backend, the service
//! layer and configuration.

pub mod buffer;
pub mod chunk;
pub mod codec;
pub mod collaborators;
pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod logging;
pub mod messages;
pub mod sequence;
pub mod state_machine;
pub mod status;
pub mod token;

pub use error::{CoreError, Result};
pub use status::StatusCode;
