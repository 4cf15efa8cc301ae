//! Services facade (spec §4.7, §9 "dynamic message dispatch"). The core
//! has no information model and executes no service; every decoded
//! application message (everything that isn't OPN/CLO) is handed to
//! this trait as an opaque body, including `GetEndpoints`-style
//! discovery requests (SPEC_FULL §F item 3).

use crate::codec::NodeId;
use crate::status::StatusCode;

pub trait Services {
    /// A fully-formed application message arrived on `channel_id`,
    /// identified by its wire type id, with the still-encoded body.
    /// The core has already validated framing, sequencing and security;
    /// everything past that point is this trait's responsibility.
    fn on_message(&mut self, channel_id: u32, request_id: u32, type_id: NodeId, body: &[u8]);

    /// The connection on `channel_id` was closed (locally or by the
    /// peer) with `reason`; Services may release any session state tied
    /// to it.
    fn on_connection_closed(&mut self, channel_id: u32, reason: StatusCode);
}
