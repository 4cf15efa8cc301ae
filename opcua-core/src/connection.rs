//! Secure Connection record and dense-handle table (spec §3, §4.2, §4.5).
//!
//! Grounded on the teacher's `Endpoint`: a `Vec<Channel>` plus a
//! `Vec<ChannelId>` free-slot list, so ids are stable small integers
//! that get recycled rather than a bidirectional pointer graph.
//! Generalized from the teacher's single always-connected `Channel` to
//! the spec's full per-connection record (chunk context, TCP negotiated
//! properties, TCP sequence counters, protocol state, tokens).

use crate::collaborators::config::ChannelConfig;
use crate::sequence::{PendingRequestTable, ReceiveSequence, RequestIdGenerator, SendSequence};
use crate::state_machine::ConnectionState;
use crate::token::TokenStore;

pub type ChannelId = u32;

/// Properties negotiated during HEL/ACK (spec §4.2): the smaller of
/// what each side offered, per field.
#[derive(Debug, Clone, Copy)]
pub struct NegotiatedProperties {
    pub send_buffer_size: u32,
    pub receive_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

impl NegotiatedProperties {
    /// Take the minimum of the client's offer and the server's own
    /// configured limits, field by field (spec §4.2). A `0` on either
    /// side means "no limit" and loses to any nonzero value.
    pub fn negotiate(offered: &ChannelConfig, local: &ChannelConfig) -> NegotiatedProperties {
        fn min_with_unlimited(a: u32, b: u32) -> u32 {
            match (a, b) {
                (0, x) => x,
                (x, 0) => x,
                (x, y) => x.min(y),
            }
        }
        NegotiatedProperties {
            // The client's send buffer bounds what the server may send
            // back, and vice versa, hence the crossed pairing.
            send_buffer_size: min_with_unlimited(offered.receive_buffer_size, local.send_buffer_size),
            receive_buffer_size: min_with_unlimited(offered.send_buffer_size, local.receive_buffer_size),
            max_message_size: min_with_unlimited(offered.max_message_size, local.max_message_size),
            max_chunk_count: min_with_unlimited(offered.max_chunk_count, local.max_chunk_count),
        }
    }
}

/// A connection's full record (spec §3 Data Model).
pub struct SecureConnection {
    pub state: ConnectionState,
    pub negotiated: Option<NegotiatedProperties>,
    pub secure_channel_id: Option<u32>,
    pub tokens: TokenStore,
    pub send_sequence: SendSequence,
    pub receive_sequence: ReceiveSequence,
    pub request_ids: RequestIdGenerator,
    pub pending_requests: PendingRequestTable,
    /// Wall-clock timestamp (ms) of the last byte received on this
    /// connection, used for the SPEC_FULL §F item 2 keepalive/timeout
    /// check.
    pub last_activity_ms: u64,
}

impl SecureConnection {
    pub fn new(now_ms: u64) -> SecureConnection {
        SecureConnection {
            state: ConnectionState::TcpInit,
            negotiated: None,
            secure_channel_id: None,
            tokens: TokenStore::new(),
            send_sequence: SendSequence::new(),
            receive_sequence: ReceiveSequence::new(),
            request_ids: RequestIdGenerator::new(),
            pending_requests: PendingRequestTable::new(),
            last_activity_ms: now_ms,
        }
    }

    /// Reset to a freshly-allocated connection's state, for slot reuse
    /// (spec §4.5 listener recycling a freed slot).
    pub fn reset(&mut self, now_ms: u64) {
        *self = SecureConnection::new(now_ms);
    }

    pub fn is_timed_out(&self, now_ms: u64, timeout_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_activity_ms) >= timeout_ms
    }

    /// Fold a successfully decoded chunk's token id into the overlap
    /// window's message-triggered close condition (spec §4.2): the
    /// first MSG stamped with the current token ends a renewal's
    /// overlap immediately, rather than waiting on the timer-based
    /// `TokenStore::retire_expired_previous`.
    pub fn on_message_received(&mut self, token_id: u32) {
        self.tokens.note_message_under(token_id);
    }
}

/// Fixed-capacity table of connections, indexed by dense `ChannelId`,
/// with a free-slot stack for id reuse (spec §4.5, grounded on the
/// teacher's `Endpoint::{new_channel, reclaim_channel}`).
pub struct ConnectionTable {
    connections: Vec<Option<SecureConnection>>,
    free_slots: Vec<ChannelId>,
    capacity: usize,
}

impl ConnectionTable {
    pub fn with_capacity(capacity: usize) -> ConnectionTable {
        ConnectionTable { connections: Vec::new(), free_slots: Vec::new(), capacity }
    }

    pub fn len(&self) -> usize {
        self.connections.iter().filter(|c| c.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocate a slot for a newly-accepted connection, recycling a
    /// freed one if available. Returns `None` if the table is already
    /// at `capacity` (spec §4.5 "not enough resources").
    pub fn allocate(&mut self, now_ms: u64) -> Option<ChannelId> {
        if let Some(id) = self.free_slots.pop() {
            self.connections[id as usize] = Some(SecureConnection::new(now_ms));
            return Some(id);
        }
        if self.connections.len() >= self.capacity {
            return None;
        }
        let id = self.connections.len() as ChannelId;
        self.connections.push(Some(SecureConnection::new(now_ms)));
        Some(id)
    }

    pub fn get(&self, id: ChannelId) -> Option<&SecureConnection> {
        self.connections.get(id as usize).and_then(|c| c.as_ref())
    }

    pub fn get_mut(&mut self, id: ChannelId) -> Option<&mut SecureConnection> {
        self.connections.get_mut(id as usize).and_then(|c| c.as_mut())
    }

    /// Free `id`'s slot for reuse; the connection's own state is
    /// dropped, not recycled, since the spec mandates a fresh state
    /// machine for each accepted TCP connection (spec §4.2 TCP_INIT).
    pub fn release(&mut self, id: ChannelId) {
        if let Some(slot) = self.connections.get_mut(id as usize) {
            *slot = None;
            self.free_slots.push(id);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelId, &SecureConnection)> {
        self.connections
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as ChannelId, c)))
    }
}
