//! Sequence and request-id bookkeeping (spec §4.2, §4.3, §6).
//!
//! Covers three distinct counters a connection carries: the send-side
//! sequence number (stamped on every outgoing chunk), the receive-side
//! sequence number (validated against the wrap-around exemption), and
//! the client-side pending-request table keyed by request id. Grounded
//! on the teacher's `net::channel` slot bookkeeping for the counter
//! shape, and on `indexmap` (already in the dependency table for its
//! ordering guarantee) for the pending-request table so iteration order
//! matches request-issue order, which is handy when logging stuck
//! requests in FIFO order.

use indexmap::IndexMap;

use crate::status::StatusCode;

/// Sequence numbers and request ids both live in `[1, UINT32_MAX]` and
/// wrap back to `1`, never `0` (spec §6).
const WRAP_LIMIT: u32 = u32::MAX;

/// The window, relative to `UINT32_MAX`, inside which a lower received
/// sequence number is still accepted as a legitimate wrap rather than a
/// replay (spec §4.3).
const WRAP_TOLERANCE: u32 = 1024;

fn next_in_cycle(current: u32) -> u32 {
    if current >= WRAP_LIMIT {
        1
    } else {
        current + 1
    }
}

/// Send-side sequence counter for one connection.
#[derive(Debug, Default)]
pub struct SendSequence {
    last: u32,
}

impl SendSequence {
    pub fn new() -> SendSequence {
        SendSequence { last: 0 }
    }

    /// Produce the next sequence number to stamp on an outgoing chunk.
    pub fn next(&mut self) -> u32 {
        self.last = next_in_cycle(self.last);
        self.last
    }

    pub fn last(&self) -> u32 {
        self.last
    }
}

/// Receive-side sequence tracker, implementing the wrap-around exemption
/// from spec §4.3: a connection tracks the last sequence number it
/// accepted; the next one must be exactly one greater, UNLESS the last
/// one was within `WRAP_TOLERANCE` of `UINT32_MAX` and the new one is
/// within `WRAP_TOLERANCE` of `1`, in which case a wrap is legitimate.
#[derive(Debug)]
pub struct ReceiveSequence {
    last: Option<u32>,
}

impl ReceiveSequence {
    pub fn new() -> ReceiveSequence {
        ReceiveSequence { last: None }
    }

    /// Validate and, if accepted, record `received` as the new last
    /// sequence number.
    pub fn accept(&mut self, received: u32) -> Result<(), StatusCode> {
        match self.last {
            None => {
                self.last = Some(received);
                Ok(())
            }
            Some(last) => {
                let expected = next_in_cycle(last);
                let is_exempted_wrap =
                    last > WRAP_LIMIT - WRAP_TOLERANCE && received < WRAP_TOLERANCE;
                if received == expected || is_exempted_wrap {
                    self.last = Some(received);
                    Ok(())
                } else {
                    Err(StatusCode::BadSequenceNumberInvalid)
                }
            }
        }
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }
}

/// Request-id generator: `(last + 1) mod UINT32_MAX`, wrapping `0 -> 1`
/// (spec §6). Used client-side when issuing a new request.
#[derive(Debug, Default)]
pub struct RequestIdGenerator {
    last: u32,
}

impl RequestIdGenerator {
    pub fn new() -> RequestIdGenerator {
        RequestIdGenerator { last: 0 }
    }

    pub fn next(&mut self) -> u32 {
        self.last = next_in_cycle(self.last);
        self.last
    }
}

/// What a pending request is waiting for: the identity it was issued
/// under, for diagnostic/timeout reporting. The Services layer owns the
/// actual typed response; the core only needs enough to validate a
/// response is expected and time it out (spec §4.6 Design Note,
/// §9 SPEC_FULL supplement: request-timeout bookkeeping).
#[derive(Debug, Clone, Copy)]
pub struct PendingRequest {
    pub issued_at_ms: u64,
}

/// FIFO-ordered table of in-flight requests, keyed by request id.
/// `IndexMap` preserves insertion order so a full scan for expired
/// requests naturally visits the oldest first.
#[derive(Debug, Default)]
pub struct PendingRequestTable {
    pending: IndexMap<u32, PendingRequest>,
}

impl PendingRequestTable {
    pub fn new() -> PendingRequestTable {
        PendingRequestTable { pending: IndexMap::new() }
    }

    pub fn insert(&mut self, request_id: u32, issued_at_ms: u64) {
        self.pending.insert(request_id, PendingRequest { issued_at_ms });
    }

    /// Remove and return the pending entry for `request_id`, if any —
    /// called when a matching response arrives.
    pub fn take(&mut self, request_id: u32) -> Option<PendingRequest> {
        self.pending.shift_remove(&request_id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Collect request ids whose `issued_at_ms` is older than
    /// `now_ms - timeout_ms`, oldest first.
    pub fn expired(&self, now_ms: u64, timeout_ms: u64) -> Vec<u32> {
        self.pending
            .iter()
            .filter(|(_, req)| now_ms.saturating_sub(req.issued_at_ms) >= timeout_ms)
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn remove(&mut self, request_id: u32) {
        self.pending.shift_remove(&request_id);
    }
}
