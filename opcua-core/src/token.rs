//! Security token lifecycle (spec §4.2, §4.3; SPEC_FULL §F item 1 and
//! item 4).
//!
//! A connection carries at most two live symmetric tokens at once: the
//! current one and, during the brief overlap after a renew, the
//! previous one. Grounded on the teacher's `net::channel` dense-id
//! allocation pattern (collision-checked generation with a bounded
//! retry count) applied here to token ids instead of channel ids.

use crate::error::{CoreError, Result};

/// Bounded retries when generating a fresh token or channel id that must
/// not collide with one already in use (SPEC_FULL §F item 4).
const ID_GENERATION_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurityToken {
    pub secure_channel_id: u32,
    pub token_id: u32,
    pub created_at_ms: u64,
    pub revised_lifetime_ms: u32,
}

impl SecurityToken {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_at_ms) >= self.revised_lifetime_ms as u64
    }
}

/// Current/previous token pair plus the renewal-in-progress flag (spec
/// §4.2: `serverNewTokenActive` gates whether the server has started
/// accepting the new token for sending while still decoding with the
/// old one).
#[derive(Debug, Default)]
pub struct TokenStore {
    current: Option<SecurityToken>,
    previous: Option<SecurityToken>,
    server_new_token_active: bool,
}

impl TokenStore {
    pub fn new() -> TokenStore {
        TokenStore { current: None, previous: None, server_new_token_active: false }
    }

    pub fn current(&self) -> Option<SecurityToken> {
        self.current
    }

    pub fn previous(&self) -> Option<SecurityToken> {
        self.previous
    }

    /// Install the very first token for a freshly-issued channel.
    pub fn activate_initial(&mut self, token: SecurityToken) {
        self.current = Some(token);
        self.previous = None;
        self.server_new_token_active = false;
    }

    /// Install a renewed token: the old current becomes previous so
    /// in-flight messages signed/encrypted under it still decode (spec
    /// §4.2 OPN-Renew).
    pub fn activate_renewed(&mut self, token: SecurityToken) {
        self.previous = self.current;
        self.current = Some(token);
        self.server_new_token_active = true;
    }

    pub fn server_new_token_active(&self) -> bool {
        self.server_new_token_active
    }

    /// Whether `token_id` matches either the current or the still-live
    /// previous token (spec §4.3 token validation on receive).
    pub fn accepts(&self, token_id: u32) -> bool {
        self.current.map_or(false, |t| t.token_id == token_id)
            || self.previous.map_or(false, |t| t.token_id == token_id)
    }

    /// SPEC_FULL §F item 1: drop the previous token once it has aged
    /// past its own revised lifetime, closing the overlap window. Called
    /// from the dispatcher's periodic `Tick` event, not inline on every
    /// receive, so it costs nothing on the hot path.
    pub fn retire_expired_previous(&mut self, now_ms: u64) {
        if let Some(prev) = self.previous {
            if prev.is_expired(now_ms) {
                self.previous = None;
            }
        }
    }

    /// The overlap window's primary close condition (spec §4.2): the
    /// first time a message stamped with the new current token id
    /// arrives, the previous token is retired immediately rather than
    /// waiting for it to age out under `retire_expired_previous`'s
    /// timer. Call this once per successfully decoded chunk, passing
    /// the token id its symmetric security header carried.
    pub fn note_message_under(&mut self, token_id: u32) {
        if self.previous.is_none() {
            return;
        }
        if self.current.map_or(false, |t| t.token_id == token_id) {
            self.previous = None;
            self.server_new_token_active = false;
        }
    }
}

/// Generate a fresh u32 id in `[1, UINT32_MAX]` that `taken` reports as
/// unused, retrying up to `ID_GENERATION_ATTEMPTS` times before giving
/// up as a resource-exhaustion error (SPEC_FULL §F item 4). `candidate`
/// supplies the next value to try (e.g. a counter or RNG draw); this
/// function does not generate randomness itself so it stays testable
/// without a `rand` dependency in non-test code.
pub fn generate_unique_id(
    mut candidate: impl FnMut() -> u32,
    taken: impl Fn(u32) -> bool,
) -> Result<u32> {
    for _ in 0..ID_GENERATION_ATTEMPTS {
        let id = candidate();
        if id != 0 && !taken(id) {
            return Ok(id);
        }
    }
    Err(CoreError::OutOfMemory)
}
