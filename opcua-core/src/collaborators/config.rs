//! Configuration facade (spec §4.7; SPEC_FULL §D). The core never
//! parses a config file itself; it is handed already-deserialized
//! `EndpointConfig`/`ChannelConfig` values through this trait. Grounded
//! on the teacher's use of `serde_json`/`serdeconv` in
//! `authenticator::main` to load its startup config — the same derive
//! shape is reused here for the two records the Secure Connection layer
//! actually needs at runtime.

use serde::Deserialize;

/// Negotiated/offered buffer sizes a listener advertises to clients
/// (spec §4.2 HEL/ACK negotiation, §6).
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelConfig {
    pub send_buffer_size: u32,
    pub receive_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

impl Default for ChannelConfig {
    fn default() -> ChannelConfig {
        ChannelConfig {
            send_buffer_size: 8192,
            receive_buffer_size: 8192,
            max_message_size: 128 * 1024,
            max_chunk_count: 1,
        }
    }
}

/// Per-endpoint policy: which security modes/policies are accepted, and
/// the lifetime bounds the server will revise a client's requested
/// channel lifetime into (spec §4.2).
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub endpoint_url: String,
    pub security_policy_uri: String,
    pub min_channel_lifetime_ms: u32,
    pub max_channel_lifetime_ms: u32,
    pub max_connections: usize,
}

pub trait ConfigStore {
    fn channel_config(&self) -> &ChannelConfig;
    fn endpoint_config(&self, endpoint_url: &str) -> Option<&EndpointConfig>;
}
