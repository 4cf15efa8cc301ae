//! OPC UA status codes the core actually produces or consumes (spec §7).
//!
//! This is not the full OPC UA status code table — only the subset the
//! transport/Secure Conversation pipeline needs to raise or forward.

/// A wire-visible OPC UA status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Good,

    // TCP framing errors (§4.3, §7)
    BadTcpMessageTooLarge,
    BadTcpMessageTypeInvalid,
    BadTcpEndpointUrlInvalid,
    BadTcpNotEnoughResources,

    // Security errors (§4.2, §4.3, §7) — collapsed to the generic one
    // before a channel is established, per §4.2 "Server protection".
    BadSecurityChecksFailed,
    BadSecurityModeRejected,
    BadSecurityPolicyRejected,
    BadCertificateInvalid,
    BadSequenceNumberInvalid,
    BadSecureChannelIdInvalid,
    BadRequestTypeInvalid,

    // Size errors (§4.4)
    BadRequestTooLarge,
    BadResponseTooLarge,

    // Resource errors
    BadOutOfMemory,
    BadInvalidArgument,

    // Timeouts / lifecycle
    BadConnectionClosed,
    BadTimeout,

    BadUnexpectedError,
}

impl StatusCode {
    /// True for every code that must collapse to `BadSecurityChecksFailed`
    /// when the channel has not yet reached `SC_CONNECTED` (§4.2).
    pub fn is_security(self) -> bool {
        matches!(
            self,
            StatusCode::BadSecurityChecksFailed
                | StatusCode::BadSecurityModeRejected
                | StatusCode::BadSecurityPolicyRejected
                | StatusCode::BadCertificateInvalid
                | StatusCode::BadSequenceNumberInvalid
                | StatusCode::BadSecureChannelIdInvalid
                | StatusCode::BadRequestTypeInvalid
        )
    }

    /// Collapse to the generic pre-channel security failure, per §4.2.
    pub fn masked_before_channel_established(self) -> StatusCode {
        if self.is_security() {
            StatusCode::BadSecurityChecksFailed
        } else {
            self
        }
    }

    /// Short machine-readable name, used in `ERR` reason strings and logs.
    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Good => "Good",
            StatusCode::BadTcpMessageTooLarge => "BadTcpMessageTooLarge",
            StatusCode::BadTcpMessageTypeInvalid => "BadTcpMessageTypeInvalid",
            StatusCode::BadTcpEndpointUrlInvalid => "BadTcpEndpointUrlInvalid",
            StatusCode::BadTcpNotEnoughResources => "BadTcpNotEnoughResources",
            StatusCode::BadSecurityChecksFailed => "BadSecurityChecksFailed",
            StatusCode::BadSecurityModeRejected => "BadSecurityModeRejected",
            StatusCode::BadSecurityPolicyRejected => "BadSecurityPolicyRejected",
            StatusCode::BadCertificateInvalid => "BadCertificateInvalid",
            StatusCode::BadSequenceNumberInvalid => "BadSequenceNumberInvalid",
            StatusCode::BadSecureChannelIdInvalid => "BadSecureChannelIdInvalid",
            StatusCode::BadRequestTypeInvalid => "BadRequestTypeInvalid",
            StatusCode::BadRequestTooLarge => "BadRequestTooLarge",
            StatusCode::BadResponseTooLarge => "BadResponseTooLarge",
            StatusCode::BadOutOfMemory => "BadOutOfMemory",
            StatusCode::BadInvalidArgument => "BadInvalidArgument",
            StatusCode::BadConnectionClosed => "BadConnectionClosed",
            StatusCode::BadTimeout => "BadTimeout",
            StatusCode::BadUnexpectedError => "BadUnexpectedError",
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
