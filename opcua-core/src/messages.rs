//! Closed set of message bodies the core itself must understand (spec
//! §4.2, §4.6 Design Note "dynamic message dispatch"). Everything that
//! is not OpenSecureChannel, CloseSecureChannel or an `ERR` body is
//! opaque to this crate and gets forwarded to `Services` untouched —
//! the core has no information model and must not decode it.

use crate::codec::{self, NodeId};
use crate::status::StatusCode;

/// Numeric identifiers of the request/response types the core decodes
/// for itself, taken from the OPC UA base NodeId namespace (namespace
/// 0). Everything else is opaque.
mod type_id {
    pub const OPEN_SECURE_CHANNEL_REQUEST: u32 = 446;
    pub const OPEN_SECURE_CHANNEL_RESPONSE: u32 = 449;
    pub const CLOSE_SECURE_CHANNEL_REQUEST: u32 = 452;
    pub const CLOSE_SECURE_CHANNEL_RESPONSE: u32 = 455;
    pub const SERVICE_FAULT: u32 = 397;
}

/// The `SecurityTokenRequestType` enum value inside an
/// `OpenSecureChannelRequest` (spec §4.2): `Issue` starts a brand new
/// channel, `Renew` extends an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Issue,
    Renew,
}

impl RequestType {
    fn from_u32(v: u32) -> Result<RequestType, StatusCode> {
        match v {
            0 => Ok(RequestType::Issue),
            1 => Ok(RequestType::Renew),
            _ => Err(StatusCode::BadRequestTypeInvalid),
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            RequestType::Issue => 0,
            RequestType::Renew => 1,
        }
    }
}

/// The `MessageSecurityMode` enum value (spec §4.2, Glossary).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityMode {
    Invalid,
    None,
    Sign,
    SignAndEncrypt,
}

impl SecurityMode {
    fn from_u32(v: u32) -> SecurityMode {
        match v {
            1 => SecurityMode::None,
            2 => SecurityMode::Sign,
            3 => SecurityMode::SignAndEncrypt,
            _ => SecurityMode::Invalid,
        }
    }

    fn to_u32(self) -> u32 {
        match self {
            SecurityMode::Invalid => 0,
            SecurityMode::None => 1,
            SecurityMode::Sign => 2,
            SecurityMode::SignAndEncrypt => 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenSecureChannelRequest {
    pub client_protocol_version: u32,
    pub request_type: RequestType,
    pub security_mode: SecurityMode,
    pub client_nonce: Option<Vec<u8>>,
    pub requested_lifetime_ms: u32,
}

#[derive(Debug, Clone)]
pub struct OpenSecureChannelResponse {
    pub server_protocol_version: u32,
    pub secure_channel_id: u32,
    pub token_id: u32,
    pub created_at_ms: u64,
    pub revised_lifetime_ms: u32,
    pub server_nonce: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct CloseSecureChannelRequest;

#[derive(Debug, Clone)]
pub struct ServiceFault {
    pub response_header_status: StatusCode,
}

/// A decoded message body: either one the core understands, or an
/// opaque blob destined for `Services` (spec §9 Design Note).
#[derive(Debug, Clone)]
pub enum MessageBody {
    OpenSecureChannelRequest(OpenSecureChannelRequest),
    OpenSecureChannelResponse(OpenSecureChannelResponse),
    CloseSecureChannelRequest(CloseSecureChannelRequest),
    ServiceFault(ServiceFault),
    Opaque { type_id: NodeId, payload: Vec<u8> },
}

impl OpenSecureChannelRequest {
    pub fn decode(bytes: &[u8]) -> Result<OpenSecureChannelRequest, StatusCode> {
        let mut cursor = std::io::Cursor::new(bytes);
        let client_protocol_version =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let request_type_raw =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let security_mode_raw =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let client_nonce = codec::read_byte_string(&mut cursor, codec::MAX_STRING_LEN)?;
        let requested_lifetime_ms =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        Ok(OpenSecureChannelRequest {
            client_protocol_version,
            request_type: RequestType::from_u32(request_type_raw)?,
            security_mode: SecurityMode::from_u32(security_mode_raw),
            client_nonce,
            requested_lifetime_ms,
        })
    }

    pub fn encode(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        codec::write_u32(out, self.client_protocol_version)?;
        codec::write_u32(out, self.request_type.to_u32())?;
        codec::write_u32(out, self.security_mode.to_u32())?;
        codec::write_byte_string(out, self.client_nonce.as_deref())?;
        codec::write_u32(out, self.requested_lifetime_ms)
    }
}

impl OpenSecureChannelResponse {
    pub fn encode(&self, out: &mut Vec<u8>) -> std::io::Result<()> {
        codec::write_u32(out, self.server_protocol_version)?;
        codec::write_u32(out, self.secure_channel_id)?;
        codec::write_u32(out, self.token_id)?;
        codec::write_u64(out, self.created_at_ms)?;
        codec::write_u32(out, self.revised_lifetime_ms)?;
        codec::write_byte_string(out, self.server_nonce.as_deref())
    }

    pub fn decode(bytes: &[u8]) -> Result<OpenSecureChannelResponse, StatusCode> {
        let mut cursor = std::io::Cursor::new(bytes);
        let server_protocol_version =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let secure_channel_id =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let token_id =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let created_at_ms =
            codec::read_u64(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let revised_lifetime_ms =
            codec::read_u32(&mut cursor).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let server_nonce = codec::read_byte_string(&mut cursor, codec::MAX_STRING_LEN)?;
        Ok(OpenSecureChannelResponse {
            server_protocol_version,
            secure_channel_id,
            token_id,
            created_at_ms,
            revised_lifetime_ms,
            server_nonce,
        })
    }
}

/// Decode a message body, given the `NodeId` that precedes it on the
/// wire (the OPC UA "ExtensionObject" encoding id). Bodies the core
/// doesn't recognize pass through as `Opaque`.
pub fn decode_body(type_id: NodeId, payload: &[u8]) -> Result<MessageBody, StatusCode> {
    if type_id.namespace != 0 {
        return Ok(MessageBody::Opaque { type_id, payload: payload.to_vec() });
    }
    match type_id.identifier {
        type_id::OPEN_SECURE_CHANNEL_REQUEST => {
            Ok(MessageBody::OpenSecureChannelRequest(OpenSecureChannelRequest::decode(payload)?))
        }
        type_id::OPEN_SECURE_CHANNEL_RESPONSE => {
            Ok(MessageBody::OpenSecureChannelResponse(OpenSecureChannelResponse::decode(payload)?))
        }
        type_id::CLOSE_SECURE_CHANNEL_REQUEST => {
            Ok(MessageBody::CloseSecureChannelRequest(CloseSecureChannelRequest))
        }
        type_id::SERVICE_FAULT => Ok(MessageBody::ServiceFault(ServiceFault {
            response_header_status: StatusCode::BadUnexpectedError,
        })),
        _ => Ok(MessageBody::Opaque { type_id, payload: payload.to_vec() }),
    }
}

pub fn open_secure_channel_request_type_id() -> NodeId {
    NodeId { namespace: 0, identifier: type_id::OPEN_SECURE_CHANNEL_REQUEST }
}

pub fn open_secure_channel_response_type_id() -> NodeId {
    NodeId { namespace: 0, identifier: type_id::OPEN_SECURE_CHANNEL_RESPONSE }
}

pub fn close_secure_channel_request_type_id() -> NodeId {
    NodeId { namespace: 0, identifier: type_id::CLOSE_SECURE_CHANNEL_REQUEST }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_secure_channel_request_roundtrip() {
        let req = OpenSecureChannelRequest {
            client_protocol_version: 0,
            request_type: RequestType::Renew,
            security_mode: SecurityMode::SignAndEncrypt,
            client_nonce: Some(vec![1, 2, 3]),
            requested_lifetime_ms: 60_000,
        };
        let mut buf = Vec::new();
        req.encode(&mut buf).unwrap();
        let decoded = OpenSecureChannelRequest::decode(&buf).unwrap();
        assert_eq!(decoded.request_type, RequestType::Renew);
        assert_eq!(decoded.security_mode, SecurityMode::SignAndEncrypt);
        assert_eq!(decoded.client_nonce, Some(vec![1, 2, 3]));
        assert_eq!(decoded.requested_lifetime_ms, 60_000);
    }

    #[test]
    fn open_secure_channel_response_roundtrip() {
        let resp = OpenSecureChannelResponse {
            server_protocol_version: 0,
            secure_channel_id: 77,
            token_id: 2,
            created_at_ms: 123,
            revised_lifetime_ms: 3600_000,
            server_nonce: None,
        };
        let mut buf = Vec::new();
        resp.encode(&mut buf).unwrap();
        let decoded = OpenSecureChannelResponse::decode(&buf).unwrap();
        assert_eq!(decoded.secure_channel_id, 77);
        assert_eq!(decoded.token_id, 2);
        assert_eq!(decoded.server_nonce, None);
    }

    #[test]
    fn unknown_request_type_is_rejected() {
        let mut buf = Vec::new();
        codec::write_u32(&mut buf, 0).unwrap();
        codec::write_u32(&mut buf, 99).unwrap();
        codec::write_u32(&mut buf, 1).unwrap();
        codec::write_byte_string(&mut buf, None).unwrap();
        codec::write_u32(&mut buf, 1000).unwrap();
        assert!(OpenSecureChannelRequest::decode(&buf).is_err());
    }

    #[test]
    fn unrecognized_type_id_decodes_as_opaque() {
        let foreign = NodeId { namespace: 2, identifier: 123 };
        let body = decode_body(foreign, &[9, 9, 9]).unwrap();
        match body {
            MessageBody::Opaque { type_id, payload } => {
                assert_eq!(type_id, foreign);
                assert_eq!(payload, vec![9, 9, 9]);
            }
            _ => panic!("expected opaque"),
        }
    }

    #[test]
    fn close_secure_channel_request_is_recognized() {
        let body = decode_body(close_secure_channel_request_type_id(), &[]).unwrap();
        assert!(matches!(body, MessageBody::CloseSecureChannelRequest(_)));
    }
}
