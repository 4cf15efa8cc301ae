//! Wire Codec (spec §3, §6): primitive scalar/string/NodeId encoders and
//! decoders, plus the UACP message header. Grounded on the teacher's
//! `frame.rs`, which reads/writes its `Header`/`ConnectionToken` structs
//! directly off a `byteorder` cursor rather than through a generic
//! serializer — this crate keeps that same direct-cursor idiom instead of
//! reaching for `bincode` on the wire (bincode stays for local structures
//! that never cross the wire, e.g. a persisted ban/allow list, the same
//! distinction the teacher draws).

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

use crate::status::StatusCode;

/// Absence sentinel for length-prefixed strings/byte-strings (spec §6,
/// Open Question 1): `-1` (0xFFFFFFFF) and `0` are both decoded as
/// "absent"; encoding always emits `-1`.
const ABSENT_LENGTH: u32 = 0xFFFF_FFFF;

pub fn write_u32(w: &mut impl Write, v: u32) -> io::Result<()> {
    w.write_u32::<LittleEndian>(v)
}

pub fn read_u32(r: &mut impl Read) -> io::Result<u32> {
    r.read_u32::<LittleEndian>()
}

pub fn write_i32(w: &mut impl Write, v: i32) -> io::Result<()> {
    w.write_i32::<LittleEndian>(v)
}

pub fn read_i32(r: &mut impl Read) -> io::Result<i32> {
    r.read_i32::<LittleEndian>()
}

pub fn write_u16(w: &mut impl Write, v: u16) -> io::Result<()> {
    w.write_u16::<LittleEndian>(v)
}

pub fn read_u16(r: &mut impl Read) -> io::Result<u16> {
    r.read_u16::<LittleEndian>()
}

pub fn write_u64(w: &mut impl Write, v: u64) -> io::Result<()> {
    w.write_u64::<LittleEndian>(v)
}

pub fn read_u64(r: &mut impl Read) -> io::Result<u64> {
    r.read_u64::<LittleEndian>()
}

/// Maximum length the spec allows for an endpoint URL string (§6).
pub const MAX_STRING_LEN: usize = 4096;

/// Length-prefixed UTF-8 string: `length: i32 LE` followed by the bytes.
/// Absent is encoded as `-1`; on decode, `-1` and `0` both mean "absent"
/// and yield `None`.
pub fn write_string(w: &mut impl Write, value: Option<&str>) -> io::Result<()> {
    match value {
        None => write_i32(w, -1),
        Some(s) => {
            write_i32(w, s.len() as i32)?;
            w.write_all(s.as_bytes())
        }
    }
}

pub fn read_string(r: &mut impl Read, max_len: usize) -> Result<Option<String>, StatusCode> {
    let len = read_i32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
    if len <= 0 {
        return Ok(None);
    }
    let len = len as usize;
    if len > max_len {
        return Err(StatusCode::BadTcpMessageTooLarge);
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
    String::from_utf8(buf).map(Some).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)
}

/// Length-prefixed byte-string: identical wire shape to a string, raw
/// bytes instead of UTF-8.
pub fn write_byte_string(w: &mut impl Write, value: Option<&[u8]>) -> io::Result<()> {
    match value {
        None => write_i32(w, -1),
        Some(b) => {
            write_i32(w, b.len() as i32)?;
            w.write_all(b)
        }
    }
}

pub fn read_byte_string(r: &mut impl Read, max_len: usize) -> Result<Option<Vec<u8>>, StatusCode> {
    let len = read_i32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
    if len <= 0 {
        return Ok(None);
    }
    let len = len as usize;
    if len > max_len {
        return Err(StatusCode::BadTcpMessageTooLarge);
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
    Ok(Some(buf))
}

/// A minimal `NodeId` — only the numeric-namespace/numeric-identifier
/// encoding the core needs to recognize `OpenSecureChannelRequest`-style
/// bodies; string/GUID/opaque NodeId forms are Services' problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: u32,
}

impl NodeId {
    /// Two-byte form (`encoding=0x00`, namespace implicitly 0).
    const ENCODING_TWO_BYTE: u8 = 0x00;
    /// Four-byte form (`encoding=0x01`).
    const ENCODING_FOUR_BYTE: u8 = 0x01;
    /// Numeric form (`encoding=0x02`, full u16 namespace + u32 identifier).
    const ENCODING_NUMERIC: u8 = 0x02;

    pub fn write(&self, w: &mut impl Write) -> io::Result<()> {
        if self.namespace == 0 && self.identifier <= 0xFF {
            w.write_u8(Self::ENCODING_TWO_BYTE)?;
            w.write_u8(self.identifier as u8)
        } else if self.namespace <= 0xFF && self.identifier <= 0xFFFF {
            w.write_u8(Self::ENCODING_FOUR_BYTE)?;
            w.write_u8(self.namespace as u8)?;
            w.write_u16::<LittleEndian>(self.identifier as u16)
        } else {
            w.write_u8(Self::ENCODING_NUMERIC)?;
            w.write_u16::<LittleEndian>(self.namespace)?;
            w.write_u32::<LittleEndian>(self.identifier)
        }
    }

    pub fn read(r: &mut impl Read) -> Result<NodeId, StatusCode> {
        let encoding = r.read_u8().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        match encoding {
            Self::ENCODING_TWO_BYTE => {
                let id = r.read_u8().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
                Ok(NodeId { namespace: 0, identifier: id as u32 })
            }
            Self::ENCODING_FOUR_BYTE => {
                let ns = r.read_u8().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
                let id = r.read_u16::<LittleEndian>().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
                Ok(NodeId { namespace: ns as u16, identifier: id as u32 })
            }
            Self::ENCODING_NUMERIC => {
                let ns = r.read_u16::<LittleEndian>().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
                let id = r.read_u32::<LittleEndian>().map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
                Ok(NodeId { namespace: ns, identifier: id })
            }
            _ => Err(StatusCode::BadTcpMessageTypeInvalid),
        }
    }
}

/// The three-way chunk continuation flag (spec §3): `F`inal, `C`ontinue,
/// `A`bort. Since this implementation fixes `maxChunkCount = 1`, only
/// `Final` is ever legal on outbound traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkFlag {
    Final,
    Intermediate,
    Abort,
}

impl ChunkFlag {
    pub fn from_byte(b: u8) -> Option<ChunkFlag> {
        match b {
            b'F' => Some(ChunkFlag::Final),
            b'C' => Some(ChunkFlag::Intermediate),
            b'A' => Some(ChunkFlag::Abort),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ChunkFlag::Final => b'F',
            ChunkFlag::Intermediate => b'C',
            ChunkFlag::Abort => b'A',
        }
    }
}

/// The 3-byte ASCII message type tag (spec §3, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Hel,
    Ack,
    Err,
    Opn,
    Msg,
    Clo,
}

impl MessageKind {
    pub fn from_tag(tag: &[u8; 3]) -> Option<MessageKind> {
        match tag {
            b"HEL" => Some(MessageKind::Hel),
            b"ACK" => Some(MessageKind::Ack),
            b"ERR" => Some(MessageKind::Err),
            b"OPN" => Some(MessageKind::Opn),
            b"MSG" => Some(MessageKind::Msg),
            b"CLO" => Some(MessageKind::Clo),
            _ => None,
        }
    }

    pub fn tag(self) -> [u8; 3] {
        match self {
            MessageKind::Hel => *b"HEL",
            MessageKind::Ack => *b"ACK",
            MessageKind::Err => *b"ERR",
            MessageKind::Opn => *b"OPN",
            MessageKind::Msg => *b"MSG",
            MessageKind::Clo => *b"CLO",
        }
    }

    /// Only `Msg` chunks may ever be non-final (and this implementation
    /// still rejects that, see `chunk::receive`); every other kind must
    /// be final (spec §3).
    pub fn must_be_final(self) -> bool {
        !matches!(self, MessageKind::Msg)
    }

    /// Whether this kind is bare UACP (HEL/ACK/ERR) vs Secure Conversation
    /// framed (OPN/MSG/CLO), per spec §4.4.
    pub fn is_secure_conversation(self) -> bool {
        matches!(self, MessageKind::Opn | MessageKind::Msg | MessageKind::Clo)
    }
}

/// Fixed 8-byte UACP header: `type[3] | flag[1] | size: u32 LE` (spec §6).
pub const UACP_HEADER_SIZE: usize = 8;

#[derive(Debug, Clone, Copy)]
pub struct UacpHeader {
    pub kind: MessageKind,
    pub flag: ChunkFlag,
    pub message_size: u32,
}

impl UacpHeader {
    pub fn decode(bytes: &[u8; UACP_HEADER_SIZE]) -> Result<UacpHeader, StatusCode> {
        let tag = [bytes[0], bytes[1], bytes[2]];
        let kind = MessageKind::from_tag(&tag).ok_or(StatusCode::BadTcpMessageTypeInvalid)?;
        let flag = ChunkFlag::from_byte(bytes[3]).ok_or(StatusCode::BadTcpMessageTypeInvalid)?;
        if kind.must_be_final() && flag != ChunkFlag::Final {
            return Err(StatusCode::BadTcpMessageTypeInvalid);
        }
        let message_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(UacpHeader { kind, flag, message_size })
    }

    pub fn encode(&self, out: &mut [u8; UACP_HEADER_SIZE]) {
        let tag = self.kind.tag();
        out[0] = tag[0];
        out[1] = tag[1];
        out[2] = tag[2];
        out[3] = self.flag.to_byte();
        out[4..8].copy_from_slice(&self.message_size.to_le_bytes());
    }
}

/// The minimum send/receive buffer size either side may advertise in
/// HELLO/ACK (spec §6); anything smaller aborts negotiation.
pub const MIN_BUFFER_SIZE: u32 = 8192;

/// HELLO body (spec §6): sent by the client right after the socket
/// comes up.
#[derive(Debug, Clone, PartialEq)]
pub struct HelloMessage {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
    pub endpoint_url: String,
}

impl HelloMessage {
    pub fn encode(&self, w: &mut impl Write) -> io::Result<()> {
        write_u32(w, self.protocol_version)?;
        write_u32(w, self.receive_buffer_size)?;
        write_u32(w, self.send_buffer_size)?;
        write_u32(w, self.max_message_size)?;
        write_u32(w, self.max_chunk_count)?;
        write_string(w, Some(&self.endpoint_url))
    }

    pub fn decode(r: &mut impl Read) -> Result<HelloMessage, StatusCode> {
        let protocol_version = read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let receive_buffer_size = read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let send_buffer_size = read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let max_message_size = read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let max_chunk_count = read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?;
        let endpoint_url = read_string(r, MAX_STRING_LEN)?.ok_or(StatusCode::BadTcpEndpointUrlInvalid)?;
        if receive_buffer_size < MIN_BUFFER_SIZE || send_buffer_size < MIN_BUFFER_SIZE {
            return Err(StatusCode::BadTcpMessageTypeInvalid);
        }
        Ok(HelloMessage {
            protocol_version,
            receive_buffer_size,
            send_buffer_size,
            max_message_size,
            max_chunk_count,
            endpoint_url,
        })
    }
}

/// ACK body (spec §6): same five `u32` fields as HELLO, no endpoint URL.
#[derive(Debug, Clone, Copy)]
pub struct AckMessage {
    pub protocol_version: u32,
    pub receive_buffer_size: u32,
    pub send_buffer_size: u32,
    pub max_message_size: u32,
    pub max_chunk_count: u32,
}

impl AckMessage {
    pub fn encode(&self, w: &mut impl Write) -> io::Result<()> {
        write_u32(w, self.protocol_version)?;
        write_u32(w, self.receive_buffer_size)?;
        write_u32(w, self.send_buffer_size)?;
        write_u32(w, self.max_message_size)?;
        write_u32(w, self.max_chunk_count)
    }

    pub fn decode(r: &mut impl Read) -> Result<AckMessage, StatusCode> {
        Ok(AckMessage {
            protocol_version: read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?,
            receive_buffer_size: read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?,
            send_buffer_size: read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?,
            max_message_size: read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?,
            max_chunk_count: read_u32(r).map_err(|_| StatusCode::BadTcpMessageTypeInvalid)?,
        })
    }
}

/// ERROR body (spec §6): the only message a server may send before a
/// channel is established to explain why it is closing the socket.
#[derive(Debug, Clone)]
pub struct ErrorMessage {
    pub error: StatusCode,
    pub reason: String,
}

impl ErrorMessage {
    pub fn encode(&self, w: &mut impl Write) -> io::Result<()> {
        write_u32(w, self.error as u32)?;
        write_string(w, Some(&self.reason))
    }
}

/// Sequence header (spec §6): present right after the security header on
/// every Secure Conversation chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    pub sequence_number: u32,
    pub request_id: u32,
}

pub const SEQUENCE_HEADER_SIZE: usize = 8;

impl SequenceHeader {
    pub fn write(&self, w: &mut impl Write) -> io::Result<()> {
        write_u32(w, self.sequence_number)?;
        write_u32(w, self.request_id)
    }

    pub fn read(r: &mut impl Read) -> io::Result<SequenceHeader> {
        Ok(SequenceHeader {
            sequence_number: read_u32(r)?,
            request_id: read_u32(r)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn u32_roundtrip() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0xDEAD_BEEF).unwrap();
        let mut c = Cursor::new(buf);
        assert_eq!(read_u32(&mut c).unwrap(), 0xDEAD_BEEF);
        assert_eq!(c.position() as usize, 4);
    }

    #[test]
    fn string_roundtrip() {
        let mut buf = Vec::new();
        write_string(&mut buf, Some("opc.tcp://here/")).unwrap();
        let mut c = Cursor::new(buf);
        let s = read_string(&mut c, MAX_STRING_LEN).unwrap();
        assert_eq!(s.as_deref(), Some("opc.tcp://here/"));
    }

    #[test]
    fn absent_string_decodes_from_minus_one_and_zero() {
        let mut buf = Vec::new();
        write_i32(&mut buf, -1).unwrap();
        let mut c = Cursor::new(buf);
        assert_eq!(read_string(&mut c, MAX_STRING_LEN).unwrap(), None);

        let mut buf = Vec::new();
        write_i32(&mut buf, 0).unwrap();
        let mut c = Cursor::new(buf);
        assert_eq!(read_string(&mut c, MAX_STRING_LEN).unwrap(), None);
    }

    #[test]
    fn absent_string_always_encodes_as_minus_one() {
        let mut buf = Vec::new();
        write_string(&mut buf, None).unwrap();
        let mut c = Cursor::new(buf);
        assert_eq!(read_i32(&mut c).unwrap(), -1);
    }

    #[test]
    fn node_id_roundtrip_all_forms() {
        for nid in [
            NodeId { namespace: 0, identifier: 42 },
            NodeId { namespace: 3, identifier: 4000 },
            NodeId { namespace: 12345, identifier: 99_999_999 },
        ] {
            let mut buf = Vec::new();
            nid.write(&mut buf).unwrap();
            let mut c = Cursor::new(buf);
            assert_eq!(NodeId::read(&mut c).unwrap(), nid);
        }
    }

    #[test]
    fn uacp_header_roundtrip() {
        let hdr = UacpHeader { kind: MessageKind::Hel, flag: ChunkFlag::Final, message_size: 32 };
        let mut raw = [0u8; UACP_HEADER_SIZE];
        hdr.encode(&mut raw);
        let decoded = UacpHeader::decode(&raw).unwrap();
        assert_eq!(decoded.message_size, 32);
        assert_eq!(decoded.kind, MessageKind::Hel);
    }

    #[test]
    fn non_final_non_msg_is_rejected() {
        let mut raw = [0u8; UACP_HEADER_SIZE];
        raw[0..3].copy_from_slice(b"HEL");
        raw[3] = b'C';
        assert!(UacpHeader::decode(&raw).is_err());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut raw = [0u8; UACP_HEADER_SIZE];
        raw[0..3].copy_from_slice(b"XXX");
        raw[3] = b'F';
        assert!(UacpHeader::decode(&raw).is_err());
    }

    #[test]
    fn hello_roundtrips_and_accepts_minimum_buffer_size() {
        let hello = HelloMessage {
            protocol_version: 0,
            receive_buffer_size: MIN_BUFFER_SIZE,
            send_buffer_size: MIN_BUFFER_SIZE,
            max_message_size: 1 << 20,
            max_chunk_count: 1,
            endpoint_url: "opc.tcp://here/".to_string(),
        };
        let mut buf = Vec::new();
        hello.encode(&mut buf).unwrap();
        let mut c = Cursor::new(buf);
        let decoded = HelloMessage::decode(&mut c).unwrap();
        assert_eq!(decoded.endpoint_url, "opc.tcp://here/");
        assert_eq!(decoded.receive_buffer_size, MIN_BUFFER_SIZE);
    }

    #[test]
    fn hello_below_minimum_buffer_size_is_rejected() {
        let hello = HelloMessage {
            protocol_version: 0,
            receive_buffer_size: 1024,
            send_buffer_size: MIN_BUFFER_SIZE,
            max_message_size: 1 << 20,
            max_chunk_count: 1,
            endpoint_url: "opc.tcp://here/".to_string(),
        };
        let mut buf = Vec::new();
        hello.encode(&mut buf).unwrap();
        let mut c = Cursor::new(buf);
        assert_eq!(HelloMessage::decode(&mut c), Err(StatusCode::BadTcpMessageTypeInvalid));
    }

    #[test]
    fn ack_roundtrip() {
        let ack = AckMessage {
            protocol_version: 0,
            receive_buffer_size: 16384,
            send_buffer_size: 16384,
            max_message_size: 1 << 20,
            max_chunk_count: 1,
        };
        let mut buf = Vec::new();
        ack.encode(&mut buf).unwrap();
        let mut c = Cursor::new(buf);
        let decoded = AckMessage::decode(&mut c).unwrap();
        assert_eq!(decoded.receive_buffer_size, 16384);
    }

    #[test]
    fn error_message_encodes_status_and_reason() {
        let err = ErrorMessage { error: StatusCode::BadTcpEndpointUrlInvalid, reason: "bad url".to_string() };
        let mut buf = Vec::new();
        err.encode(&mut buf).unwrap();
        let mut c = Cursor::new(buf);
        let code = read_u32(&mut c).unwrap();
        assert_eq!(code, StatusCode::BadTcpEndpointUrlInvalid as u32);
        let reason = read_string(&mut c, MAX_STRING_LEN).unwrap();
        assert_eq!(reason.as_deref(), Some("bad url"));
    }
}
