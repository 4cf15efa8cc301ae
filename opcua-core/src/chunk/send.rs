//! Send half of the Chunk Manager (spec §4.4): given a plaintext body,
//! produce the bytes to hand to the socket. Grounded on the teacher's
//! `Header`/`ConnectionToken` serialize-then-encrypt-in-place pattern
//! in `net::frame` (additional data built from the header fields, body
//! encrypted separately), generalized to the spec's
//! sign-then-optionally-encrypt sequence and its padding formula.
//!
//! Since `maxChunkCount` is fixed at 1 (spec §4.4 Design Note), a
//! message that does not fit in one chunk is a hard error rather than
//! something this layer splits across chunks — the caller (Services)
//! is expected to keep application messages under the negotiated size.

use std::io::Write;

use crate::chunk::{compute_padding, max_body_size, SecurityHeader};
use crate::codec::{self, ChunkFlag, MessageKind, SequenceHeader, UacpHeader, UACP_HEADER_SIZE};
use crate::collaborators::crypto::CryptoProvider;
use crate::status::StatusCode;

/// Assemble one complete wire chunk for `body`.
///
/// `is_response_side` only affects which "too large" status is
/// reported (`BadResponseTooLarge` vs `BadRequestTooLarge`, spec §7);
/// the framing logic is identical either direction.
pub fn encode_chunk(
    kind: MessageKind,
    security_header: &SecurityHeader,
    sequence_header: SequenceHeader,
    body: &[u8],
    crypto: &dyn CryptoProvider,
    max_chunk_size: usize,
    is_response_side: bool,
) -> Result<Vec<u8>, StatusCode> {
    let too_large = if is_response_side {
        StatusCode::BadResponseTooLarge
    } else {
        StatusCode::BadRequestTooLarge
    };

    // Only the security header is cleartext; the sequence header is
    // encrypted together with the body (spec §6, §4.4 step 10).
    let mut header_region = Vec::new();
    security_header.write(&mut header_region).map_err(|_| StatusCode::BadUnexpectedError)?;

    let signature_size = crypto.signature_size();
    let block_size = crypto.cipher_block_size();

    let max_body = max_body_size(max_chunk_size, header_region.len(), signature_size, block_size);
    if body.len() > max_body {
        return Err(too_large);
    }

    let mut seq_and_body = Vec::with_capacity(codec::SEQUENCE_HEADER_SIZE + body.len());
    sequence_header.write(&mut seq_and_body).map_err(|_| StatusCode::BadUnexpectedError)?;
    seq_and_body.extend_from_slice(body);

    let padding_len = compute_padding(seq_and_body.len(), signature_size, block_size);

    // Plaintext tail: sequence header, body, and — only when encrypting
    // under a block cipher — a leading padding-size byte followed by
    // that many padding-fill bytes (value = the size), matching the
    // wire order of the size field before its fill bytes. Block sizes
    // above 256 would need a second, trailing extra-padding-size byte;
    // no provider in this crate reports one (`cipher_block_size()` is 1
    // for both `NullCryptoProvider` and the `libsodium` backend), so
    // that case is left unimplemented rather than guessed at.
    let mut plain_tail =
        Vec::with_capacity(seq_and_body.len() + padding_len + 1 + signature_size);
    plain_tail.extend_from_slice(&seq_and_body);
    if block_size > 1 {
        plain_tail.push(padding_len as u8);
        if padding_len > 0 {
            plain_tail.resize(plain_tail.len() + padding_len, padding_len as u8);
        }
    }

    let mut to_sign = Vec::with_capacity(UACP_HEADER_SIZE + header_region.len() + plain_tail.len());
    // Header bytes are not known (size not finalized) but are fixed in
    // shape; sign over a zero-filled placeholder of the same length so
    // the signature covers the header's position without depending on
    // the not-yet-known total size.
    to_sign.extend(std::iter::repeat(0u8).take(UACP_HEADER_SIZE));
    to_sign.extend_from_slice(&header_region);
    to_sign.extend_from_slice(&plain_tail);

    let mut signature = vec![0u8; signature_size];
    if signature_size > 0 && !crypto.sign(&to_sign, &mut signature) {
        return Err(StatusCode::BadUnexpectedError);
    }

    let mut plain_with_signature = plain_tail;
    plain_with_signature.extend_from_slice(&signature);

    let mut cipher_tail = vec![0u8; plain_with_signature.len()];
    if !crypto.encrypt(&plain_with_signature, &mut cipher_tail) {
        return Err(StatusCode::BadUnexpectedError);
    }

    let total_len = UACP_HEADER_SIZE + header_region.len() + cipher_tail.len();
    if total_len > max_chunk_size {
        return Err(too_large);
    }

    let mut out = Vec::with_capacity(total_len);
    let header = UacpHeader { kind, flag: ChunkFlag::Final, message_size: total_len as u32 };
    let mut header_bytes = [0u8; UACP_HEADER_SIZE];
    header.encode(&mut header_bytes);
    out.write_all(&header_bytes).map_err(|_| StatusCode::BadUnexpectedError)?;
    out.write_all(&header_region).map_err(|_| StatusCode::BadUnexpectedError)?;
    out.write_all(&cipher_tail).map_err(|_| StatusCode::BadUnexpectedError)?;

    Ok(out)
}

/// Convenience for `HEL`/`ACK`/`ERR`, which carry no security header and
/// are never signed or encrypted (spec §4.1 bare UACP messages).
pub fn encode_plain_message(kind: MessageKind, body: &[u8]) -> Vec<u8> {
    let total_len = UACP_HEADER_SIZE + body.len();
    let mut out = Vec::with_capacity(total_len);
    let header = UacpHeader { kind, flag: ChunkFlag::Final, message_size: total_len as u32 };
    let mut header_bytes = [0u8; UACP_HEADER_SIZE];
    header.encode(&mut header_bytes);
    out.extend_from_slice(&header_bytes);
    out.extend_from_slice(body);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::crypto::NullCryptoProvider;

    #[test]
    fn encode_chunk_with_null_provider_is_unpadded_and_unsigned() {
        let header = SecurityHeader::Symmetric { token_id: 7 };
        let seq = SequenceHeader { sequence_number: 1, request_id: 1 };
        let body = b"hello";
        let bytes =
            encode_chunk(MessageKind::Msg, &header, seq, body, &NullCryptoProvider, 4096, false)
                .unwrap();
        // header(8) + token_id(4) + seq(8) + body(5)
        assert_eq!(bytes.len(), 8 + 4 + 8 + 5);
        assert_eq!(&bytes[0..3], b"MSG");
    }

    #[test]
    fn encode_chunk_rejects_oversize_message() {
        let header = SecurityHeader::Symmetric { token_id: 1 };
        let seq = SequenceHeader { sequence_number: 1, request_id: 1 };
        let body = vec![0u8; 100];
        let result =
            encode_chunk(MessageKind::Msg, &header, seq, &body, &NullCryptoProvider, 16, false);
        assert_eq!(result, Err(StatusCode::BadRequestTooLarge));
    }

    #[test]
    fn encode_chunk_reports_response_too_large_on_response_side() {
        let header = SecurityHeader::Symmetric { token_id: 1 };
        let seq = SequenceHeader { sequence_number: 1, request_id: 1 };
        let body = vec![0u8; 100];
        let result =
            encode_chunk(MessageKind::Msg, &header, seq, &body, &NullCryptoProvider, 16, true);
        assert_eq!(result, Err(StatusCode::BadResponseTooLarge));
    }

    #[test]
    fn encode_plain_message_has_no_security_header() {
        let bytes = encode_plain_message(MessageKind::Hel, b"abcd");
        assert_eq!(bytes.len(), UACP_HEADER_SIZE + 4);
        assert_eq!(&bytes[0..3], b"HEL");
    }
}
