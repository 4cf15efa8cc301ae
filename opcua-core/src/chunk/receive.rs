//! Receive half of the Chunk Manager (spec §4.3): decode a raw chunk
//! off the wire into a validated sequence header and plaintext body.
//! Grounded on the teacher's `ConnectionToken::deserialize`/
//! `Header::deserialize` (decrypt-then-validate-in-place over a
//! `Buffer` slice), generalized to the asymmetric/symmetric header
//! split and the token/sequence validation the spec requires before a
//! body is handed onward.

use std::io::Cursor;

use crate::chunk::{read_sequence_header, read_uacp_header, SecurityHeader};
use crate::codec::{MessageKind, SequenceHeader, UACP_HEADER_SIZE};
use crate::collaborators::crypto::CryptoProvider;
use crate::status::StatusCode;

#[derive(Debug, PartialEq)]
pub struct DecodedChunk {
    pub kind: MessageKind,
    pub sequence_header: SequenceHeader,
    pub body: Vec<u8>,
}

/// Decode one chunk already fully present in `raw` (the caller is
/// responsible for having read exactly `message_size` bytes off the
/// socket, per the UACP header it peeked at).
///
/// `token_is_accepted` validates the symmetric token id embedded in the
/// security header against the connection's `TokenStore` (spec §4.3);
/// it is a closure rather than a direct `TokenStore` reference so this
/// function stays decoupled from connection state.
pub fn decode_chunk(
    raw: &[u8],
    crypto: &dyn CryptoProvider,
    token_is_accepted: impl Fn(u32) -> bool,
) -> Result<DecodedChunk, StatusCode> {
    let mut cursor = Cursor::new(raw);
    let header = read_uacp_header(&mut cursor)?;

    let _security_header = if header.kind == MessageKind::Opn {
        SecurityHeader::read_asymmetric(&mut cursor)?
    } else {
        let sh = SecurityHeader::read_symmetric(&mut cursor)?;
        if let SecurityHeader::Symmetric { token_id } = sh {
            if !token_is_accepted(token_id) {
                return Err(StatusCode::BadSecureChannelIdInvalid);
            }
        }
        sh
    };

    let cipher_tail_start = cursor.position() as usize;
    let cipher_tail = &raw[cipher_tail_start..];

    let signature_size = crypto.signature_size();
    if cipher_tail.len() < signature_size {
        return Err(StatusCode::BadSecurityChecksFailed);
    }

    let mut plain_tail = vec![0u8; cipher_tail.len()];
    if !crypto.decrypt(cipher_tail, &mut plain_tail) {
        return Err(StatusCode::BadSecurityChecksFailed);
    }

    let (plain_with_padding, signature) =
        plain_tail.split_at(plain_tail.len() - signature_size);

    if signature_size > 0 {
        let mut to_verify = Vec::with_capacity(raw.len());
        to_verify.extend(std::iter::repeat(0u8).take(UACP_HEADER_SIZE));
        to_verify.extend_from_slice(&raw[UACP_HEADER_SIZE..cipher_tail_start]);
        to_verify.extend_from_slice(plain_with_padding);
        if !crypto.verify(&to_verify, signature) {
            return Err(StatusCode::BadSecurityChecksFailed);
        }
    }

    let body_end = strip_padding(plain_with_padding, crypto.cipher_block_size())?;

    let mut body_cursor = Cursor::new(&plain_with_padding[..body_end]);
    let sequence_header = read_sequence_header_from_plain(&mut body_cursor)?;
    let body = plain_with_padding[body_cursor.position() as usize..body_end].to_vec();

    Ok(DecodedChunk { kind: header.kind, sequence_header, body })
}

/// The sequence header lives in the plaintext region right after the
/// security header for OPN chunks, but for MSG/CLO chunks it is part of
/// the region this function receives already split from the security
/// header reader above, so it is simply the first 8 bytes of the
/// decrypted tail.
fn read_sequence_header_from_plain(cursor: &mut Cursor<&[u8]>) -> Result<SequenceHeader, StatusCode> {
    read_sequence_header(cursor)
}

/// Strip the trailing padding-count byte (and the padding bytes it
/// describes) added by the send side's `compute_padding` (spec §4.4).
/// For a stream cipher (`block_size <= 1`) there is no padding to
/// strip.
fn strip_padding(plain_with_padding: &[u8], block_size: usize) -> Result<usize, StatusCode> {
    if block_size <= 1 {
        return Ok(plain_with_padding.len());
    }
    let count_byte = *plain_with_padding
        .last()
        .ok_or(StatusCode::BadSecurityChecksFailed)?;
    let padding_len = count_byte as usize + 1;
    if padding_len > plain_with_padding.len() {
        return Err(StatusCode::BadSecurityChecksFailed);
    }
    Ok(plain_with_padding.len() - padding_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::send::encode_chunk;
    use crate::chunk::SecurityHeader;
    use crate::collaborators::crypto::NullCryptoProvider;

    #[test]
    fn decode_roundtrips_an_encoded_symmetric_chunk() {
        let security_header = SecurityHeader::Symmetric { token_id: 42 };
        let seq = SequenceHeader { sequence_number: 5, request_id: 9 };
        let body = b"payload bytes";
        let raw = encode_chunk(
            MessageKind::Msg,
            &security_header,
            seq,
            body,
            &NullCryptoProvider,
            4096,
            false,
        )
        .unwrap();

        let decoded = decode_chunk(&raw, &NullCryptoProvider, |id| id == 42).unwrap();
        assert_eq!(decoded.kind, MessageKind::Msg);
        assert_eq!(decoded.sequence_header.sequence_number, 5);
        assert_eq!(decoded.sequence_header.request_id, 9);
        assert_eq!(decoded.body, body);
    }

    /// A real (non-identity) block cipher, unlike `NullCryptoProvider`,
    /// so this exercises that the sequence header actually survives
    /// encryption/decryption and that non-zero padding is stripped
    /// correctly, not just round-tripped through a no-op copy.
    struct XorBlockProvider {
        key: u8,
    }

    impl CryptoProvider for XorBlockProvider {
        fn signature_size(&self) -> usize {
            4
        }

        fn cipher_block_size(&self) -> usize {
            16
        }

        fn sign(&self, plain: &[u8], signature_out: &mut [u8]) -> bool {
            let checksum = plain.iter().fold(0u8, |acc, b| acc ^ b);
            signature_out.iter_mut().for_each(|b| *b = checksum);
            true
        }

        fn verify(&self, plain: &[u8], signature: &[u8]) -> bool {
            let mut expected = vec![0u8; signature.len()];
            self.sign(plain, &mut expected);
            expected == signature
        }

        fn encrypt(&self, plain: &[u8], cipher_out: &mut [u8]) -> bool {
            if plain.len() != cipher_out.len() {
                return false;
            }
            for (o, p) in cipher_out.iter_mut().zip(plain) {
                *o = p ^ self.key;
            }
            true
        }

        fn decrypt(&self, cipher: &[u8], plain_out: &mut [u8]) -> bool {
            self.encrypt(cipher, plain_out)
        }
    }

    #[test]
    fn decode_roundtrips_sequence_header_and_padding_under_a_real_block_cipher() {
        let crypto = XorBlockProvider { key: 0x5A };
        let security_header = SecurityHeader::Symmetric { token_id: 3 };
        let seq = SequenceHeader { sequence_number: 42, request_id: 17 };
        let body = b"a body that is not block-aligned";

        let raw =
            encode_chunk(MessageKind::Msg, &security_header, seq, body, &crypto, 8192, false)
                .unwrap();

        let decoded = decode_chunk(&raw, &crypto, |id| id == 3).unwrap();
        assert_eq!(decoded.sequence_header, seq);
        assert_eq!(decoded.body, body);
    }

    #[test]
    fn decode_rejects_unknown_token_id() {
        let security_header = SecurityHeader::Symmetric { token_id: 42 };
        let seq = SequenceHeader { sequence_number: 5, request_id: 9 };
        let raw = encode_chunk(
            MessageKind::Msg,
            &security_header,
            seq,
            b"x",
            &NullCryptoProvider,
            4096,
            false,
        )
        .unwrap();

        let result = decode_chunk(&raw, &NullCryptoProvider, |id| id == 999);
        assert_eq!(result, Err(StatusCode::BadSecureChannelIdInvalid));
    }
}
