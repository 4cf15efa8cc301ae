//! Cryptographic Provider facade (spec §4.7). The core calls through
//! this trait for signing, verifying, encrypting and decrypting chunk
//! bodies; it never links a crypto library directly except for the
//! optional concrete `libsodium` backend below, grounded directly on
//! the teacher's `net::crypto` (same AEAD primitive, same detached
//! nonce-as-counter convention — generalized from a fixed 8-byte tail
//! nonce to the sizes the provider reports, since this crate talks to
//! more than one security policy).

pub const MAX_MAC_SIZE: usize = 64;

/// Everything the Chunk Manager needs from a security policy's crypto
/// implementation (spec §4.3, §4.4). A `None`-mode provider (used for
/// `MessageSecurityMode::None` channels and in tests) signs/encrypts
/// nothing and always verifies successfully.
pub trait CryptoProvider {
    /// Size in bytes of the signature/MAC this policy appends, or 0 for
    /// `SecurityMode::None`.
    fn signature_size(&self) -> usize;

    /// Block size used to compute the padding formula (spec §4.4); 1
    /// means "no padding needed".
    fn cipher_block_size(&self) -> usize;

    /// Sign `plain` (the cleartext chunk body plus any padding), writing
    /// the signature into `signature_out`. `signature_out.len()` is
    /// exactly `signature_size()`.
    fn sign(&self, plain: &[u8], signature_out: &mut [u8]) -> bool;

    /// Verify `signature` over `plain`.
    fn verify(&self, plain: &[u8], signature: &[u8]) -> bool;

    /// Encrypt `plain` in place into `cipher_out` (same length).
    fn encrypt(&self, plain: &[u8], cipher_out: &mut [u8]) -> bool;

    /// Decrypt `cipher` in place into `plain_out` (same length).
    fn decrypt(&self, cipher: &[u8], plain_out: &mut [u8]) -> bool;
}

/// No-op provider for `MessageSecurityMode::None` channels: zero-size
/// signature, block size 1, encrypt/decrypt are plain copies.
pub struct NullCryptoProvider;

impl CryptoProvider for NullCryptoProvider {
    fn signature_size(&self) -> usize {
        0
    }

    fn cipher_block_size(&self) -> usize {
        1
    }

    fn sign(&self, _plain: &[u8], _signature_out: &mut [u8]) -> bool {
        true
    }

    fn verify(&self, _plain: &[u8], signature: &[u8]) -> bool {
        signature.is_empty()
    }

    fn encrypt(&self, plain: &[u8], cipher_out: &mut [u8]) -> bool {
        if plain.len() != cipher_out.len() {
            return false;
        }
        cipher_out.copy_from_slice(plain);
        true
    }

    fn decrypt(&self, cipher: &[u8], plain_out: &mut [u8]) -> bool {
        if cipher.len() != plain_out.len() {
            return false;
        }
        plain_out.copy_from_slice(cipher);
        true
    }
}

#[cfg(feature = "libsodium")]
pub mod libsodium_backend {
    //! Concrete AEAD provider over `libsodium-sys`'s
    //! `crypto_aead_chacha20poly1305_ietf_{encrypt,decrypt}_detached`,
    //! lifted near-verbatim from the teacher's `net::crypto` with the
    //! nonce threaded in per call instead of derived from a counter
    //! field, since here the Chunk Manager (not the provider) owns
    //! sequencing.
    use super::CryptoProvider;
    use byteorder::{LittleEndian, WriteBytesExt};

    pub const MAC_SIZE: usize = libsodium_sys::crypto_aead_chacha20poly1305_IETF_ABYTES as usize;
    pub const KEY_SIZE: usize = libsodium_sys::crypto_aead_chacha20poly1305_IETF_KEYBYTES as usize;
    pub const NONCE_SIZE: usize = libsodium_sys::crypto_aead_chacha20poly1305_IETF_NPUBBYTES as usize;

    const NONCE_OFFSET: usize = NONCE_SIZE - 8;

    fn nonce_to_bytes(nonce: u64) -> [u8; NONCE_SIZE] {
        let mut bytes = [0u8; NONCE_SIZE];
        (&mut bytes[NONCE_OFFSET..])
            .write_u64::<LittleEndian>(nonce)
            .expect("fixed-size nonce buffer");
        bytes
    }

    pub struct Chacha20Poly1305Provider {
        pub key: [u8; KEY_SIZE],
        pub nonce: u64,
    }

    impl CryptoProvider for Chacha20Poly1305Provider {
        fn signature_size(&self) -> usize {
            MAC_SIZE
        }

        fn cipher_block_size(&self) -> usize {
            1
        }

        fn sign(&self, _plain: &[u8], _signature_out: &mut [u8]) -> bool {
            // AEAD produces the MAC as part of encrypt; a separate sign
            // step is a no-op for this provider. The Chunk Manager still
            // reserves `signature_size()` == MAC_SIZE plaintext bytes for
            // it (left zeroed here), which `encrypt` below treats as the
            // placeholder that the real detached MAC tag overwrites.
            true
        }

        fn verify(&self, _plain: &[u8], _signature: &[u8]) -> bool {
            true
        }

        /// `plain`'s last `MAC_SIZE` bytes are the zeroed placeholder
        /// `sign` left; only `plain[..plain.len() - MAC_SIZE]` is real
        /// ciphertext input. `cipher_out` is the same total length (the
        /// trait's same-length contract), split the same way so the
        /// detached tag lands where the placeholder was.
        fn encrypt(&self, plain: &[u8], cipher_out: &mut [u8]) -> bool {
            if plain.len() != cipher_out.len() || plain.len() < MAC_SIZE {
                return false;
            }
            let body_len = plain.len() - MAC_SIZE;
            let (body_plain, _placeholder) = plain.split_at(body_len);
            let (body_cipher, mac) = cipher_out.split_at_mut(body_len);
            let nonce_bytes = nonce_to_bytes(self.nonce);
            unsafe {
                let result = libsodium_sys::crypto_aead_chacha20poly1305_ietf_encrypt_detached(
                    body_cipher.as_mut_ptr(),
                    mac.as_mut_ptr(),
                    std::ptr::null_mut(),
                    body_plain.as_ptr(),
                    body_plain.len() as u64,
                    std::ptr::null(),
                    0,
                    std::ptr::null(),
                    nonce_bytes.as_ptr(),
                    self.key.as_ptr(),
                );
                result != -1
            }
        }

        /// Mirrors `encrypt`'s split: `cipher`'s trailing `MAC_SIZE`
        /// bytes are the detached tag, the rest is the real ciphertext
        /// body. `plain_out` is the same total length as `cipher`; its
        /// trailing `MAC_SIZE` bytes are zeroed to match the placeholder
        /// `sign` would have left on the encoding side.
        fn decrypt(&self, cipher: &[u8], plain_out: &mut [u8]) -> bool {
            if cipher.len() != plain_out.len() || cipher.len() < MAC_SIZE {
                return false;
            }
            let body_len = cipher.len() - MAC_SIZE;
            let (body, mac) = cipher.split_at(body_len);
            let (body_out, placeholder_out) = plain_out.split_at_mut(body_len);
            let nonce_bytes = nonce_to_bytes(self.nonce);
            let ok = unsafe {
                let result = libsodium_sys::crypto_aead_chacha20poly1305_ietf_decrypt_detached(
                    body_out.as_mut_ptr(),
                    std::ptr::null_mut(),
                    body.as_ptr(),
                    body.len() as u64,
                    mac.as_ptr(),
                    std::ptr::null(),
                    0,
                    nonce_bytes.as_ptr(),
                    self.key.as_ptr(),
                );
                result != -1
            };
            if ok {
                placeholder_out.fill(0);
            }
            ok
        }
    }
}
