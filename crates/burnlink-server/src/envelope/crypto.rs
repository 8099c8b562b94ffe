use chacha20poly1305::{
    aead::{Aead, KeyInit, OsRng},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::RngCore;
use zeroize::{ZeroizeOnDrop, Zeroizing};

use super::ProtocolError;

/// Key length in bytes (256 bits).
pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// First byte of every envelope, so the layout can change without guessing.
const ENVELOPE_V1_MARKER: u8 = 0x01;
const HEADER_LEN: usize = 1 + NONCE_LEN;

/// Per-secret 32-byte key. Lives only on the client side and in the link fragment.
#[derive(ZeroizeOnDrop)]
pub struct EnvelopeKey([u8; KEY_LEN]);

impl EnvelopeKey {
    /// Draw a fresh key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self(key)
    }

    /// Parse the 64-char hex form carried in a link fragment.
    pub fn from_hex(encoded: &str) -> Result<Self, ProtocolError> {
        let bytes = Zeroizing::new(hex::decode(encoded).map_err(|_| ProtocolError::InvalidKey)?);
        if bytes.len() != KEY_LEN {
            return Err(ProtocolError::InvalidKey);
        }
        let mut key = [0u8; KEY_LEN];
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    /// Lowercase hex, safe to place in a URL fragment unchanged.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for EnvelopeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EnvelopeKey(..)")
    }
}

/// Generate a fresh key for one secret.
pub fn generate_key() -> EnvelopeKey {
    EnvelopeKey::generate()
}

/// Encrypt `plaintext` under `key`.
///
/// Output is lowercase hex of `marker || nonce || ciphertext+tag`, with a new
/// random nonce per call.
pub fn encrypt(plaintext: &str, key: &EnvelopeKey) -> Result<String, ProtocolError> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from(nonce_bytes);

    let sealed = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| ProtocolError::EncryptionFailed)?;

    let mut out = Vec::with_capacity(HEADER_LEN + sealed.len());
    out.push(ENVELOPE_V1_MARKER);
    out.extend_from_slice(&nonce_bytes);
    out.extend_from_slice(&sealed);
    Ok(hex::encode(out))
}

/// Decrypt an envelope produced by [`encrypt`].
///
/// Any malformed input, wrong key, or tampering yields `DecryptionFailed`.
/// A successful result is always non-empty UTF-8.
pub fn decrypt(ciphertext: &str, key: &EnvelopeKey) -> Result<String, ProtocolError> {
    let bytes = hex::decode(ciphertext).map_err(|_| ProtocolError::DecryptionFailed)?;
    if bytes.len() < HEADER_LEN + TAG_LEN || bytes[0] != ENVELOPE_V1_MARKER {
        return Err(ProtocolError::DecryptionFailed);
    }

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let nonce = Nonce::from_slice(&bytes[1..HEADER_LEN]);

    let plaintext = Zeroizing::new(
        cipher
            .decrypt(nonce, &bytes[HEADER_LEN..])
            .map_err(|_| ProtocolError::DecryptionFailed)?,
    );

    let text = std::str::from_utf8(&plaintext).map_err(|_| ProtocolError::DecryptionFailed)?;
    if text.is_empty() {
        return Err(ProtocolError::DecryptionFailed);
    }
    Ok(text.to_owned())
}
