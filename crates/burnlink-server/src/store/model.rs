use zeroize::ZeroizeOnDrop;

/// One stored ciphertext. Never mutated after insertion, only removed.
/// `ciphertext` is opaque to the server; the key that opens it never arrives here.
#[derive(Debug, ZeroizeOnDrop)]
pub struct SecretRecord {
    /// Ciphertext exactly as submitted by the sender.
    pub ciphertext: String,
    /// Unix timestamp (seconds) when the record was created. Informational only.
    pub created_at: i64,
}

impl SecretRecord {
    pub fn new(ciphertext: String, created_at: i64) -> Self {
        Self {
            ciphertext,
            created_at,
        }
    }

    /// Move the ciphertext out, leaving an empty string behind for the drop-time wipe.
    pub fn into_ciphertext(mut self) -> String {
        std::mem::take(&mut self.ciphertext)
    }
}
