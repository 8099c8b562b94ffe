use crate::store::StoreError;

/// Everything that can go wrong while sealing or revealing a secret.
///
/// `Display` keeps the kinds apart for logs; [`ProtocolError::user_message`]
/// deliberately folds "no such secret" and "wrong key" into one answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("secret not found or already retrieved")]
    NotFound,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("link has no key fragment")]
    MissingKey,
    #[error("link has no secret id")]
    MissingId,
    #[error("key fragment is not a valid key")]
    InvalidKey,
    #[error("invalid link: {0}")]
    InvalidLink(String),
    #[error("secret is {len} characters, the limit is {max}")]
    InputTooLong { len: usize, max: usize },
    #[error("secret is empty")]
    EmptySecret,
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProtocolError {
    /// Message safe to show to the person holding the link.
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound | Self::DecryptionFailed | Self::MissingKey | Self::InvalidKey => {
                "No secret was found for this link.".into()
            }
            Self::MissingId | Self::InvalidLink(_) => "This is not a valid secret link.".into(),
            Self::InputTooLong { max, .. } => {
                format!("The secret may be at most {max} characters long.")
            }
            Self::EmptySecret => "Please enter a secret.".into(),
            Self::EncryptionFailed => "The secret could not be encrypted.".into(),
            Self::Transport(_) => "Could not reach the server.".into(),
        }
    }
}

impl From<StoreError> for ProtocolError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound,
            StoreError::EmptyCiphertext => Self::EmptySecret,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_failures_look_identical_to_users() {
        let a = ProtocolError::NotFound.user_message();
        let b = ProtocolError::DecryptionFailed.user_message();
        let c = ProtocolError::MissingKey.user_message();
        assert_eq!(a, b);
        assert_eq!(b, c);
        // ...but stay distinct in logs.
        assert_ne!(
            ProtocolError::NotFound.to_string(),
            ProtocolError::DecryptionFailed.to_string()
        );
    }

    #[test]
    fn store_errors_convert() {
        assert_eq!(
            ProtocolError::from(StoreError::NotFound),
            ProtocolError::NotFound
        );
    }
}
