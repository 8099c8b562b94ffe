//! Client-side half of the protocol: the key is generated here, used here,
//! and only ever leaves inside the link fragment.

pub mod crypto;
pub mod error;
pub mod flow;
pub mod link;

pub use crypto::{decrypt, encrypt, generate_key, EnvelopeKey};
pub use error::ProtocolError;
pub use flow::{seal, validate_plaintext, Reveal, RevealState, SecretChannel, MAX_SECRET_CHARS};
pub use link::{assemble_link, split_link};
