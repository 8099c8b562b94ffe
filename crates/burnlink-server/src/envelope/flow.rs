use tracing::debug;
use zeroize::Zeroizing;

use super::crypto::{decrypt, encrypt, generate_key, EnvelopeKey};
use super::link::{assemble_link, split_link};
use super::ProtocolError;
use crate::store::Store;

/// Longest secret accepted for sealing, counted in characters after trimming.
pub const MAX_SECRET_CHARS: usize = 1000;

/// Where ciphertext goes and comes back from. Only ever sees ciphertext and ids.
#[allow(async_fn_in_trait)]
pub trait SecretChannel {
    /// Hand over ciphertext, get back the id it is stored under.
    async fn store(&self, ciphertext: &str) -> Result<String, ProtocolError>;
    /// Consume the ciphertext stored under `id`.
    async fn take(&self, id: &str) -> Result<String, ProtocolError>;
}

impl SecretChannel for Store {
    async fn store(&self, ciphertext: &str) -> Result<String, ProtocolError> {
        Ok(self.create(ciphertext)?)
    }

    async fn take(&self, id: &str) -> Result<String, ProtocolError> {
        Ok(self.take_and_remove(id)?)
    }
}

/// Reject secrets that are blank or longer than [`MAX_SECRET_CHARS`].
pub fn validate_plaintext(plaintext: &str) -> Result<(), ProtocolError> {
    let trimmed = plaintext.trim();
    if trimmed.is_empty() {
        return Err(ProtocolError::EmptySecret);
    }
    let len = trimmed.chars().count();
    if len > MAX_SECRET_CHARS {
        return Err(ProtocolError::InputTooLong {
            len,
            max: MAX_SECRET_CHARS,
        });
    }
    Ok(())
}

/// Sender side: validate, encrypt under a fresh key, store the ciphertext,
/// and return the one-time link `origin/id#key`.
pub async fn seal<C: SecretChannel>(
    plaintext: &str,
    origin: &str,
    channel: &C,
) -> Result<String, ProtocolError> {
    validate_plaintext(plaintext)?;

    let key = generate_key();
    let ciphertext = encrypt(plaintext, &key)?;
    let id = channel.store(&ciphertext).await?;

    let key_hex = Zeroizing::new(key.to_hex());
    Ok(assemble_link(origin, &id, &key_hex))
}

/// Receiver progress. `Revealed` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevealState {
    Idle,
    FetchingCiphertext,
    Decrypting,
    Revealed,
    Failed(ProtocolError),
}

/// Receiver side of one link.
///
/// The retrieval is issued at most once per `Reveal`: once the state is
/// terminal, further calls to [`Reveal::open`] return the recorded outcome.
pub struct Reveal {
    state: RevealState,
    plaintext: Option<Zeroizing<String>>,
}

impl Default for Reveal {
    fn default() -> Self {
        Self::new()
    }
}

impl Reveal {
    pub fn new() -> Self {
        Self {
            state: RevealState::Idle,
            plaintext: None,
        }
    }

    pub fn state(&self) -> &RevealState {
        &self.state
    }

    /// Split `link`, take its ciphertext from `channel`, and decrypt it.
    ///
    /// The link is only read on the first call. A link with no key, or a key
    /// that cannot be parsed, fails before the channel is touched.
    pub async fn open<C: SecretChannel>(
        &mut self,
        link: &str,
        channel: &C,
    ) -> Result<&str, ProtocolError> {
        match self.state {
            RevealState::Idle => match self.run(link, channel).await {
                Ok(plaintext) => {
                    self.plaintext = Some(Zeroizing::new(plaintext));
                    self.transition(RevealState::Revealed);
                }
                Err(e) => {
                    debug!(error = %e, "reveal failed");
                    self.transition(RevealState::Failed(e));
                }
            },
            // An earlier call was dropped mid-flight; the ciphertext may already be gone.
            RevealState::FetchingCiphertext | RevealState::Decrypting => {
                self.transition(RevealState::Failed(ProtocolError::NotFound));
            }
            RevealState::Revealed | RevealState::Failed(_) => {}
        }

        match (&self.state, &self.plaintext) {
            (RevealState::Revealed, Some(plaintext)) => Ok(plaintext.as_str()),
            (RevealState::Failed(e), _) => Err(e.clone()),
            _ => Err(ProtocolError::NotFound),
        }
    }

    async fn run<C: SecretChannel>(
        &mut self,
        link: &str,
        channel: &C,
    ) -> Result<String, ProtocolError> {
        let (id, key_hex) = split_link(link)?;
        let key = EnvelopeKey::from_hex(&Zeroizing::new(key_hex))?;

        self.transition(RevealState::FetchingCiphertext);
        let ciphertext = channel.take(&id).await?;

        self.transition(RevealState::Decrypting);
        decrypt(&ciphertext, &key)
    }

    fn transition(&mut self, next: RevealState) {
        debug!(from = ?self.state, to = ?next, "reveal state");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Store-backed channel that counts how often `take` is called.
    #[derive(Default)]
    struct CountingChannel {
        store: Store,
        takes: AtomicUsize,
    }

    impl SecretChannel for CountingChannel {
        async fn store(&self, ciphertext: &str) -> Result<String, ProtocolError> {
            self.store.store(ciphertext).await
        }

        async fn take(&self, id: &str) -> Result<String, ProtocolError> {
            self.takes.fetch_add(1, Ordering::SeqCst);
            self.store.take(id).await
        }
    }

    impl CountingChannel {
        fn takes(&self) -> usize {
            self.takes.load(Ordering::SeqCst)
        }
    }

    #[tokio::test]
    async fn hello_world_reveals_exactly_once() {
        let channel = CountingChannel::default();
        let link = seal("hello world", "https://example", &channel)
            .await
            .unwrap();
        assert!(link.starts_with("https://example/"));
        assert_eq!(channel.store.len(), 1);

        let mut first = Reveal::new();
        assert_eq!(first.open(&link, &channel).await.unwrap(), "hello world");
        assert_eq!(first.state(), &RevealState::Revealed);

        let mut second = Reveal::new();
        assert_eq!(
            second.open(&link, &channel).await,
            Err(ProtocolError::NotFound)
        );
        assert_eq!(
            second.state(),
            &RevealState::Failed(ProtocolError::NotFound)
        );
        assert!(channel.store.is_empty());
    }

    #[tokio::test]
    async fn missing_fragment_never_fetches() {
        let channel = CountingChannel::default();
        let link = seal("s3cret", "https://example", &channel).await.unwrap();
        let (without_key, _) = link.split_once('#').unwrap();

        let mut reveal = Reveal::new();
        assert_eq!(
            reveal.open(without_key, &channel).await,
            Err(ProtocolError::MissingKey)
        );
        assert_eq!(channel.takes(), 0);
        assert_eq!(channel.store.len(), 1);
    }

    #[tokio::test]
    async fn mangled_key_never_fetches() {
        let channel = CountingChannel::default();
        let link = seal("s3cret", "https://example", &channel).await.unwrap();
        let truncated = &link[..link.len() - 4];

        let mut reveal = Reveal::new();
        assert_eq!(
            reveal.open(truncated, &channel).await,
            Err(ProtocolError::InvalidKey)
        );
        assert_eq!(channel.takes(), 0);

        // The intact link still works.
        let mut reveal = Reveal::new();
        assert_eq!(reveal.open(&link, &channel).await.unwrap(), "s3cret");
    }

    #[tokio::test]
    async fn wrong_key_fails_and_consumes() {
        let channel = CountingChannel::default();
        let link = seal("s3cret", "https://example", &channel).await.unwrap();
        let (base, _) = link.split_once('#').unwrap();
        let forged = format!("{base}#{}", generate_key().to_hex());

        let mut reveal = Reveal::new();
        assert_eq!(
            reveal.open(&forged, &channel).await,
            Err(ProtocolError::DecryptionFailed)
        );
        let mut reveal = Reveal::new();
        assert_eq!(
            reveal.open(&link, &channel).await,
            Err(ProtocolError::NotFound)
        );
    }

    #[tokio::test]
    async fn failed_is_terminal() {
        let channel = CountingChannel::default();
        let mut reveal = Reveal::new();
        let link = format!(
            "https://example/{}#{}",
            uuid::Uuid::new_v4(),
            generate_key().to_hex()
        );
        assert_eq!(
            reveal.open(&link, &channel).await,
            Err(ProtocolError::NotFound)
        );
        assert_eq!(
            reveal.open(&link, &channel).await,
            Err(ProtocolError::NotFound)
        );
        assert_eq!(channel.takes(), 1);
    }

    #[tokio::test]
    async fn revealed_is_terminal() {
        let channel = CountingChannel::default();
        let link = seal("once", "https://example", &channel).await.unwrap();
        let mut reveal = Reveal::new();
        assert_eq!(reveal.open(&link, &channel).await.unwrap(), "once");
        assert_eq!(reveal.open(&link, &channel).await.unwrap(), "once");
        assert_eq!(channel.takes(), 1);
    }

    #[tokio::test]
    async fn too_long_is_rejected_before_storing() {
        let channel = CountingChannel::default();
        let long = "a".repeat(MAX_SECRET_CHARS + 1);
        assert_eq!(
            seal(&long, "https://example", &channel).await,
            Err(ProtocolError::InputTooLong {
                len: MAX_SECRET_CHARS + 1,
                max: MAX_SECRET_CHARS
            })
        );
        assert!(channel.store.is_empty());
    }

    #[tokio::test]
    async fn blank_is_rejected() {
        let channel = CountingChannel::default();
        for blank in ["", "   ", "\n\t "] {
            assert_eq!(
                seal(blank, "https://example", &channel).await,
                Err(ProtocolError::EmptySecret)
            );
        }
        assert!(channel.store.is_empty());
    }

    #[tokio::test]
    async fn limit_counts_trimmed_chars_but_keeps_whitespace() {
        let channel = CountingChannel::default();
        let body = "ü".repeat(MAX_SECRET_CHARS);
        let padded = format!("  {body}\n");
        let link = seal(&padded, "https://example", &channel).await.unwrap();

        let mut reveal = Reveal::new();
        assert_eq!(reveal.open(&link, &channel).await.unwrap(), padded);
    }

    #[test]
    fn validate_boundaries() {
        assert!(validate_plaintext("x").is_ok());
        assert!(validate_plaintext(&"x".repeat(MAX_SECRET_CHARS)).is_ok());
        assert!(validate_plaintext(&"x".repeat(MAX_SECRET_CHARS + 1)).is_err());
    }
}
