use rand::{distributions::Alphanumeric, Rng};

/// Minimum nonce length accepted in a login message
pub const MIN_NONCE_LENGTH: usize = 8;

/// Generate a random alphanumeric nonce for a login message
///
/// Lengths below [`MIN_NONCE_LENGTH`] are raised to it so the result is
/// always accepted by [`build_message`](crate::message::build_message).
///
/// # Example
/// ```rust
/// use farcaster_siwe::crypto::nonce::generate_nonce;
///
/// let nonce = generate_nonce(17);
/// assert_eq!(nonce.len(), 17);
/// ```
pub fn generate_nonce(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.max(MIN_NONCE_LENGTH))
        .map(char::from)
        .collect()
}

/// Whether a nonce has the shape a login message requires
pub fn is_valid_nonce(nonce: &str) -> bool {
    nonce.len() >= MIN_NONCE_LENGTH && nonce.chars().all(|c| c.is_ascii_alphanumeric())
}
