use crate::error::{AppError, AppResult};
use std::sync::Arc;

/// Character set for generating short codes.
pub const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M',
    'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Produces one candidate code of the requested length per call.
pub type CodeSource = Arc<dyn Fn(usize) -> String + Send + Sync>;

/// Draw a code from the alphabet using nanoid's OS-seeded CSPRNG.
pub fn random_code(length: usize) -> String {
    nanoid::nanoid!(length, ALPHABET_CHARS)
}

/// The default [`CodeSource`], backed by [`random_code`].
pub fn random_code_source() -> CodeSource {
    Arc::new(random_code)
}

/// Service for generating unique short codes.
pub struct ShortCodeService;

impl ShortCodeService {
    /// Generate a short code that `is_taken` does not reject.
    ///
    /// # Arguments
    ///
    /// * `length` - The desired length of the short code
    /// * `max_attempts` - Maximum number of draws before giving up
    /// * `source` - Where candidate codes come from
    /// * `is_taken` - Returns true for codes that are active or quarantined
    ///
    /// # Errors
    ///
    /// Returns `AppError::CodespaceExhausted` if every draw within
    /// `max_attempts` collided.
    pub fn generate_short_code<F>(
        length: usize,
        max_attempts: u32,
        source: &(dyn Fn(usize) -> String + Send + Sync),
        is_taken: F,
    ) -> AppResult<String>
    where
        F: Fn(&str) -> bool,
    {
        for attempt in 1..=max_attempts {
            let code = source(length);

            if !is_taken(&code) {
                return Ok(code);
            }

            tracing::debug!(attempt, "Short code collision, drawing again");
        }

        Err(AppError::CodespaceExhausted {
            attempts: max_attempts,
            length,
        })
    }

    /// Number of distinct codes at `length`, saturating at `u128::MAX`.
    pub fn codespace_size(length: usize) -> u128 {
        let base = ALPHABET_CHARS.len() as u128;
        (0..length).fold(1u128, |acc, _| acc.saturating_mul(base))
    }

    /// Whether `code` could have been issued by this service.
    pub fn is_well_formed(code: &str) -> bool {
        !code.is_empty() && code.len() <= 16 && code.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_alphabet_chars_const() {
        assert_eq!(ALPHABET_CHARS.len(), 62);
    }

    #[test]
    fn test_alphabet_chars_unique() {
        let unique: HashSet<_> = ALPHABET_CHARS.iter().collect();
        assert_eq!(unique.len(), ALPHABET_CHARS.len());
    }

    #[test]
    fn test_random_code_shape() {
        for _ in 0..50 {
            let code = random_code(6);
            assert_eq!(code.chars().count(), 6);
            assert!(code.chars().all(|c| ALPHABET_CHARS.contains(&c)));
        }
    }

    #[test]
    fn test_generate_skips_taken_codes() {
        let calls = AtomicU32::new(0);
        let source = move |_: usize| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 { "taken1".to_string() } else { "fresh1".to_string() }
        };

        let code =
            ShortCodeService::generate_short_code(6, 5, &source, |c| c == "taken1").unwrap();
        assert_eq!(code, "fresh1");
    }

    #[test]
    fn test_generate_exhausts() {
        let source = |_: usize| "AAAAAA".to_string();
        let result = ShortCodeService::generate_short_code(6, 3, &source, |_| true);

        assert!(matches!(
            result,
            Err(AppError::CodespaceExhausted { attempts: 3, length: 6 })
        ));
    }

    #[test]
    fn test_codespace_size() {
        assert_eq!(ShortCodeService::codespace_size(1), 62);
        assert_eq!(ShortCodeService::codespace_size(6), 56_800_235_584);
        assert_eq!(ShortCodeService::codespace_size(64), u128::MAX);
    }

    #[test]
    fn test_is_well_formed() {
        assert!(ShortCodeService::is_well_formed("abc123"));
        assert!(!ShortCodeService::is_well_formed(""));
        assert!(!ShortCodeService::is_well_formed("abc-123"));
        assert!(!ShortCodeService::is_well_formed("abcdefghijklmnopq"));
    }
}
