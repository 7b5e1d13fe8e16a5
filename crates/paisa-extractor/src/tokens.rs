//! Token estimation heuristic
//!
//! One token is approximated as four characters. Used only for chunk-size
//! and overflow decisions, never billing; no exactness is guaranteed.

/// Approximate the token count of a text blob: `ceil(len / 4)`
pub fn estimate_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn test_rounds_up() {
        assert_eq!(estimate_tokens("a"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(8000)), 2000);
    }
}
