//! Client-side form rules, checked before any gateway call.

use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;

/// A signup form that must not reach the gateway. The messages are shown to
/// the user as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignupError {
  #[error("הסיסמאות אינן תואמות")]
  PasswordMismatch,

  #[error("הסיסמה חייבת להכיל לפחות 8 תווים")]
  PasswordTooShort,
}

/// Confirmation is checked first, then length (in characters).
pub fn validate_signup(password: &str, confirmation: &str) -> Result<(), SignupError> {
  if password != confirmation {
    return Err(SignupError::PasswordMismatch);
  }
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(SignupError::PasswordTooShort);
  }
  Ok(())
}

/// The trimmed insight body, or `None` when there is nothing to post.
pub fn insight_content(raw: &str) -> Option<&str> {
  let trimmed = raw.trim();
  (!trimmed.is_empty()).then_some(trimmed)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn mismatch_reported_before_length() {
    assert_eq!(
      validate_signup("short", "other"),
      Err(SignupError::PasswordMismatch)
    );
    assert_eq!(
      SignupError::PasswordMismatch.to_string(),
      "הסיסמאות אינן תואמות"
    );
  }

  #[test]
  fn short_password_rejected() {
    assert_eq!(
      validate_signup("short", "short"),
      Err(SignupError::PasswordTooShort)
    );
    assert_eq!(
      SignupError::PasswordTooShort.to_string(),
      "הסיסמה חייבת להכיל לפחות 8 תווים"
    );
  }

  #[test]
  fn eight_characters_is_enough() {
    assert!(validate_signup("12345678", "12345678").is_ok());
    assert!(validate_signup("סיסמהארוכה", "סיסמהארוכה").is_ok());
  }

  #[test]
  fn whitespace_only_insight_is_empty() {
    assert_eq!(insight_content("  \n\t "), None);
    assert_eq!(insight_content("  פשט  "), Some("פשט"));
  }
}
