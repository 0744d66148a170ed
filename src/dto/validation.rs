//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player name, in characters.
pub const MAX_NAME_CHARS: usize = 64;

/// Validates that a player name has visible characters and a sane length.
///
/// ```ignore
/// validate_player_name("Alice") // Ok
/// validate_player_name("   ")   // Err - blank
/// ```
pub fn validate_player_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("player_name_blank");
        err.message = Some("Please enter a player name".into());
        return Err(err);
    }

    let chars = trimmed.chars().count();
    if chars > MAX_NAME_CHARS {
        let mut err = ValidationError::new("player_name_length");
        err.message = Some(
            format!("Player name must be at most {MAX_NAME_CHARS} characters (got {chars})")
                .into(),
        );
        return Err(err);
    }

    Ok(())
}
