//! Validation helpers for DTOs.

use validator::ValidationError;

const PLAYER_ID_HEX_LEN: usize = 40;
const MAX_ENTITY_ID_LEN: usize = 64;

/// Validates that a player ID is a wallet address: `0x` followed by 40 hexadecimal characters.
///
/// # Examples
///
/// ```ignore
/// validate_player_id("0x52908400098527886E0F7030069857D2E4169EE7") // Ok
/// validate_player_id("52908400098527886E0F7030069857D2E4169EE7")   // Err - no prefix
/// validate_player_id("0x5290")                                     // Err - too short
/// ```
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    let Some(hex) = id.strip_prefix("0x") else {
        let mut err = ValidationError::new("player_id_prefix");
        err.message = Some("Player ID must start with `0x`".into());
        return Err(err);
    };

    if hex.len() != PLAYER_ID_HEX_LEN {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!(
                "Player ID must have exactly {PLAYER_ID_HEX_LEN} hexadecimal characters after `0x` (got {})",
                hex.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player ID must contain only hexadecimal characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a quest, poll, option or post identifier: 1 to 64 characters among `[A-Za-z0-9_-]`.
pub fn validate_entity_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_ENTITY_ID_LEN {
        let mut err = ValidationError::new("entity_id_length");
        err.message = Some(
            format!(
                "Identifier must be between 1 and {MAX_ENTITY_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        let mut err = ValidationError::new("entity_id_format");
        err.message =
            Some("Identifier must contain only letters, digits, `-` or `_`".into());
        return Err(err);
    }

    Ok(())
}
