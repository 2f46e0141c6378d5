//! Password acquisition for credentialed exports and imports

use crate::crypto::SecureString;
use crate::error::{PackError, PackResult};

/// Minimum length accepted for a new export password
pub const MIN_PASSWORD_LEN: usize = 8;

/// Prompt for a password (hidden input)
pub fn prompt_password(prompt: &str) -> PackResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| PackError::Io(format!("Failed to read password: {}", e)))
}

/// Prompt twice for a new password until both entries match
pub fn prompt_new_password() -> PackResult<SecureString> {
    loop {
        let first = prompt_password("Export password: ")?;
        if first.len() < MIN_PASSWORD_LEN {
            eprintln!(
                "Password must be at least {} characters. Please try again.",
                MIN_PASSWORD_LEN
            );
            continue;
        }

        let second = prompt_password("Confirm password: ")?;
        if first.as_str() != second.as_str() {
            eprintln!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

/// Use the supplied password (from `DASHPACK_PASSWORD`) or prompt for one
pub fn resolve(
    supplied: Option<String>,
    prompt: bool,
    confirm: bool,
) -> PackResult<Option<SecureString>> {
    if let Some(password) = supplied.filter(|p| !p.is_empty()) {
        return Ok(Some(SecureString::from(password)));
    }
    if !prompt {
        return Ok(None);
    }
    let password = if confirm {
        prompt_new_password()?
    } else {
        prompt_password("Package password: ")?
    };
    Ok(Some(password))
}
