pub use alloy_primitives::Address;

use crate::error::MessageError;

/// Parse an account address from a login message
///
/// Accepts `0x` followed by 40 hex digits. All-lowercase and all-uppercase
/// digits are taken as-is; mixed case is treated as an EIP-55 checksum and
/// must match it exactly.
pub fn parse_address(raw: &str) -> Result<Address, MessageError> {
    let digits = raw.strip_prefix("0x").ok_or(MessageError::InvalidAddress)?;
    if digits.len() != 40 {
        return Err(MessageError::InvalidAddress);
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        Address::parse_checksummed(raw, None).map_err(|_| MessageError::InvalidAddress)
    } else {
        raw.parse().map_err(|_| MessageError::InvalidAddress)
    }
}
