//! Identifier normalization.
//!
//! Hardware addresses are submitted as lower-case, colon-separated octets
//! (`a8:1d:16:67:42:f7`). Input that already contains a colon is trusted as
//! formatted; input that does not clean up to exactly twelve hex digits is
//! kept in its cleaned form rather than dropped.

/// Number of hex digits in a 48-bit hardware address.
const ADDRESS_HEX_DIGITS: usize = 12;

/// Normalizes a hardware (MAC) address.
///
/// # Example
///
/// ```
/// use g2s_core::normalize_hardware_address;
///
/// assert_eq!(
///     normalize_hardware_address(Some("A8-1D-16-67-42-F7")).as_deref(),
///     Some("a8:1d:16:67:42:f7")
/// );
/// assert_eq!(normalize_hardware_address(None), None);
/// ```
pub fn normalize_hardware_address(raw: Option<&str>) -> Option<String> {
    let raw = raw?;
    if raw.is_empty() || raw.contains(':') {
        return Some(raw.to_string());
    }

    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect();

    if cleaned.len() != ADDRESS_HEX_DIGITS || !cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Some(cleaned);
    }

    let octets: Vec<&str> = (0..ADDRESS_HEX_DIGITS)
        .step_by(2)
        .map(|i| &cleaned[i..i + 2])
        .collect();
    Some(octets.join(":"))
}
