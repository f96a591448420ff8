use ethers::types::{Address, U256};

use crate::types::NATIVE_DECIMALS;

/// Render a native amount in whole units with the zero fraction trimmed
/// (`1000000000000000000` wei → `"1"`).
pub fn format_native(wei: U256) -> String {
    let full = ethers::utils::format_units(wei, NATIVE_DECIMALS).unwrap_or_else(|_| "0.0".to_string());
    trim_fraction(&full)
}

/// Render a token amount keeping exactly `decimals` fraction digits
/// (`500` at 2 decimals → `"5.00"`).
pub fn format_token_amount(amount: U256, decimals: u32) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    ethers::utils::format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}

/// Format gas price in Gwei from wei, trimmed to two decimals
pub fn format_gwei(wei: U256) -> String {
    let gwei = ethers::utils::format_units(wei, "gwei").unwrap_or_else(|_| "?".to_string());
    match gwei.split_once('.') {
        Some((int, frac)) if frac.len() > 2 => {
            let frac = frac[..2].trim_end_matches('0');
            if frac.is_empty() {
                int.to_string()
            } else {
                format!("{}.{}", int, frac)
            }
        }
        _ => gwei,
    }
}

fn trim_fraction(value: &str) -> String {
    if value.contains('.') {
        value.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        value.to_string()
    }
}

/// Parse an integer amount as it appears in deep links.
///
/// Accepts plain decimal digits, `0x` hex, and scientific notation whose
/// result is integral (`2.014e18`). Returns `None` for anything else,
/// including negative numbers and values that overflow 256 bits.
pub fn parse_integer_amount(input: &str) -> Option<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        if hex.is_empty() {
            return None;
        }
        return U256::from_str_radix(hex, 16).ok();
    }

    if let Some((mantissa, exponent)) = trimmed.split_once(['e', 'E']) {
        return parse_scientific(mantissa, exponent);
    }

    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    U256::from_dec_str(trimmed).ok()
}

fn parse_scientific(mantissa: &str, exponent: &str) -> Option<U256> {
    let exponent: u32 = exponent.strip_prefix('+').unwrap_or(exponent).parse().ok()?;
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }

    let frac_len = frac_part.len() as u32;
    let mut digits = format!("{}{}", int_part, frac_part);
    if exponent < frac_len {
        // Only integral results are accepted: the dropped digits must be zeros
        let keep = digits.len() - (frac_len - exponent) as usize;
        if !digits[keep..].bytes().all(|b| b == b'0') {
            return None;
        }
        digits.truncate(keep);
        if digits.is_empty() {
            return Some(U256::zero());
        }
        return U256::from_dec_str(&digits).ok();
    }

    let base = U256::from_dec_str(&digits).ok()?;
    let scale = U256::from(10u64).checked_pow(U256::from(exponent - frac_len))?;
    base.checked_mul(scale)
}

/// Parse a hex address, with or without the `0x` prefix.
pub fn parse_address(input: &str) -> Option<Address> {
    let trimmed = input.trim();
    let hex = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")).unwrap_or(trimmed);
    if hex.len() != 40 {
        return None;
    }
    hex.parse().ok()
}

/// EIP-55 mixed-case encoding of an address.
pub fn checksum(address: &Address) -> String {
    ethers::utils::to_checksum(address, None)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== format tests ====================

    #[test]
    fn test_format_native_one_eth() {
        assert_eq!(format_native(U256::exp10(18)), "1");
    }

    #[test]
    fn test_format_native_zero() {
        assert_eq!(format_native(U256::zero()), "0");
    }

    #[test]
    fn test_format_native_fractional() {
        let wei = U256::from(5u64) * U256::exp10(17);
        assert_eq!(format_native(wei), "0.5");
    }

    #[test]
    fn test_format_token_amount_keeps_decimals() {
        assert_eq!(format_token_amount(U256::from(500u64), 2), "5.00");
        assert_eq!(format_token_amount(U256::from(1_234_567u64), 6), "1.234567");
    }

    #[test]
    fn test_format_token_amount_zero_decimals() {
        assert_eq!(format_token_amount(U256::from(500u64), 0), "500");
    }

    #[test]
    fn test_format_gwei_trims() {
        assert_eq!(format_gwei(U256::from(1_500_000_000u64)), "1.5");
        assert_eq!(format_gwei(U256::from(2_000_000_000u64)), "2");
        assert_eq!(format_gwei(U256::from(1_123_456_789u64)), "1.12");
    }

    // ==================== parse_integer_amount tests ====================

    #[test]
    fn test_parse_integer_amount_decimal() {
        assert_eq!(parse_integer_amount("1000000000000000000"), Some(U256::exp10(18)));
        assert_eq!(parse_integer_amount(" 42 "), Some(U256::from(42u64)));
    }

    #[test]
    fn test_parse_integer_amount_hex() {
        assert_eq!(parse_integer_amount("0x10"), Some(U256::from(16u64)));
        assert_eq!(parse_integer_amount("0x"), None);
    }

    #[test]
    fn test_parse_integer_amount_scientific() {
        let expected = U256::from(2014u64) * U256::exp10(15);
        assert_eq!(parse_integer_amount("2.014e18"), Some(expected));
        assert_eq!(parse_integer_amount("1e3"), Some(U256::from(1000u64)));
        assert_eq!(parse_integer_amount("1.50e1"), Some(U256::from(15u64)));
    }

    #[test]
    fn test_parse_integer_amount_rejects_fractional_result() {
        assert_eq!(parse_integer_amount("1.5e0"), None);
        assert_eq!(parse_integer_amount("1.5"), None);
    }

    #[test]
    fn test_parse_integer_amount_rejects_garbage() {
        assert_eq!(parse_integer_amount(""), None);
        assert_eq!(parse_integer_amount("-1"), None);
        assert_eq!(parse_integer_amount("abc"), None);
        assert_eq!(parse_integer_amount("1e999"), None);
    }

    // ==================== address tests ====================

    #[test]
    fn test_parse_address_with_and_without_prefix() {
        let with = parse_address("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        let without = parse_address("5aaeb6053f3e94c9b9a09f33669435e7ef1beaed");
        assert!(with.is_some());
        assert_eq!(with, without);
    }

    #[test]
    fn test_parse_address_rejects_bad_length() {
        assert!(parse_address("0x1234").is_none());
        assert!(parse_address("0xTOKEN").is_none());
    }

    #[test]
    fn test_checksum_matches_eip55_vector() {
        let address = parse_address("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed").unwrap();
        assert_eq!(checksum(&address), "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
    }
}
