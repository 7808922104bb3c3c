//! String formatting utilities for log output.

use rust_decimal::Decimal;

/// Truncates an identifier for display purposes.
///
/// Shows only the first 8 characters followed by ".." for longer strings.
pub fn truncate_id(id: &str) -> String {
	match id.char_indices().nth(8) {
		Some((idx, _)) => format!("{}..", &id[..idx]),
		None => id.to_string(),
	}
}

/// Formats a monetary amount with two decimal places.
pub fn format_money(amount: Decimal) -> String {
	format!("{:.2}", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn test_truncate_id() {
		assert_eq!(truncate_id("short"), "short");
		assert_eq!(truncate_id("12345678"), "12345678");
		assert_eq!(
			truncate_id("9f1c2d3e-aaaa-bbbb-cccc-000000000000"),
			"9f1c2d3e.."
		);
	}

	#[test]
	fn test_format_money() {
		assert_eq!(format_money(Decimal::from(55)), "55.00");
		assert_eq!(format_money(Decimal::from_str("5.5").unwrap()), "5.50");
	}
}
