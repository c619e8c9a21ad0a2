//! Human-friendly duration arguments.
//!
//! The command surface accepts values like `30s`, `5m`, `1h` or a bare
//! number of minutes. Malformed input is rejected with no state change
//! rather than mapped to a sentinel value.

use crate::error::PlannerError;

/// Parse a wait/delay argument into milliseconds.
///
/// A bare number means minutes; `s`, `m`, `h` and `d` suffixes select
/// the unit (longer spellings like `sec`, `min`, `hours` work too).
pub fn parse_duration_ms(input: &str) -> Result<u64, PlannerError> {
    let trimmed = input.trim().to_lowercase();
    let invalid = || PlannerError::InvalidDuration {
        input: input.to_string(),
    };

    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);
    let value: u64 = digits.parse().map_err(|_| invalid())?;

    let factor = match unit.trim() {
        "" | "m" | "min" | "mins" | "minute" | "minutes" => 60_000,
        "s" | "sec" | "secs" | "second" | "seconds" => 1_000,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000,
        "d" | "day" | "days" => 86_400_000,
        _ => return Err(invalid()),
    };
    value.checked_mul(factor).ok_or_else(invalid)
}

/// Parse a pause duration. `indefinitely` (or `forever`) maps to the
/// indefinite-pause marker the planner understands.
pub fn parse_pause_ms(input: &str) -> Result<u64, PlannerError> {
    match input.trim().to_lowercase().as_str() {
        "indefinitely" | "forever" => Ok(1),
        _ => parse_duration_ms(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_number_is_minutes() {
        assert_eq!(parse_duration_ms("5").unwrap(), 300_000);
    }

    #[test]
    fn suffixes_select_units() {
        assert_eq!(parse_duration_ms("30s").unwrap(), 30_000);
        assert_eq!(parse_duration_ms("5m").unwrap(), 300_000);
        assert_eq!(parse_duration_ms("2h").unwrap(), 7_200_000);
        assert_eq!(parse_duration_ms("1d").unwrap(), 86_400_000);
        assert_eq!(parse_duration_ms("10 min").unwrap(), 600_000);
    }

    #[test]
    fn malformed_input_is_rejected() {
        assert!(parse_duration_ms("").is_err());
        assert!(parse_duration_ms("abc").is_err());
        assert!(parse_duration_ms("5x").is_err());
        assert!(parse_duration_ms("-3m").is_err());
    }

    #[test]
    fn pause_accepts_indefinitely() {
        assert_eq!(parse_pause_ms("indefinitely").unwrap(), 1);
        assert_eq!(parse_pause_ms("forever").unwrap(), 1);
        assert_eq!(parse_pause_ms("10m").unwrap(), 600_000);
        assert!(parse_pause_ms("whenever").is_err());
    }
}
