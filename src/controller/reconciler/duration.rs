//! # Duration Parsing
//!
//! Parses `syncPeriod` values written as Go duration strings: an optional
//! `+`, then one or more decimal numbers (fractions allowed) each followed by
//! a unit among `ns`, `us`, `µs`, `ms`, `s`, `m` and `h`. A bare `0` is valid.
//!
//! Zero is a valid duration and means "no periodic resync".

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

static DURATION_FORMAT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:ns|us|µs|μs|ms|s|m|h))+$").ok()
});

static DURATION_COMPONENT: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?P<whole>[0-9]*)(?:\.(?P<fraction>[0-9]*))?(?P<unit>ns|us|µs|μs|ms|s|m|h)").ok()
});

const NANOS_PER_MICRO: u128 = 1_000;
const NANOS_PER_MILLI: u128 = 1_000_000;
const NANOS_PER_SECOND: u128 = 1_000_000_000;

/// Parse a duration such as "30s", "1.5h", "1h30m" or "300us"
/// Returns an error for empty, malformed, negative or overflowing durations
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_trimmed = duration_str.trim();

    if duration_trimmed.is_empty() {
        return Err(anyhow::anyhow!("Duration string cannot be empty"));
    }
    if duration_trimmed.starts_with('-') {
        return Err(anyhow::anyhow!(
            "Duration must not be negative, got '{}'",
            duration_trimmed
        ));
    }

    let unsigned = duration_trimmed
        .strip_prefix('+')
        .unwrap_or(duration_trimmed);
    if unsigned == "0" {
        return Ok(Duration::ZERO);
    }

    let (Some(format), Some(component)) = (DURATION_FORMAT.as_ref(), DURATION_COMPONENT.as_ref())
    else {
        return Err(anyhow::anyhow!("Failed to compile duration regex"));
    };

    if !format.is_match(unsigned) {
        return Err(anyhow::anyhow!(
            "Invalid duration format '{}'. Expected one or more <number><unit> with unit ns, us, ms, s, m or h (e.g., '30s', '1.5h', '1h30m')",
            duration_trimmed
        ));
    }

    let mut total_nanos: u128 = 0;
    for captures in component.captures_iter(unsigned) {
        let unit_nanos = unit_nanos(&captures["unit"]);
        let whole = digits_value(captures.name("whole").map_or("", |m| m.as_str()));
        let fraction = captures.name("fraction").map_or("", |m| m.as_str());

        let part = whole
            .and_then(|whole| whole.checked_mul(unit_nanos))
            .and_then(|nanos| nanos.checked_add(fraction_nanos(fraction, unit_nanos)))
            .ok_or_else(|| anyhow::anyhow!("Duration '{}' is too large", duration_trimmed))?;
        total_nanos = total_nanos.saturating_add(part);
    }

    let nanos = u64::try_from(total_nanos)
        .map_err(|_overflow| anyhow::anyhow!("Duration '{}' is too large", duration_trimmed))?;
    Ok(Duration::from_nanos(nanos))
}

fn unit_nanos(unit: &str) -> u128 {
    match unit {
        "ns" => 1,
        "us" | "µs" | "μs" => NANOS_PER_MICRO,
        "ms" => NANOS_PER_MILLI,
        "s" => NANOS_PER_SECOND,
        "m" => 60 * NANOS_PER_SECOND,
        // The format only admits the units above
        _ => 3_600 * NANOS_PER_SECOND,
    }
}

/// Integer value of a run of ASCII digits, `Some(0)` when empty
fn digits_value(digits: &str) -> Option<u128> {
    if digits.is_empty() {
        return Some(0);
    }
    digits.parse().ok()
}

/// Nanoseconds contributed by the fractional digits of one component
///
/// Digits beyond nanosecond precision are truncated.
fn fraction_nanos(fraction: &str, unit_nanos: u128) -> u128 {
    let mut scale = unit_nanos;
    let mut nanos = 0;
    for digit in fraction.bytes().map(|b| u128::from(b - b'0')) {
        scale /= 10;
        if scale == 0 {
            break;
        }
        nanos += digit * scale;
    }
    nanos
}
