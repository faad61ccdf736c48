// src/types.rs

//! Small value helpers shared by the config layer and the build loop.

use std::time::Duration;

/// Parse a duration string like `"1s"`, `"250ms"`, `"1.5s"` or `"1m30s"`.
///
/// Accepted units: `ns`, `us`/`µs`, `ms`, `s`, `m`, `h`. A bare `"0"` is
/// accepted as zero; any other number needs a unit.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = s;
    let mut total = Duration::ZERO;

    while !rest.is_empty() {
        let num_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("duration '{s}' is missing a unit suffix"))?;
        if num_len == 0 {
            return Err(format!("expected a number in duration '{s}'"));
        }

        let (num_part, tail) = rest.split_at(num_len);
        let value: f64 = num_part
            .parse()
            .map_err(|e| format!("invalid duration number '{num_part}': {e}"))?;

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, next) = tail.split_at(unit_len);

        let nanos_per_unit = match unit {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            other => {
                return Err(format!(
                    "unsupported duration unit '{other}'; expected ns, us, ms, s, m, or h"
                ));
            }
        };

        total += Duration::from_nanos((value * nanos_per_unit).round() as u64);
        rest = next;
    }

    Ok(total)
}

/// Trim a measured latency for display.
///
/// Second-scale values keep 1/100s, millisecond-scale 1/100ms and
/// microsecond-scale 1/100µs. Anything shorter is returned as-is.
pub fn format_latency(d: Duration) -> Duration {
    let granularity = if d > Duration::from_secs(1) {
        Duration::from_millis(10)
    } else if d > Duration::from_millis(1) {
        Duration::from_micros(10)
    } else if d > Duration::from_micros(1) {
        Duration::from_nanos(10)
    } else {
        return d;
    };

    truncate(d, granularity)
}

fn truncate(d: Duration, unit: Duration) -> Duration {
    let unit = unit.as_nanos();
    let nanos = d.as_nanos() / unit * unit;
    Duration::from_nanos(nanos as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_units() {
        assert_eq!(parse_duration("1s").unwrap(), Duration::from_secs(1));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_duration("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(parse_duration("15us").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("15µs").unwrap(), Duration::from_micros(15));
        assert_eq!(parse_duration("0").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parses_fractional_and_compound_values() {
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_duration("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(
            parse_duration("1s500ms").unwrap(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn rejects_malformed_durations() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("3 days").is_err());
        assert!(parse_duration("1..2s").is_err());
    }

    #[test]
    fn latency_is_truncated_relative_to_magnitude() {
        assert_eq!(
            format_latency(Duration::from_nanos(1_234_567_891)),
            Duration::from_millis(1230)
        );
        assert_eq!(
            format_latency(Duration::from_nanos(12_345_678)),
            Duration::from_micros(12_340)
        );
        assert_eq!(
            format_latency(Duration::from_nanos(5_678)),
            Duration::from_nanos(5_670)
        );
        assert_eq!(
            format_latency(Duration::from_nanos(999)),
            Duration::from_nanos(999)
        );
    }

    #[test]
    fn latency_renders_with_two_decimals() {
        let shown = format_latency(Duration::from_nanos(1_234_567_891));
        assert_eq!(format!("{shown:?}"), "1.23s");
    }
}
