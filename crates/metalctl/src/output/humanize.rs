// Human-readable durations, ages and byte sizes.

use chrono::{DateTime, TimeDelta, Utc};

const UNITS: [(&str, i64); 4] = [("d", 86_400), ("h", 3_600), ("m", 60), ("s", 1)];

/// The two largest non-zero units, e.g. `3d 2h`, `1m`, `0s`.
pub fn duration(delta: TimeDelta) -> String {
    let mut remaining = delta.num_seconds().max(0);
    let mut parts = Vec::new();
    for (unit, secs) in UNITS {
        let n = remaining / secs;
        remaining %= secs;
        if n > 0 {
            parts.push(format!("{n}{unit}"));
        }
    }
    parts.truncate(2);
    if parts.is_empty() {
        "0s".to_owned()
    } else {
        parts.join(" ")
    }
}

/// Time since `since`, empty when unknown.
pub fn age(since: Option<&DateTime<Utc>>, now: DateTime<Utc>) -> String {
    since.map(|t| duration(now - *t)).unwrap_or_default()
}

/// Decimal byte size: `32 GB`, `1.5 kB`, `9 B`.
#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
pub fn bytes(size: u64) -> String {
    const SUFFIXES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
    if size < 10 {
        return format!("{size} B");
    }
    let mut value = size as f64;
    let mut exp = 0;
    while value >= 1000.0 && exp < SUFFIXES.len() - 1 {
        value /= 1000.0;
        exp += 1;
    }
    let rounded = (value * 10.0 + 0.5).floor() / 10.0;
    let suffix = SUFFIXES.get(exp).copied().unwrap_or("EB");
    if rounded < 10.0 {
        format!("{rounded:.1} {suffix}").replace(".0 ", " ")
    } else {
        format!("{rounded:.0} {suffix}")
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn durations_keep_two_units() {
        assert_eq!(duration(TimeDelta::seconds(3 * 86_400 + 2 * 3_600 + 59)), "3d 2h");
        assert_eq!(duration(TimeDelta::seconds(60)), "1m");
        assert_eq!(duration(TimeDelta::seconds(3_601)), "1h 1s");
        assert_eq!(duration(TimeDelta::zero()), "0s");
        assert_eq!(duration(TimeDelta::seconds(-5)), "0s");
    }

    #[test]
    fn ages_are_relative_to_now() {
        let now = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).single().unwrap_or_default();
        let then = now - TimeDelta::hours(5);
        assert_eq!(age(Some(&then), now), "5h");
        assert_eq!(age(None, now), "");
    }

    #[test]
    fn bytes_are_decimal() {
        assert_eq!(bytes(32_000_000_000), "32 GB");
        assert_eq!(bytes(1_500), "1.5 kB");
        assert_eq!(bytes(9), "9 B");
        assert_eq!(bytes(1_000_000), "1 MB");
    }
}
