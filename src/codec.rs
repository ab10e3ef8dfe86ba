//! Decoders for the non-standard encodings the Fleet API uses in a few fields.
//!
//! Most timestamps arrive as RFC 3339 and go straight through chrono's serde
//! support. Two don't: a space-delimited date-time with numeric offset
//! (`2024-01-02 15:04:05 -0700`), and durations written as compact unit strings
//! (`1h23m45.5s`). Each gets its own module usable with `#[serde(with = ...)]`.

/// `YYYY-MM-DD HH:MM:SS +HHMM` timestamps.
pub mod non_iso_time {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

    pub fn parse(value: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(value.trim_matches('"'), FORMAT)
    }

    pub fn format(value: &DateTime<FixedOffset>) -> String {
        value.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(value: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<FixedOffset>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }

    /// Same encoding for optional fields; `null` stays `None`.
    pub mod option {
        use chrono::{DateTime, FixedOffset};
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<FixedOffset>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(v) => super::serialize(v, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| super::parse(&raw).map_err(serde::de::Error::custom))
                .transpose()
        }
    }
}

/// Duration strings such as `"1h23m45s"`, `"1.5s"`, `"250ms"` or `"0s"`.
pub mod duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    const NANOS_PER_MICRO: u128 = 1_000;
    const NANOS_PER_MILLI: u128 = 1_000_000;
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    const NANOS_PER_MIN: u128 = 60 * NANOS_PER_SEC;
    const NANOS_PER_HOUR: u128 = 60 * NANOS_PER_MIN;

    #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
    pub enum ParseError {
        #[error("invalid duration {0:?}")]
        Invalid(String),
        #[error("missing unit in duration {0:?}")]
        MissingUnit(String),
        #[error("unknown unit {unit:?} in duration {input:?}")]
        UnknownUnit { unit: String, input: String },
        #[error("negative duration {0:?} is not representable")]
        Negative(String),
        #[error("duration {0:?} out of range")]
        Overflow(String),
    }

    fn unit_nanos(unit: &str) -> Option<u128> {
        match unit {
            "ns" => Some(1),
            "us" | "µs" | "μs" => Some(NANOS_PER_MICRO),
            "ms" => Some(NANOS_PER_MILLI),
            "s" => Some(NANOS_PER_SEC),
            "m" => Some(NANOS_PER_MIN),
            "h" => Some(NANOS_PER_HOUR),
            _ => None,
        }
    }

    pub fn parse(input: &str) -> Result<Duration, ParseError> {
        let raw = input.trim_matches('"');
        let mut rest = raw;
        let mut negative = false;

        if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('-') {
            rest = stripped;
            negative = true;
        }

        if rest == "0" {
            return Ok(Duration::ZERO);
        }
        if rest.is_empty() {
            return Err(ParseError::Invalid(raw.to_owned()));
        }

        let overflow = || ParseError::Overflow(raw.to_owned());
        let mut total: u128 = 0;

        while !rest.is_empty() {
            let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            let (int_part, tail) = rest.split_at(int_len);
            rest = tail;

            let mut frac_part = "";
            if let Some(tail) = rest.strip_prefix('.') {
                let frac_len = tail.find(|c: char| !c.is_ascii_digit()).unwrap_or(tail.len());
                frac_part = &tail[..frac_len];
                rest = &tail[frac_len..];
            }
            if int_part.is_empty() && frac_part.is_empty() {
                return Err(ParseError::Invalid(raw.to_owned()));
            }

            let unit_len = rest
                .find(|c: char| c == '.' || c.is_ascii_digit())
                .unwrap_or(rest.len());
            let (unit, tail) = rest.split_at(unit_len);
            rest = tail;
            if unit.is_empty() {
                return Err(ParseError::MissingUnit(raw.to_owned()));
            }
            let scale = unit_nanos(unit).ok_or_else(|| ParseError::UnknownUnit {
                unit: unit.to_owned(),
                input: raw.to_owned(),
            })?;

            let whole: u128 = if int_part.is_empty() {
                0
            } else {
                int_part.parse().map_err(|_| overflow())?
            };
            let mut nanos = whole.checked_mul(scale).ok_or_else(overflow)?;

            // Fractions beyond nanosecond resolution are truncated.
            let mut divisor: u128 = 1;
            let mut fraction: u128 = 0;
            for digit in frac_part.bytes().take(20) {
                fraction = fraction * 10 + u128::from(digit - b'0');
                divisor *= 10;
            }
            nanos = nanos
                .checked_add(fraction * scale / divisor)
                .ok_or_else(overflow)?;

            total = total.checked_add(nanos).ok_or_else(overflow)?;
        }

        // Negative zero is still zero.
        if negative && total != 0 {
            return Err(ParseError::Negative(raw.to_owned()));
        }

        let secs = u64::try_from(total / NANOS_PER_SEC).map_err(|_| overflow())?;
        // Remainder is always below one second.
        let subsec = (total % NANOS_PER_SEC) as u32;
        Ok(Duration::new(secs, subsec))
    }

    /// Renders `value` so that [`parse`] yields it back unchanged.
    pub fn format(value: &Duration) -> String {
        let total = value.as_nanos();
        if total == 0 {
            return "0s".to_owned();
        }

        if total < NANOS_PER_SEC {
            return if total < NANOS_PER_MICRO {
                format!("{}ns", total)
            } else if total < NANOS_PER_MILLI {
                format!("{}µs", decimal(total, NANOS_PER_MICRO))
            } else {
                format!("{}ms", decimal(total, NANOS_PER_MILLI))
            };
        }

        let hours = total / NANOS_PER_HOUR;
        let minutes = (total % NANOS_PER_HOUR) / NANOS_PER_MIN;
        let seconds = decimal(total % NANOS_PER_MIN, NANOS_PER_SEC);

        if hours > 0 {
            format!("{}h{}m{}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m{}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// `value / unit` as a decimal string without trailing zeros.
    fn decimal(value: u128, unit: u128) -> String {
        let whole = value / unit;
        let rem = value % unit;
        if rem == 0 {
            return whole.to_string();
        }
        let width = (unit as f64).log10().round() as usize;
        let frac = format!("{:0width$}", rem, width = width);
        format!("{}.{}", whole, frac.trim_end_matches('0'))
    }

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Product ids are strings for energy sites but numbers for vehicles.
pub mod string_or_number {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        match Value::deserialize(d)? {
            Value::String(s) => Ok(s),
            Value::Number(n) => Ok(n.to_string()),
            Value::Null => Ok(String::new()),
            other => Err(serde::de::Error::custom(format!(
                "expected string or number, got {}",
                other
            ))),
        }
    }
}
