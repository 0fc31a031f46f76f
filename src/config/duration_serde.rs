//! Common serde utilities for human-readable durations and byte sizes across configuration.

use serde::de::{self, Visitor};
use serde::{Deserializer, Serializer};
use std::{fmt, time::Duration};

/// Custom serde functions for Duration that support human-readable strings
pub mod duration {
    use super::*;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let duration_str = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&duration_str)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a duration as seconds (number) or human-readable string (e.g., '60s', '5m', '24h')",
                )
            }

            fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_secs(seconds))
            }

            fn visit_i64<E>(self, seconds: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(seconds)
                    .map(Duration::from_secs)
                    .map_err(|_| de::Error::custom(format!("Negative duration: {seconds}")))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value)
                    .map_err(|e| de::Error::custom(format!("Invalid duration '{value}': {e}")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Custom serde functions for byte sizes written as "30MB", "512KB" or plain numbers
pub mod byte_size {
    use super::*;

    const UNITS: &[(&str, usize)] = &[
        ("GB", 1024 * 1024 * 1024),
        ("MB", 1024 * 1024),
        ("KB", 1024),
        ("B", 1),
    ];

    /// Parse a human-readable size into bytes
    pub fn parse(value: &str) -> Result<usize, String> {
        let trimmed = value.trim();
        let upper = trimmed.to_ascii_uppercase();
        for (suffix, multiplier) in UNITS {
            if let Some(number) = upper.strip_suffix(suffix) {
                let number: usize = number
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid size '{value}'"))?;
                return Ok(number * multiplier);
            }
        }
        trimmed
            .parse()
            .map_err(|_| format!("Invalid size '{value}'"))
    }

    /// Format bytes using the largest unit that divides them exactly
    pub fn format(bytes: usize) -> String {
        for (suffix, multiplier) in UNITS {
            if bytes >= *multiplier && bytes % multiplier == 0 {
                return format!("{}{}", bytes / multiplier, suffix);
            }
        }
        format!("{bytes}B")
    }

    pub fn serialize<S>(bytes: &usize, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(*bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<usize, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct SizeVisitor;

        impl<'de> Visitor<'de> for SizeVisitor {
            type Value = usize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a size in bytes (number) or human-readable string (e.g., '30MB')")
            }

            fn visit_u64<E>(self, bytes: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                usize::try_from(bytes).map_err(|_| de::Error::custom("size out of range"))
            }

            fn visit_i64<E>(self, bytes: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                usize::try_from(bytes).map_err(|_| de::Error::custom("size out of range"))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                parse(value).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_any(SizeVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Sample {
        #[serde(with = "duration")]
        ttl: Duration,
        #[serde(with = "byte_size")]
        limit: usize,
    }

    #[test]
    fn test_human_readable_values() {
        let sample: Sample = toml::from_str("ttl = \"24h\"\nlimit = \"30MB\"").unwrap();
        assert_eq!(sample.ttl, Duration::from_secs(86_400));
        assert_eq!(sample.limit, 30 * 1024 * 1024);
    }

    #[test]
    fn test_numeric_values() {
        let sample: Sample = toml::from_str("ttl = 60\nlimit = 2048").unwrap();
        assert_eq!(sample.ttl, Duration::from_secs(60));
        assert_eq!(sample.limit, 2048);
    }

    #[test]
    fn test_byte_size_format() {
        assert_eq!(byte_size::format(10 * 1024 * 1024), "10MB");
        assert_eq!(byte_size::format(1536), "1536B");
        assert_eq!(byte_size::parse(" 512kb ").unwrap(), 512 * 1024);
        assert!(byte_size::parse("lots").is_err());
    }
}
