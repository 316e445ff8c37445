// Copyright (c) The proctest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::errors::ParallelismParseError;
use serde::Deserialize;
use std::{cmp::Ordering, fmt, str::FromStr, sync::LazyLock};
use tracing::warn;

/// Gets the number of available CPUs and caches the value.
#[inline]
pub fn get_num_cpus() -> usize {
    static NUM_CPUS: LazyLock<usize> =
        LazyLock::new(|| match std::thread::available_parallelism() {
            Ok(count) => count.into(),
            Err(err) => {
                warn!("unable to determine num-cpus ({err}), assuming 1 logical CPU");
                1
            }
        });

    *NUM_CPUS
}

/// Type for the `processes` config key: how many test files run at the same time.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Parallelism {
    /// Run this many test files at once.
    Count(usize),

    /// Run as many test files at once as there are logical CPUs.
    NumCpus,
}

impl Parallelism {
    /// Gets the actual number of processes computed at runtime. This is always at least 1.
    pub fn compute(self) -> usize {
        match self {
            Self::Count(processes) => processes.max(1),
            Self::NumCpus => get_num_cpus(),
        }
    }

    fn from_signed(value: i64) -> Option<Self> {
        match value.cmp(&0) {
            Ordering::Greater => Some(Self::Count(value as usize)),
            Ordering::Less => Some(Self::Count((get_num_cpus() as i64 + value).max(1) as usize)),
            Ordering::Equal => None,
        }
    }
}

impl Default for Parallelism {
    fn default() -> Self {
        Self::Count(1)
    }
}

impl FromStr for Parallelism {
    type Err = ParallelismParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "num-cpus" {
            return Ok(Self::NumCpus);
        }

        s.parse::<i64>()
            .ok()
            .and_then(Self::from_signed)
            .ok_or_else(|| ParallelismParseError::new(s))
    }
}

impl fmt::Display for Parallelism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Count(processes) => write!(f, "{processes}"),
            Self::NumCpus => write!(f, "num-cpus"),
        }
    }
}

impl<'de> Deserialize<'de> for Parallelism {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = Parallelism;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                write!(formatter, "a non-zero integer or the string \"num-cpus\"")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v == "num-cpus" {
                    Ok(Parallelism::NumCpus)
                } else {
                    Err(serde::de::Error::invalid_value(
                        serde::de::Unexpected::Str(v),
                        &self,
                    ))
                }
            }

            // Note that TOML uses i64, not u64.
            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Parallelism::from_signed(v).ok_or_else(|| {
                    serde::de::Error::invalid_value(serde::de::Unexpected::Signed(v), &self)
                })
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                match i64::try_from(v) {
                    Ok(v) => self.visit_i64(v),
                    Err(_) => Err(serde::de::Error::invalid_value(
                        serde::de::Unexpected::Unsigned(v),
                        &self,
                    )),
                }
            }
        }

        deserializer.deserialize_any(V)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("3", Some(Parallelism::Count(3)) ; "positive")]
    #[test_case("num-cpus", Some(Parallelism::NumCpus) ; "num cpus")]
    #[test_case("-1", Some(Parallelism::Count(get_num_cpus().saturating_sub(1).max(1))) ; "negative")]
    #[test_case("-100000", Some(Parallelism::Count(1)) ; "very negative")]
    #[test_case("0", None ; "zero")]
    #[test_case("many", None ; "garbage")]
    fn parse_parallelism(input: &str, expected: Option<Parallelism>) {
        assert_eq!(input.parse::<Parallelism>().ok(), expected);
    }

    #[test_case(Parallelism::Count(0), 1 ; "zero runs one")]
    #[test_case(Parallelism::Count(1), 1 ; "one")]
    #[test_case(Parallelism::Count(7), 7 ; "seven")]
    fn compute_is_at_least_one(parallelism: Parallelism, expected: usize) {
        assert_eq!(parallelism.compute(), expected);
    }

    #[test]
    fn display_roundtrips() {
        for value in [Parallelism::Count(4), Parallelism::NumCpus] {
            assert_eq!(value.to_string().parse::<Parallelism>(), Ok(value));
        }
    }
}
