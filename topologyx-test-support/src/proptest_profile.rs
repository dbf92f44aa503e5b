//! Environment-driven sizing for property-test suites.
//!
//! Suites pass their default case count; `TOPOLOGYX_PROPTEST_CASES` overrides
//! it so CI can run deeper sweeps without code changes.

use std::env;

/// Environment variable overriding the number of proptest cases.
pub const CASES_ENV_KEY: &str = "TOPOLOGYX_PROPTEST_CASES";

/// Resolved case budget for one property suite.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProptestProfile {
    cases: u32,
}

impl ProptestProfile {
    /// Loads the profile, falling back to `default_cases` when the override is
    /// absent or invalid.
    ///
    /// # Examples
    ///
    /// ```
    /// use topologyx_test_support::proptest_profile::ProptestProfile;
    ///
    /// let profile = ProptestProfile::load(32);
    /// assert!(profile.cases() > 0);
    /// ```
    #[must_use]
    pub fn load(default_cases: u32) -> Self {
        let cases = match env::var(CASES_ENV_KEY) {
            Ok(raw) => parse_cases(&raw).unwrap_or_else(|reason| {
                tracing::warn!(
                    env = CASES_ENV_KEY,
                    raw = %raw,
                    reason,
                    "ignoring invalid proptest case override",
                );
                default_cases
            }),
            Err(_) => default_cases,
        };
        Self { cases }
    }

    /// Number of cases each property should run.
    #[must_use]
    pub const fn cases(self) -> u32 {
        self.cases
    }
}

fn parse_cases(raw: &str) -> Result<u32, &'static str> {
    match raw.trim().parse::<u32>() {
        Ok(0) => Err("case count must be positive"),
        Ok(cases) => Ok(cases),
        Err(_) => Err("case count must be an unsigned integer"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("64", Ok(64))]
    #[case(" 8 ", Ok(8))]
    #[case("0", Err("case count must be positive"))]
    #[case("many", Err("case count must be an unsigned integer"))]
    fn parses_case_overrides(#[case] raw: &str, #[case] expected: Result<u32, &'static str>) {
        assert_eq!(parse_cases(raw), expected);
    }
}
