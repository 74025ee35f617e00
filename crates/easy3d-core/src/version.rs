//! Library version information.

use chrono::NaiveDate;

/// Release date in the format YYYYMMDD.
pub const RELEASE_DATE: usize = 20_250_611;

fn component(text: &str) -> usize {
    text.parse().unwrap_or(0)
}

/// Major version number.
pub fn version_major() -> usize {
    component(env!("CARGO_PKG_VERSION_MAJOR"))
}

/// Minor version number.
pub fn version_minor() -> usize {
    component(env!("CARGO_PKG_VERSION_MINOR"))
}

/// Patch version number.
pub fn version_patch() -> usize {
    component(env!("CARGO_PKG_VERSION_PATCH"))
}

/// Version string in the format `[MAJOR].[MINOR].[PATCH]`, e.g. "2.6.1".
pub fn version_string() -> String {
    format!("{}.{}.{}", version_major(), version_minor(), version_patch())
}

/// Version number in the format `10[MAJOR]0[MINOR]0[PATCH]`, e.g. 1020601.
pub fn version_number() -> usize {
    1_000_000 + version_major() * 10_000 + version_minor() * 100 + version_patch()
}

/// Release date in the format YYYYMMDD.
pub fn release_date() -> usize {
    RELEASE_DATE
}

/// Release date as a calendar date.
pub fn release_day() -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&RELEASE_DATE.to_string(), "%Y%m%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_string_matches_components() {
        let expected = format!("{}.{}.{}", version_major(), version_minor(), version_patch());
        assert_eq!(version_string(), expected);
        assert_eq!(version_string(), env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_version_number_layout() {
        let n = version_number();
        assert_eq!(n / 10_000 % 100, version_major());
        assert_eq!(n / 100 % 100, version_minor());
        assert_eq!(n % 100, version_patch());
        assert_eq!(n / 1_000_000, 1);
    }

    #[test]
    fn test_release_day() {
        let day = release_day().unwrap();
        assert_eq!(day.format("%Y%m%d").to_string(), release_date().to_string());
    }
}
