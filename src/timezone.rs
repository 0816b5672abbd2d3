//! Resolves the server's configured timezone name to a concrete UTC offset.

use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, timezones};

/// Look up the current UTC offset for a canonical timezone name such as
/// "Pacific/Auckland".
///
/// Returns `None` when the name is not in the tz database.
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    let timezone = timezones::get_by_name(canonical_timezone)?;

    Some(timezone.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

#[cfg(test)]
mod timezone_tests {
    use time::UtcOffset;

    use super::get_local_offset;

    #[test]
    fn resolves_utc_to_zero_offset() {
        assert_eq!(get_local_offset("Etc/UTC"), Some(UtcOffset::UTC));
    }

    #[test]
    fn rejects_unknown_timezone_name() {
        assert_eq!(get_local_offset("Atlantis/Central"), None);
    }
}
