//! Today's date in a configured timezone.
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Look up an IANA timezone such as `Europe/Berlin`.
///
/// Unknown names fall back to [`DEFAULT_TIMEZONE`] with a warning.
#[must_use]
pub fn resolve_timezone(name: &str) -> Tz {
    match name.trim().parse::<Tz>() {
        Ok(tz) => tz,
        Err(err) => {
            tracing::warn!(
                timezone = name,
                "unknown timezone ({err}), using {DEFAULT_TIMEZONE}"
            );
            DEFAULT_TIMEZONE
        }
    }
}

/// The date of `now` in `tz`, formatted as `YYYY-MM-DD`.
#[must_use]
pub fn format_date<T: TimeZone>(now: DateTime<Utc>, tz: &T) -> String
where
    T::Offset: std::fmt::Display,
{
    now.with_timezone(tz).format("%Y-%m-%d").to_string()
}

/// The date and time of `now` in `tz`, formatted as `YYYY-MM-DD-HHMM`.
#[must_use]
pub fn format_datetime_version<T: TimeZone>(now: DateTime<Utc>, tz: &T) -> String
where
    T::Offset: std::fmt::Display,
{
    now.with_timezone(tz).format("%Y-%m-%d-%H%M").to_string()
}

#[must_use]
pub fn current_date(tz: Tz) -> String {
    format_date(Utc::now(), &tz)
}

/// Version used when no build count is requested.
#[must_use]
pub fn current_datetime_version(tz: Tz) -> String {
    format_datetime_version(Utc::now(), &tz)
}
