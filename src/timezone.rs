use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The current calendar year in `local_timezone`.
pub fn current_local_year(local_timezone: &str) -> Result<i32, Error> {
    let Some(local_offset) = get_local_offset(local_timezone) else {
        tracing::error!("Invalid timezone {}", local_timezone);
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };

    Ok(OffsetDateTime::now_utc().to_offset(local_offset).year())
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use crate::Error;

    use super::{current_local_year, get_local_offset};

    #[test]
    fn jakarta_is_seven_hours_ahead() {
        let offset = get_local_offset("Asia/Jakarta").unwrap();

        assert_eq!(offset.whole_hours(), 7);
    }

    #[test]
    fn current_year_in_utc() {
        let want = OffsetDateTime::now_utc().year();

        assert_eq!(current_local_year("Etc/UTC"), Ok(want));
    }

    #[test]
    fn unknown_timezone_is_an_error() {
        assert_eq!(
            current_local_year("Mars/Olympus_Mons"),
            Err(Error::InvalidTimezoneError("Mars/Olympus_Mons".to_owned()))
        );
    }
}
