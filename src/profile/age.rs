use chrono::{Datelike, NaiveDate};

pub const MINIMUM_AGE: i32 = 13;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgeGateError {
    #[error("Date of birth cannot be in the future")]
    InFuture,
    #[error("You must be at least {0} years old")]
    TooYoung(i32),
}

/// Completed years between `dob` and `today`.
///
/// Calendar-year difference, minus one when today's month/day falls before the
/// birthday's month/day. A 29 February birthday therefore completes its year on
/// 1 March in common years.
pub fn age_on(dob: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        age -= 1;
    }
    age
}

/// Birth date must not be in the future and the holder must be at least
/// [`MINIMUM_AGE`].
pub fn check_age(dob: NaiveDate, today: NaiveDate) -> Result<(), AgeGateError> {
    if dob > today {
        return Err(AgeGateError::InFuture);
    }
    if age_on(dob, today) < MINIMUM_AGE {
        return Err(AgeGateError::TooYoung(MINIMUM_AGE));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn exactly_thirteen_years_passes() {
        assert_eq!(check_age(date(2011, 6, 15), date(2024, 6, 15)), Ok(()));
    }

    #[test]
    fn one_day_short_fails_on_day_boundary() {
        assert_eq!(
            check_age(date(2011, 6, 16), date(2024, 6, 15)),
            Err(AgeGateError::TooYoung(13))
        );
    }

    #[test]
    fn one_day_short_fails_on_month_boundary() {
        // Birthday on the 1st, checked on the last day of the previous month.
        assert_eq!(
            check_age(date(2011, 7, 1), date(2024, 6, 30)),
            Err(AgeGateError::TooYoung(13))
        );
        assert_eq!(check_age(date(2011, 7, 1), date(2024, 7, 1)), Ok(()));
    }

    #[test]
    fn one_day_short_fails_across_year_boundary() {
        assert_eq!(
            check_age(date(2011, 1, 1), date(2023, 12, 31)),
            Err(AgeGateError::TooYoung(13))
        );
        assert_eq!(check_age(date(2011, 1, 1), date(2024, 1, 1)), Ok(()));
    }

    #[test]
    fn leap_day_birthday_completes_on_march_first() {
        assert_eq!(age_on(date(2012, 2, 29), date(2025, 2, 28)), 12);
        assert_eq!(age_on(date(2012, 2, 29), date(2025, 3, 1)), 13);
        assert_eq!(age_on(date(2012, 2, 29), date(2028, 2, 29)), 16);
    }

    #[test]
    fn future_date_is_rejected_before_age() {
        assert_eq!(
            check_age(date(2030, 1, 1), date(2024, 6, 15)),
            Err(AgeGateError::InFuture)
        );
    }

    #[test]
    fn born_today_is_too_young_not_future() {
        assert_eq!(
            check_age(date(2024, 6, 15), date(2024, 6, 15)),
            Err(AgeGateError::TooYoung(13))
        );
    }
}
