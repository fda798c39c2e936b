/// Age and age bracket derivation for exported members

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Whole years between `dob` and `today`
///
/// A birthday not yet reached this year subtracts one. A date of birth in the
/// future has no meaningful age and yields `None`.
///
/// ```
/// use chrono::NaiveDate;
/// use gymtrack_export::age::calculate_age;
///
/// let dob = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
/// let today = NaiveDate::from_ymd_opt(2025, 6, 14).unwrap();
/// assert_eq!(calculate_age(dob, today), Some(34));
/// ```
pub fn calculate_age(dob: NaiveDate, today: NaiveDate) -> Option<u32> {
    let before_birthday = (today.month(), today.day()) < (dob.month(), dob.day());
    let years = today.year() - dob.year() - i32::from(before_birthday);

    u32::try_from(years).ok()
}

/// Reporting bracket for a member's age
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeGroup {
    Under18,
    From18To29,
    From30To44,
    From45To59,
    Over60,
    Unknown,
}

impl AgeGroup {
    pub fn from_age(age: Option<u32>) -> Self {
        match age {
            None => AgeGroup::Unknown,
            Some(a) if a < 18 => AgeGroup::Under18,
            Some(a) if a < 30 => AgeGroup::From18To29,
            Some(a) if a < 45 => AgeGroup::From30To44,
            Some(a) if a < 60 => AgeGroup::From45To59,
            Some(_) => AgeGroup::Over60,
        }
    }

    /// Label written to the export (the ranges use an en dash)
    pub fn label(&self) -> &'static str {
        match self {
            AgeGroup::Under18 => "Under 18",
            AgeGroup::From18To29 => "18\u{2013}29",
            AgeGroup::From30To44 => "30\u{2013}44",
            AgeGroup::From45To59 => "45\u{2013}59",
            AgeGroup::Over60 => "60+",
            AgeGroup::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
