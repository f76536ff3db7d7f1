//! Size display and zip timestamp conversion

use filetime::FileTime;

const SECS_PER_DAY: i64 = 86_400;

/// Days from 0000-03-01 to 1970-01-01 in the proleptic Gregorian calendar.
const EPOCH_OFFSET_DAYS: i64 = 719_468;

/// Byte count in binary units with one decimal, as shown in the run summary.
///
/// ```
/// use unspool::format_size;
///
/// assert_eq!(format_size(512), "512B");
/// assert_eq!(format_size(1536 * 1024), "1.5M");
/// ```
pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 4] = ["K", "M", "G", "T"];

    if size < 1024 {
        return format!("{size}B");
    }
    let mut value = size as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

/// Zip timestamps carry no zone and are taken as UTC.
///
/// ```
/// use zip::DateTime;
/// use unspool::utils::datetime_to_filetime;
///
/// let dt = DateTime::from_date_and_time(2024, 1, 15, 10, 30, 0).unwrap();
/// assert_eq!(datetime_to_filetime(dt).unix_seconds(), 1_705_314_600);
/// ```
pub fn datetime_to_filetime(dt: zip::DateTime) -> FileTime {
    let days = days_since_epoch(i64::from(dt.year()), i64::from(dt.month()), i64::from(dt.day()));
    let time_of_day =
        i64::from(dt.hour()) * 3600 + i64::from(dt.minute()) * 60 + i64::from(dt.second());
    FileTime::from_unix_time(days * SECS_PER_DAY + time_of_day, 0)
}

/// Civil date to days since 1970-01-01.
///
/// Counts from March so the leap day falls at the end of the shifted year.
fn days_since_epoch(year: i64, month: i64, day: i64) -> i64 {
    let (year, month) = if month <= 2 { (year - 1, month + 9) } else { (year, month - 3) };
    let era = year.div_euclid(400);
    let year_of_era = year.rem_euclid(400);
    let day_of_year = (153 * month + 2) / 5 + day - 1;
    let day_of_era = year_of_era * 365 + year_of_era / 4 - year_of_era / 100 + day_of_year;
    era * 146_097 + day_of_era - EPOCH_OFFSET_DAYS
}
