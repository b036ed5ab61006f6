use chrono::{DateTime, LocalResult, NaiveDate, TimeZone, Utc};

/// One reporting day: the half-open interval
/// `[local midnight, next local midnight)` containing some instant.
///
/// The calendar lives in the timezone of the instant the window was derived
/// from; the bounds are carried in UTC so instants compare without further
/// conversion. `day` is the deduplication key the storage layer constrains on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    day: NaiveDate,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl ReportWindow {
    /// Window containing `now`, with day boundaries taken from `now`'s timezone.
    pub fn containing<Tz: TimeZone>(now: DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let day = now.date_naive();
        let next = day.succ_opt().expect("Date overflow");

        Self {
            day,
            start: day_start(&tz, day).with_timezone(&Utc),
            end: day_start(&tz, next).with_timezone(&Utc),
        }
    }

    /// The calendar day this window covers.
    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Half-open membership: start inclusive, end exclusive.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// First representable instant of `day` in `tz`.
///
/// Midnight can fall inside a DST gap; in that case the day starts at the
/// first wall-clock hour that exists. Ambiguous midnights take the earlier
/// of the two instants.
fn day_start<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Tz> {
    for hour in 0..24 {
        let wall = day.and_hms_opt(hour, 0, 0).expect("valid wall-clock time");
        match tz.from_local_datetime(&wall) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earlier, _) => return earlier,
            LocalResult::None => continue,
        }
    }

    // No real timezone skips a whole day.
    tz.from_utc_datetime(&day.and_hms_opt(0, 0, 0).expect("valid wall-clock time"))
}
