//! Business-day numbering
//!
//! Order numbers reset at the store's opening time, not at midnight. A
//! trading day runs from the opening time on one calendar day to the same time
//! on the next, in the store's own timezone.
//!
//! The numbering read and the order insert must run in one transaction that
//! holds the store row lock (see `db::catalog::lock_store`). The unique index
//! on `(store_id, business_day_start, daily_number)` backs this up.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use shared::models::{DEFAULT_OPEN_TIME, Store};
use sqlx::PgConnection;

use crate::db;
use crate::error::ServiceResult;

/// Half-open `[start, end)` window in Unix millis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradingWindow {
    pub start: i64,
    pub end: i64,
}

impl TradingWindow {
    pub fn contains(&self, millis: i64) -> bool {
        self.start <= millis && millis < self.end
    }
}

/// Resolve the store timezone, falling back to Asia/Seoul
pub fn parse_timezone(name: &str) -> Tz {
    name.parse::<Tz>().unwrap_or_else(|_| {
        tracing::warn!(timezone = %name, "Unknown store timezone, falling back to Asia/Seoul");
        chrono_tz::Asia::Seoul
    })
}

fn default_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Parse an "HH:MM" opening time. Missing or unparsable values give 09:00.
pub fn parse_open_time(open_time: Option<&str>) -> NaiveTime {
    let raw = open_time.unwrap_or(DEFAULT_OPEN_TIME);
    NaiveTime::parse_from_str(raw, "%H:%M").unwrap_or_else(|e| {
        tracing::warn!(
            "Failed to parse open_time '{}': {}, falling back to {}",
            raw,
            e,
            DEFAULT_OPEN_TIME
        );
        default_open_time()
    })
}

/// Store-local weekday of `now` (0 = Monday)
pub fn local_weekday(now: DateTime<Utc>, tz: Tz) -> i16 {
    now.with_timezone(&tz).weekday().num_days_from_monday() as i16
}

/// Date + local time → Unix millis in `tz`.
///
/// A time inside a DST gap resolves to the first valid instant after the gap.
/// In an overlap the later instant wins.
fn local_millis(date: NaiveDate, time: NaiveTime, tz: Tz) -> i64 {
    let naive = date.and_time(time);
    if let Some(dt) = naive.and_local_timezone(tz).latest() {
        return dt.timestamp_millis();
    }
    // Gaps are whole minutes and never longer than a day
    (1..=24 * 60)
        .find_map(|m| {
            (naive + Duration::minutes(m))
                .and_local_timezone(tz)
                .earliest()
        })
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// Trading window containing `now` for a store opening at `open`
pub fn trading_window(now: DateTime<Utc>, open: NaiveTime, tz: Tz) -> TradingWindow {
    let today = now.with_timezone(&tz).date_naive();
    let today_open = local_millis(today, open, tz);
    let now_millis = now.timestamp_millis();

    if now_millis < today_open {
        let yesterday = today.pred_opt().unwrap_or(today);
        TradingWindow {
            start: local_millis(yesterday, open, tz),
            end: today_open,
        }
    } else {
        let tomorrow = today.succ_opt().unwrap_or(today);
        TradingWindow {
            start: today_open,
            end: local_millis(tomorrow, open, tz),
        }
    }
}

/// Next number given the highest number already used in the window
pub fn next_after(max_in_window: Option<i32>) -> i32 {
    max_in_window.map_or(1, |max| max + 1)
}

/// Compute the trading window for `now` and the next daily number in it.
///
/// Must be called inside the order transaction after the store row is locked.
pub async fn next_daily_number(
    conn: &mut PgConnection,
    store: &Store,
    now: DateTime<Utc>,
) -> ServiceResult<(TradingWindow, i32)> {
    let tz = parse_timezone(&store.timezone);
    let weekday = local_weekday(now, tz);
    let hours = db::catalog::get_operating_hours(&mut *conn, store.id, weekday).await?;
    let open = parse_open_time(hours.as_ref().map(|h| h.open_time.as_str()));
    let window = trading_window(now, open, tz);

    let max = db::orders::max_daily_number(&mut *conn, store.id, window).await?;
    Ok((window, next_after(max)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn seoul(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        chrono_tz::Asia::Seoul
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn nine() -> NaiveTime {
        NaiveTime::from_hms_opt(9, 0, 0).unwrap()
    }

    #[test]
    fn before_opening_belongs_to_previous_day() {
        // 2026-10-13 is a Tuesday
        let now = seoul(2026, 10, 13, 8, 30);
        let window = trading_window(now, nine(), chrono_tz::Asia::Seoul);

        assert_eq!(window.start, seoul(2026, 10, 12, 9, 0).timestamp_millis());
        assert_eq!(window.end, seoul(2026, 10, 13, 9, 0).timestamp_millis());
        assert!(window.contains(now.timestamp_millis()));
    }

    #[test]
    fn after_opening_starts_new_day() {
        let now = seoul(2026, 10, 13, 10, 0);
        let window = trading_window(now, nine(), chrono_tz::Asia::Seoul);

        assert_eq!(window.start, seoul(2026, 10, 13, 9, 0).timestamp_millis());
        assert_eq!(window.end, seoul(2026, 10, 14, 9, 0).timestamp_millis());
    }

    #[test]
    fn opening_instant_is_inclusive() {
        let now = seoul(2026, 10, 13, 9, 0);
        let window = trading_window(now, nine(), chrono_tz::Asia::Seoul);
        assert_eq!(window.start, now.timestamp_millis());
    }

    #[test]
    fn late_night_stays_in_same_day() {
        let evening = trading_window(seoul(2026, 10, 13, 23, 50), nine(), chrono_tz::Asia::Seoul);
        let after_midnight =
            trading_window(seoul(2026, 10, 14, 1, 15), nine(), chrono_tz::Asia::Seoul);
        assert_eq!(evening, after_midnight);
    }

    #[test]
    fn opening_in_dst_gap_moves_to_end_of_gap() {
        // New York skips 02:00-03:00 on 2026-03-08
        let ny = chrono_tz::America::New_York;
        let half_past_two = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 8, 16, 0, 0).unwrap();
        let window = trading_window(now, half_past_two, ny);

        // 03:00 EDT
        assert_eq!(
            window.start,
            Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap().timestamp_millis()
        );
        // 02:30 EDT the next day
        assert_eq!(
            window.end,
            Utc.with_ymd_and_hms(2026, 3, 9, 6, 30, 0).unwrap().timestamp_millis()
        );
        assert!(window.contains(now.timestamp_millis()));
    }

    #[test]
    fn weekday_uses_store_timezone() {
        // Monday 23:30 UTC is already Tuesday in Seoul
        let now = Utc.with_ymd_and_hms(2026, 10, 12, 23, 30, 0).unwrap();
        assert_eq!(local_weekday(now, chrono_tz::Asia::Seoul), 1);
        assert_eq!(local_weekday(now, chrono_tz::UTC), 0);
    }

    #[test]
    fn open_time_defaults() {
        assert_eq!(parse_open_time(None), nine());
        assert_eq!(parse_open_time(Some("not-a-time")), nine());
        assert_eq!(
            parse_open_time(Some("11:30")),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap()
        );
    }

    #[test]
    fn unknown_timezone_falls_back() {
        assert_eq!(parse_timezone("Mars/Olympus"), chrono_tz::Asia::Seoul);
        assert_eq!(parse_timezone("Europe/Madrid"), chrono_tz::Europe::Madrid);
    }

    #[test]
    fn numbering_starts_at_one() {
        assert_eq!(next_after(None), 1);
        assert_eq!(next_after(Some(41)), 42);
    }
}
