//! SM-2 spaced-repetition scheduler.
//!
//! Pure functions computing the next review date, interval, and ease factor
//! from a quality rating. No state, no I/O; deterministic given `now`.
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but remembered upon seeing the answer
//! - 2: Incorrect, but the answer seemed easy to recall
//! - 3: Correct with serious difficulty
//! - 4: Correct with some hesitation
//! - 5: Perfect response

use chrono::{DateTime, Datelike, Days, TimeZone};

use crate::error::{MnemoError, MnemoResult};

/// Hard floor on the ease factor. Applied to the output on every call, even
/// when the caller passes an ease factor already below the floor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Result of computing the next review.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome<Tz: TimeZone> {
    /// When the item is next due.
    pub next_at: DateTime<Tz>,
    /// New interval in days.
    pub interval_days: i32,
    /// New ease factor (>= 1.3).
    pub ease_factor: f64,
}

/// Compute the next review from the current scheduling state and a quality
/// rating, using the SM-2 algorithm.
///
/// `now` carries the user's time zone; the next date is `now` plus the new
/// interval in *calendar* days, so month and DST boundaries are crossed with
/// the wall-clock time preserved.
///
/// Out-of-range input is rejected, not clamped: quality above 5 or a
/// negative interval is an `InvalidArgument` error.
pub fn next_review<Tz: TimeZone>(
    ease_factor: f64,
    interval_days: i32,
    quality: u8,
    now: DateTime<Tz>,
) -> MnemoResult<ReviewOutcome<Tz>> {
    if quality > 5 {
        return Err(MnemoError::invalid_quality(quality));
    }
    if interval_days < 0 {
        return Err(MnemoError::invalid_argument(format!(
            "Interval {} days is negative",
            interval_days
        )));
    }

    // EF' = max(1.3, EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)))
    let miss = (5 - quality) as f64;
    let new_ease_factor = (ease_factor + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EASE_FACTOR);

    let new_interval = if quality < 3 {
        // Failed recall always resets to one day, regardless of prior
        // interval or ease.
        1
    } else if interval_days == 0 {
        // First successful review.
        1
    } else if interval_days == 1 {
        // Second successful review: fixed graduation step.
        6
    } else {
        // Truncation toward zero, matching SM-2: 6 days at ease 2.6 gives
        // 15, not 16.
        (interval_days as f64 * new_ease_factor) as i32
    };

    let next_at = now
        .clone()
        .checked_add_days(Days::new(new_interval as u64))
        .unwrap_or(now);

    Ok(ReviewOutcome {
        next_at,
        interval_days: new_interval,
        ease_factor: new_ease_factor,
    })
}

/// The interval each quality rating would produce from the given state.
///
/// Used to annotate rating buttons with "what happens if I pick this".
pub fn preview_intervals(ease_factor: f64, interval_days: i32) -> [i32; 6] {
    let mut intervals = [0; 6];
    for (quality, slot) in intervals.iter_mut().enumerate() {
        // Quality is always in range here, and the shared interval was
        // validated by the caller's own state.
        if let Ok(outcome) = next_review(
            ease_factor,
            interval_days.max(0),
            quality as u8,
            chrono::Utc::now(),
        ) {
            *slot = outcome.interval_days;
        }
    }
    intervals
}

/// Shift a timestamp to 18:00 on the same local day.
///
/// Afternoon/evening reviews favour long-term consolidation; the reminder
/// path uses this to pick a notification time on the scheduled day.
pub fn optimal_review_time<Tz: TimeZone>(date: DateTime<Tz>) -> DateTime<Tz> {
    date.timezone()
        .with_ymd_and_hms(date.year(), date.month(), date.day(), 18, 0, 0)
        .earliest()
        .unwrap_or(date)
}

/// Format an interval in days as a short human-readable label.
pub fn format_interval(days: i32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone, Utc};

    #[test]
    fn test_first_successful_review() {
        let outcome = next_review(2.5, 0, 5, Utc::now()).unwrap();
        assert_eq!(outcome.interval_days, 1);
        assert!((outcome.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_second_successful_review_graduates_to_six() {
        let outcome = next_review(2.5, 1, 5, Utc::now()).unwrap();
        assert_eq!(outcome.interval_days, 6);
        assert!((outcome.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_multiplicative_growth_truncates() {
        // 6 * 2.6 = 15.6 -> 15, not 16.
        let outcome = next_review(2.5, 6, 5, Utc::now()).unwrap();
        assert_eq!(outcome.interval_days, 15);
        assert!((outcome.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_failure_resets_interval() {
        for quality in 0..3 {
            let outcome = next_review(2.8, 42, quality, Utc::now()).unwrap();
            assert_eq!(outcome.interval_days, 1, "quality {} must reset", quality);
        }
    }

    #[test]
    fn test_ease_floor_engaged_exactly() {
        let outcome = next_review(1.3, 10, 0, Utc::now()).unwrap();
        assert_eq!(outcome.ease_factor, 1.3);
        assert_eq!(outcome.interval_days, 1);
    }

    #[test]
    fn test_ease_floor_holds_for_all_inputs() {
        for ef in [0.0, 0.5, 1.0, 1.3, 2.5, 4.0] {
            for interval in [0, 1, 6, 30] {
                for quality in 0..=5 {
                    let outcome = next_review(ef, interval, quality, Utc::now()).unwrap();
                    assert!(
                        outcome.ease_factor >= MIN_EASE_FACTOR,
                        "ef {} interval {} quality {} gave {}",
                        ef,
                        interval,
                        quality,
                        outcome.ease_factor
                    );
                }
            }
        }
    }

    #[test]
    fn test_quality_four_holds_ease() {
        let outcome = next_review(2.5, 6, 4, Utc::now()).unwrap();
        assert!((outcome.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_out_of_range_quality_rejected() {
        let err = next_review(2.5, 6, 6, Utc::now()).unwrap_err();
        assert_eq!(err.code().as_str(), "SCHED_001");
    }

    #[test]
    fn test_negative_interval_rejected() {
        assert!(next_review(2.5, -1, 4, Utc::now()).is_err());
    }

    #[test]
    fn test_next_date_crosses_month_boundary() {
        let now = Utc.with_ymd_and_hms(2026, 1, 30, 9, 30, 0).unwrap();
        let outcome = next_review(2.5, 1, 5, now).unwrap();

        // 6 days from Jan 30 lands on Feb 5 at the same wall-clock time.
        assert_eq!(outcome.next_at, Utc.with_ymd_and_hms(2026, 2, 5, 9, 30, 0).unwrap());
    }

    #[test]
    fn test_next_date_crosses_leap_day() {
        let now = Utc.with_ymd_and_hms(2028, 2, 28, 12, 0, 0).unwrap();
        let outcome = next_review(2.5, 0, 4, now).unwrap();
        assert_eq!(outcome.next_at, Utc.with_ymd_and_hms(2028, 2, 29, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_next_date_preserves_local_wall_clock() {
        // Calendar-day addition in a non-UTC zone keeps the local time of
        // day rather than adding 86400-second multiples.
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 3, 7, 21, 15, 0).unwrap();
        let outcome = next_review(2.5, 1, 5, now).unwrap();

        assert_eq!(outcome.next_at, tz.with_ymd_and_hms(2026, 3, 13, 21, 15, 0).unwrap());
    }

    #[test]
    fn test_preview_intervals() {
        let previews = preview_intervals(2.5, 6);
        // Failing ratings reset to 1; passing ratings multiply.
        assert_eq!(previews[0], 1);
        assert_eq!(previews[1], 1);
        assert_eq!(previews[2], 1);
        assert_eq!(previews[5], 15);
        assert!(previews[3] <= previews[4] && previews[4] <= previews[5]);
    }

    #[test]
    fn test_optimal_review_time_is_six_pm() {
        let date = Utc.with_ymd_and_hms(2026, 5, 2, 8, 45, 0).unwrap();
        let optimal = optimal_review_time(date);
        assert_eq!(optimal, Utc.with_ymd_and_hms(2026, 5, 2, 18, 0, 0).unwrap());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(0), "now");
        assert_eq!(format_interval(1), "1d");
        assert_eq!(format_interval(6), "6d");
        assert_eq!(format_interval(14), "2w");
        assert_eq!(format_interval(45), "1mo");
        assert_eq!(format_interval(400), "1y");
    }
}
