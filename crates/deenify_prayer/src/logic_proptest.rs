#[cfg(test)]
mod proptests {
    use crate::logic::plan_reminders;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Jakarta;
    use deenify_common::models::PrayerTimesSnapshot;
    use proptest::prelude::*;

    proptest! {
        /// For every lead L >= 0 and clock time T, the computed instant is
        /// exactly T - L minutes, and it is planned iff that instant is
        /// strictly after "now".
        #[test]
        fn notification_instant_is_prayer_time_minus_lead(
            hour in 0u32..24,
            minute in 0u32..60,
            lead in 0i64..240,
        ) {
            let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
            let clock = format!("{:02}:{:02}", hour, minute);
            let timings = PrayerTimesSnapshot {
                date,
                fajr: clock.clone(),
                dhuhr: clock.clone(),
                asr: clock.clone(),
                maghrib: clock.clone(),
                isha: clock.clone(),
            };

            let prayer_instant = Jakarta
                .with_ymd_and_hms(2025, 6, 1, hour, minute, 0)
                .unwrap()
                .with_timezone(&Utc);
            let expected_due = prayer_instant - Duration::minutes(lead);

            // Fix "now" at local noon so both outcomes are exercised.
            let now = Jakarta
                .with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
                .unwrap()
                .with_timezone(&Utc);

            let planned = plan_reminders(&timings, lead, None, now);

            if expected_due > now {
                prop_assert_eq!(planned.len(), 5);
                for reminder in &planned {
                    prop_assert_eq!(reminder.due_at, expected_due);
                }
            } else {
                prop_assert!(planned.is_empty());
            }
        }
    }
}
