#[cfg(test)]
mod tests {
    use crate::logic::{parse_clock_time, plan_reminders, Prayer};
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use chrono_tz::Asia::Jakarta;
    use deenify_common::models::{EnabledPrayers, PrayerTimesSnapshot};

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Jakarta
            .with_ymd_and_hms(y, m, d, h, min, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn snapshot(date: NaiveDate, times: [&str; 5]) -> PrayerTimesSnapshot {
        PrayerTimesSnapshot {
            date,
            fajr: times[0].to_string(),
            dhuhr: times[1].to_string(),
            asr: times[2].to_string(),
            maghrib: times[3].to_string(),
            isha: times[4].to_string(),
        }
    }

    #[test]
    fn reminder_instant_is_lead_minutes_before_prayer() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "12:00", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 4, 0);

        let planned = plan_reminders(&timings, 10, None, now);

        assert_eq!(planned.len(), 5, "all five prayers are still ahead");
        let fajr = planned
            .iter()
            .find(|r| r.prayer == Prayer::Fajr)
            .expect("Fajr should be planned");
        assert_eq!(fajr.due_at, local(2025, 3, 10, 5, 0));
        assert!(fajr.title.contains("Fajr"));
        assert_eq!(fajr.meta["prayerName"], "Fajr");
        assert_eq!(fajr.meta["notifyBeforeMinutes"], 10);
    }

    #[test]
    fn zero_lead_time_notifies_at_prayer_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "12:00", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 4, 0);

        let planned = plan_reminders(&timings, 0, None, now);

        let fajr = planned.iter().find(|r| r.prayer == Prayer::Fajr).unwrap();
        assert_eq!(fajr.due_at, local(2025, 3, 10, 5, 10));
    }

    #[test]
    fn candidate_exactly_at_now_is_not_scheduled() {
        // The strict-future rule: due == now does not fire.
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "04:00", "04:00", "04:00", "04:00"]);
        let now = local(2025, 3, 10, 5, 0);

        let planned = plan_reminders(&timings, 10, None, now);

        assert!(planned.is_empty());
    }

    #[test]
    fn passed_prayer_is_skipped_without_roll_forward() {
        // Scenario B: Dhuhr at 12:00 has already passed at 13:00.
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["04:45", "12:00", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 13, 0);

        let planned = plan_reminders(&timings, 5, None, now);

        assert!(planned.iter().all(|r| r.prayer != Prayer::Dhuhr));
        assert!(planned.iter().all(|r| r.prayer != Prayer::Fajr));
        assert_eq!(planned.len(), 3, "Asr, Maghrib, Isha remain");
        // Everything planned stays on today's date.
        for reminder in &planned {
            assert_eq!(
                reminder.due_at.with_timezone(&Jakarta).date_naive(),
                date
            );
        }
    }

    #[test]
    fn disabled_prayer_is_suppressed_and_only_that_prayer() {
        // Scenario C: the enable map disables Asr alone.
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "12:00", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 4, 0);

        let enabled = EnabledPrayers {
            asr: Some(false),
            ..Default::default()
        };

        let planned = plan_reminders(&timings, 5, Some(&enabled), now);

        assert_eq!(planned.len(), 4);
        assert!(planned.iter().all(|r| r.prayer != Prayer::Asr));
    }

    #[test]
    fn missing_enable_entry_means_enabled() {
        let enabled = EnabledPrayers {
            fajr: Some(true),
            ..Default::default()
        };
        assert!(enabled.allows("fajr"));
        assert!(enabled.allows("isha"));

        let disabled = EnabledPrayers {
            isha: Some(false),
            ..Default::default()
        };
        assert!(!disabled.allows("isha"));
        assert!(disabled.allows("maghrib"));
    }

    #[test]
    fn malformed_clock_time_aborts_that_prayer_only() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "not-a-time", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 4, 0);

        let planned = plan_reminders(&timings, 5, None, now);

        assert_eq!(planned.len(), 4);
        assert!(planned.iter().all(|r| r.prayer != Prayer::Dhuhr));
    }

    #[test]
    fn parse_clock_time_tolerates_timezone_suffix() {
        let time = parse_clock_time("04:37 (WIB)").unwrap();
        assert_eq!(time, chrono::NaiveTime::from_hms_opt(4, 37, 0).unwrap());

        assert!(parse_clock_time("25:99").is_err());
        assert!(parse_clock_time("").is_err());
    }

    #[test]
    fn body_mentions_lead_and_clock_time() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let timings = snapshot(date, ["05:10", "12:00", "15:15", "18:05", "19:20"]);
        let now = local(2025, 3, 10, 4, 0);

        let planned = plan_reminders(&timings, 7, None, now);
        let fajr = planned.iter().find(|r| r.prayer == Prayer::Fajr).unwrap();

        assert!(fajr.body.contains("7 menit"));
        assert!(fajr.body.contains("05:10"));
    }
}
