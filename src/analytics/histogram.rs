use serde::Serialize;
use time::{
    format_description::well_known::Rfc3339, macros::format_description, Date, OffsetDateTime,
    PrimitiveDateTime, UtcOffset,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourBucket {
    pub hour: u8,
    pub count: u64,
    pub label: String,
}

/// UTC hour of a stored capture timestamp. Values without an offset are
/// read as UTC; anything unparseable yields `None`.
pub fn utc_hour(raw: &str) -> Option<u8> {
    let raw = raw.trim();
    if let Ok(dt) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(dt.to_offset(UtcOffset::UTC).hour());
    }

    let normalized = raw.replacen(' ', "T", 1);
    let local = format_description!(
        "[year]-[month]-[day]T[hour]:[minute][optional [:[second]]][optional [.[subsecond]]]"
    );
    if let Ok(dt) = PrimitiveDateTime::parse(&normalized, &local) {
        return Some(dt.hour());
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|_| 0)
}

/// Counts capture timestamps into 24 hourly buckets, `"00:00"` to `"23:00"`.
pub fn hourly_histogram<I, S>(timestamps: I) -> Vec<HourBucket>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut buckets: Vec<HourBucket> = (0..24u8)
        .map(|hour| HourBucket {
            hour,
            count: 0,
            label: format!("{hour:02}:00"),
        })
        .collect();

    for ts in timestamps {
        if let Some(hour) = utc_hour(ts.as_ref()) {
            buckets[usize::from(hour)].count += 1;
        }
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_by_utc_hour() {
        let stamps = [
            "2024-01-01T03:10:00Z",
            "2024-02-11T03:59:59Z",
            "2024-03-05T14:00:00Z",
            "2024-04-09T23:30:00Z",
        ];
        let hist = hourly_histogram(stamps);

        assert_eq!(hist.len(), 24);
        assert_eq!(hist[3].count, 2);
        assert_eq!(hist[14].count, 1);
        assert_eq!(hist[23].count, 1);
        let total: u64 = hist.iter().map(|b| b.count).sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn recomputation_is_stable() {
        let stamps = ["2024-01-01T03:10:00Z", "bad", "2024-06-01T01:30:00+02:00"];
        assert_eq!(hourly_histogram(stamps), hourly_histogram(stamps));
    }

    #[test]
    fn labels_are_zero_padded() {
        let hist = hourly_histogram(Vec::<String>::new());
        assert_eq!(hist[0].label, "00:00");
        assert_eq!(hist[9].label, "09:00");
        assert_eq!(hist[23].label, "23:00");
        assert!(hist.iter().all(|b| b.count == 0));
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        assert_eq!(utc_hour("2024-06-01T01:30:00+02:00"), Some(23));
        assert_eq!(utc_hour("2024-06-01T22:00:00-03:00"), Some(1));
    }

    #[test]
    fn naive_timestamps_are_utc() {
        assert_eq!(utc_hour("2024-06-01T08:15:00"), Some(8));
        assert_eq!(utc_hour("2024-06-01 17:45:12"), Some(17));
        assert_eq!(utc_hour("2024-06-01"), Some(0));
    }

    #[test]
    fn garbage_is_skipped() {
        assert_eq!(utc_hour("sometime"), None);
        let hist = hourly_histogram(["not a date", "2024-06-01T05:00:00Z"]);
        assert_eq!(hist[5].count, 1);
        assert_eq!(hist.iter().map(|b| b.count).sum::<u64>(), 1);
    }
}
