//! Raw payload → canonical daily series.
//!
//! Every record must carry all five provider labels and every value must
//! parse to a finite float. One bad record rejects the whole payload; rows are
//! never dropped silently. Output is sorted ascending by date with no
//! duplicate dates.

use super::provider::{DataError, RawDailyRecord, RawSeries};
use crate::domain::{DailySeries, Observation};
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Canonical field of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Open,
    High,
    Low,
    Close,
    Volume,
}

/// Provider label → canonical field. Exhaustive: a record missing any of these is rejected.
pub const FIELD_LABELS: [(&str, Field); 5] = [
    ("1. open", Field::Open),
    ("2. high", Field::High),
    ("3. low", Field::Low),
    ("4. close", Field::Close),
    ("5. volume", Field::Volume),
];

/// Parse, validate and sort a raw payload.
pub fn canonicalize(raw: &RawSeries) -> Result<DailySeries, DataError> {
    let mut observations = raw
        .iter()
        .map(|(date_key, record)| parse_record(date_key, record))
        .collect::<Result<Vec<_>, _>>()?;

    observations.sort_by_key(|o| o.date);

    if let Some(w) = observations.windows(2).find(|w| w[0].date == w[1].date) {
        return Err(DataError::MalformedData(format!(
            "duplicate date {}",
            w[0].date
        )));
    }

    DailySeries::from_sorted(observations)
        .ok_or_else(|| DataError::MalformedData("series is not strictly ascending".into()))
}

fn parse_record(date_key: &str, record: &RawDailyRecord) -> Result<Observation, DataError> {
    let date = NaiveDate::parse_from_str(date_key.trim(), DATE_FORMAT)
        .map_err(|e| DataError::MalformedData(format!("invalid date '{date_key}': {e}")))?;

    let mut obs = Observation {
        date,
        open: 0.0,
        high: 0.0,
        low: 0.0,
        close: 0.0,
        volume: 0.0,
    };

    for (label, field) in FIELD_LABELS {
        let text = record.get(label).ok_or_else(|| {
            DataError::MalformedData(format!("{date_key}: missing field '{label}'"))
        })?;
        let value = parse_value(text).ok_or_else(|| {
            DataError::MalformedData(format!("{date_key}: '{label}' is not a number: '{text}'"))
        })?;
        match field {
            Field::Open => obs.open = value,
            Field::High => obs.high = value,
            Field::Low => obs.low = value,
            Field::Close => obs.close = value,
            Field::Volume => obs.volume = value,
        }
    }

    Ok(obs)
}

fn parse_value(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(open: &str, high: &str, low: &str, close: &str, volume: &str) -> RawDailyRecord {
        [
            ("1. open", open),
            ("2. high", high),
            ("3. low", low),
            ("4. close", close),
            ("5. volume", volume),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn renames_and_types_fields() {
        let raw = RawSeries::from([(
            "2024-01-02".to_string(),
            record("187.15", "188.44", "183.885", "185.64", "82488674"),
        )]);

        let series = canonicalize(&raw).unwrap();
        let obs = series.observations()[0];

        assert_eq!(obs.date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(obs.open, 187.15);
        assert_eq!(obs.high, 188.44);
        assert_eq!(obs.low, 183.885);
        assert_eq!(obs.close, 185.64);
        assert_eq!(obs.volume, 82_488_674.0);
    }

    #[test]
    fn sorts_by_calendar_date() {
        // "2024-10-01" < "2024-2-01" as strings.
        let raw = RawSeries::from([
            ("2024-10-01".to_string(), record("3", "3", "3", "3", "1")),
            ("2024-2-01".to_string(), record("2", "2", "2", "2", "1")),
            ("2023-12-29".to_string(), record("1", "1", "1", "1", "1")),
        ]);
        let key_order: Vec<&str> = raw.keys().map(String::as_str).collect();
        assert_eq!(key_order, ["2023-12-29", "2024-10-01", "2024-2-01"]);

        let series = canonicalize(&raw).unwrap();
        assert_eq!(series.closes(), vec![1.0, 2.0, 3.0]);
        assert_eq!(
            series.dates()[1],
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
    }

    #[test]
    fn duplicate_calendar_dates_rejected() {
        let raw = RawSeries::from([
            ("2024-01-02".to_string(), record("1", "1", "1", "1", "1")),
            ("2024-1-2".to_string(), record("2", "2", "2", "2", "1")),
        ]);

        let err = canonicalize(&raw).unwrap_err();
        assert!(matches!(err, DataError::MalformedData(msg) if msg.contains("duplicate")));
    }

    #[test]
    fn unparsable_value_rejects_whole_payload() {
        let raw = RawSeries::from([
            ("2024-01-02".to_string(), record("1", "1", "1", "1", "1")),
            ("2024-01-03".to_string(), record("1", "1", "1", "n/a", "1")),
        ]);

        let err = canonicalize(&raw).unwrap_err();
        assert!(matches!(err, DataError::MalformedData(msg) if msg.contains("4. close")));
    }

    #[test]
    fn missing_label_rejected() {
        let mut rec = record("1", "1", "1", "1", "1");
        rec.remove("5. volume");
        let raw = RawSeries::from([("2024-01-02".to_string(), rec)]);

        let err = canonicalize(&raw).unwrap_err();
        assert!(matches!(err, DataError::MalformedData(msg) if msg.contains("5. volume")));
    }

    #[test]
    fn extra_labels_ignored() {
        let mut rec = record("1", "2", "0.5", "1.5", "10");
        rec.insert("6. dividend".into(), "0.0".into());
        let raw = RawSeries::from([("2024-01-02".to_string(), rec)]);

        assert_eq!(canonicalize(&raw).unwrap().len(), 1);
    }

    #[test]
    fn non_finite_values_rejected() {
        for bad in ["NaN", "inf", "-infinity"] {
            let raw = RawSeries::from([("2024-01-02".to_string(), record("1", "1", "1", bad, "1"))]);
            assert!(canonicalize(&raw).is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn invalid_date_rejected() {
        let raw = RawSeries::from([("02/01/2024".to_string(), record("1", "1", "1", "1", "1"))]);
        assert!(matches!(
            canonicalize(&raw).unwrap_err(),
            DataError::MalformedData(_)
        ));
    }

    #[test]
    fn empty_payload_gives_empty_series() {
        assert!(canonicalize(&RawSeries::new()).unwrap().is_empty());
    }
}
