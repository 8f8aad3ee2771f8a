use chrono::{Datelike, Days, NaiveDate, Weekday};

use super::market::{MarketDataError, PriceSeries};

fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Align raw daily observations to a Monday to Friday calendar.
///
/// Observations are sorted by date, a repeated date keeps its last value and
/// weekend observations are dropped. The result covers every business day
/// from the first to the last remaining observation, carrying the previous
/// close forward over gaps (holidays, missing bars).
pub fn align_business_days(
    observations: &[(NaiveDate, f64)],
) -> Result<PriceSeries, MarketDataError> {
    let mut obs: Vec<(NaiveDate, f64)> = observations
        .iter()
        .copied()
        .filter(|&(date, _)| is_business_day(date))
        .collect();

    // Stable sort keeps provider order among equal dates; the last one wins
    obs.sort_by_key(|&(date, _)| date);
    let mut deduped: Vec<(NaiveDate, f64)> = Vec::with_capacity(obs.len());
    for (date, close) in obs {
        match deduped.last_mut() {
            Some(last) if last.0 == date => last.1 = close,
            _ => deduped.push((date, close)),
        }
    }

    let (first, last) = match (deduped.first(), deduped.last()) {
        (Some(f), Some(l)) => (f.0, l.0),
        _ => return Err(MarketDataError::Empty),
    };

    let mut dates = Vec::new();
    let mut closes = Vec::new();
    let mut source = deduped.iter().peekable();
    let mut current = deduped[0].1;
    let mut day = first;

    while day <= last {
        if is_business_day(day) {
            while let Some(&&(date, close)) = source.peek() {
                if date > day {
                    break;
                }
                current = close;
                source.next();
            }
            dates.push(day);
            closes.push(current);
        }
        day = match day.checked_add_days(Days::new(1)) {
            Some(next) => next,
            None => break,
        };
    }

    PriceSeries::new(dates, closes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_forward_fills_holiday() {
        // 2020-01-01 (Wed) missing, Fri 3rd present, Mon 6th present
        let obs = vec![
            (d(2019, 12, 31), 10.0),
            (d(2020, 1, 2), 11.0),
            (d(2020, 1, 6), 12.0),
        ];
        let series = align_business_days(&obs).unwrap();

        assert_eq!(
            series.dates(),
            &[d(2019, 12, 31), d(2020, 1, 1), d(2020, 1, 2), d(2020, 1, 3), d(2020, 1, 6)]
        );
        assert_eq!(series.closes(), &[10.0, 10.0, 11.0, 11.0, 12.0]);
    }

    #[test]
    fn test_drops_weekends_and_sorts() {
        let obs = vec![
            (d(2020, 1, 7), 3.0),
            (d(2020, 1, 4), 99.0), // Saturday
            (d(2020, 1, 6), 2.0),
        ];
        let series = align_business_days(&obs).unwrap();

        assert_eq!(series.dates(), &[d(2020, 1, 6), d(2020, 1, 7)]);
        assert_eq!(series.closes(), &[2.0, 3.0]);
    }

    #[test]
    fn test_duplicate_keeps_last() {
        let obs = vec![(d(2020, 1, 6), 2.0), (d(2020, 1, 6), 2.5)];
        let series = align_business_days(&obs).unwrap();
        assert_eq!(series.closes(), &[2.5]);
    }

    #[test]
    fn test_no_business_days_is_empty() {
        assert!(matches!(align_business_days(&[]), Err(MarketDataError::Empty)));
        let weekend_only = vec![(d(2020, 1, 4), 1.0), (d(2020, 1, 5), 1.0)];
        assert!(matches!(
            align_business_days(&weekend_only),
            Err(MarketDataError::Empty)
        ));
    }
}
