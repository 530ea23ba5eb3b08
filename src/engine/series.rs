use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::data::reshape::{slot_time, ReshapedBlock, TIME_LABELS};

/// One day in wide form. Missing slots are left out of both the total and
/// the average; a day with no observed slot has a total of 0 and no average.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub slots: Vec<Option<f64>>,
    pub daily_total: f64,
    pub daily_average: Option<f64>,
    pub observed_slots: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySeries {
    pub rows: Vec<DailyRow>,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Daily totals keyed by date, ascending. Repeated dates are summed.
    pub fn totals_by_date(&self) -> BTreeMap<NaiveDate, f64> {
        let mut totals = BTreeMap::new();
        for row in &self.rows {
            *totals.entry(row.date).or_insert(0.0) += row.daily_total;
        }
        totals
    }

    pub fn grand_total(&self) -> f64 {
        self.rows.iter().map(|r| r.daily_total).sum()
    }
}

/// One observed half-hour reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRow {
    pub date: NaiveDate,
    pub slot: usize,
    pub time: &'static str,
    pub timestamp: NaiveDateTime,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LongSeries {
    pub rows: Vec<LongRow>,
}

impl LongSeries {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build the wide per-day table and the long (date, time, value) series.
pub fn build(block: &ReshapedBlock) -> (DailySeries, LongSeries) {
    let mut daily = DailySeries::default();
    let mut long = LongSeries::default();

    for row in &block.rows {
        let mut total = 0.0;
        let mut observed = 0usize;
        for (slot, value) in row.observed() {
            total += value;
            observed += 1;

            if let Some(time) = slot_time(slot) {
                long.rows.push(LongRow {
                    date: row.date,
                    slot,
                    time: TIME_LABELS[slot],
                    timestamp: row.date.and_time(time),
                    value,
                });
            }
        }

        daily.rows.push(DailyRow {
            date: row.date,
            slots: row.slots.clone(),
            daily_total: total,
            daily_average: (observed > 0).then(|| total / observed as f64),
            observed_slots: observed,
        });
    }

    (daily, long)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reshape::{ReshapedRow, SLOTS_PER_DAY};

    fn row(date: NaiveDate, slots: Vec<Option<f64>>) -> ReshapedRow {
        ReshapedRow {
            source_row: 0,
            record: "300".into(),
            date,
            slots,
            extras: Vec::new(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn totals_and_averages_skip_missing() {
        let mut slots = vec![None; SLOTS_PER_DAY];
        slots[0] = Some(1.0);
        slots[1] = Some(2.0);
        slots[47] = Some(3.0);
        let block = ReshapedBlock {
            rows: vec![row(date(1), slots)],
            ..Default::default()
        };

        let (daily, long) = build(&block);
        let day = &daily.rows[0];
        assert_eq!(day.daily_total, 6.0);
        assert_eq!(day.daily_average, Some(2.0));
        assert_eq!(day.observed_slots, 3);

        assert_eq!(long.len(), 3);
        assert_eq!(long.rows[2].time, "23:30");
        assert_eq!(
            long.rows[2].timestamp,
            date(1).and_hms_opt(23, 30, 0).unwrap()
        );
    }

    #[test]
    fn day_without_readings_keeps_zero_total() {
        let block = ReshapedBlock {
            rows: vec![row(date(2), vec![None; SLOTS_PER_DAY])],
            ..Default::default()
        };
        let (daily, long) = build(&block);
        assert_eq!(daily.rows[0].daily_total, 0.0);
        assert_eq!(daily.rows[0].daily_average, None);
        assert!(long.is_empty());
    }

    #[test]
    fn long_rows_sum_to_daily_totals() {
        let rows = (1..=5)
            .map(|d| {
                let slots = (0..SLOTS_PER_DAY)
                    .map(|s| (s % 3 != 0).then(|| (d * 10 + s as u32) as f64 * 0.01))
                    .collect();
                row(date(d), slots)
            })
            .collect();
        let block = ReshapedBlock {
            rows,
            ..Default::default()
        };

        let (daily, long) = build(&block);
        for day in &daily.rows {
            let summed: f64 = long
                .rows
                .iter()
                .filter(|r| r.date == day.date)
                .map(|r| r.value)
                .sum();
            assert!((summed - day.daily_total).abs() < 1e-9);
        }
    }

    #[test]
    fn totals_by_date_sorts_and_merges() {
        let one = |d: NaiveDate, v: f64| {
            let mut slots = vec![None; SLOTS_PER_DAY];
            slots[0] = Some(v);
            row(d, slots)
        };
        let block = ReshapedBlock {
            rows: vec![one(date(3), 1.0), one(date(1), 2.0), one(date(3), 4.0)],
            ..Default::default()
        };
        let (daily, _) = build(&block);
        let totals: Vec<_> = daily.totals_by_date().into_iter().collect();
        assert_eq!(totals, vec![(date(1), 2.0), (date(3), 5.0)]);
        assert_eq!(daily.grand_total(), 7.0);
    }

    #[test]
    fn empty_block_gives_empty_series() {
        let (daily, long) = build(&ReshapedBlock::default());
        assert!(daily.is_empty());
        assert!(long.is_empty());
    }
}
