use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::data::reshape::{slot_index, SLOTS_PER_DAY, TIME_LABELS};
use crate::engine::series::{DailySeries, LongSeries};

/// Southern-hemisphere meteorological seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Season {
    Summer,
    Autumn,
    Winter,
    Spring,
}

impl Season {
    pub fn from_month(month: u32) -> Self {
        match month {
            12 | 1 | 2 => Self::Summer,
            3..=5 => Self::Autumn,
            6..=8 => Self::Winter,
            _ => Self::Spring,
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum DayType {
    Weekday,
    Weekend,
}

impl DayType {
    pub fn of(date: NaiveDate) -> Self {
        match date.weekday() {
            Weekday::Sat | Weekday::Sun => Self::Weekend,
            _ => Self::Weekday,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Mean {
    sum: f64,
    count: usize,
}

impl Mean {
    fn add(&mut self, v: f64) {
        self.sum += v;
        self.count += 1;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Mean reading at one half-hour slot. `value` is `None` when no day had a
/// reading there.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOfDayPoint {
    pub time: &'static str,
    pub value: Option<f64>,
    pub observations: usize,
}

fn points(acc: &[Mean; SLOTS_PER_DAY]) -> Vec<TimeOfDayPoint> {
    acc.iter()
        .zip(TIME_LABELS)
        .map(|(m, time)| TimeOfDayPoint {
            time,
            value: m.value(),
            observations: m.count,
        })
        .collect()
}

/// Mean per half-hour slot across all days, always 48 entries in day order.
pub fn time_of_day_average(long: &LongSeries) -> Vec<TimeOfDayPoint> {
    let mut acc = [Mean::default(); SLOTS_PER_DAY];
    for r in &long.rows {
        acc[r.slot].add(r.value);
    }
    points(&acc)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub total: f64,
    pub day_type: DayType,
}

pub fn daily_totals(daily: &DailySeries) -> Vec<DailyTotal> {
    daily
        .totals_by_date()
        .into_iter()
        .map(|(date, total)| DailyTotal {
            date,
            total,
            day_type: DayType::of(date),
        })
        .collect()
}

/// Time-of-day curve for one group of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile<K> {
    pub group: K,
    pub points: Vec<TimeOfDayPoint>,
}

fn profile_by<K, F>(long: &LongSeries, key: F) -> Vec<Profile<K>>
where
    K: Ord + Copy,
    F: Fn(NaiveDate) -> K,
{
    let mut groups: BTreeMap<K, [Mean; SLOTS_PER_DAY]> = BTreeMap::new();
    for r in &long.rows {
        groups
            .entry(key(r.date))
            .or_insert([Mean::default(); SLOTS_PER_DAY])[r.slot]
            .add(r.value);
    }
    groups
        .into_iter()
        .map(|(group, acc)| Profile {
            group,
            points: points(&acc),
        })
        .collect()
}

/// Time-of-day means per season, for seasons that have readings.
pub fn seasonal_profile(long: &LongSeries) -> Vec<Profile<Season>> {
    profile_by(long, Season::of)
}

/// Time-of-day means for weekdays and weekends.
pub fn day_type_profile(long: &LongSeries) -> Vec<Profile<DayType>> {
    profile_by(long, DayType::of)
}

/// Slot with the highest mean; the earliest slot wins a tie.
pub fn peak_interval(tod: &[TimeOfDayPoint]) -> Option<&'static str> {
    let mut best: Option<(&'static str, f64)> = None;
    for p in tod {
        if let Some(v) = p.value {
            if best.map_or(true, |(_, b)| v > b) {
                best = Some((p.time, v));
            }
        }
    }
    best.map(|(time, _)| time)
}

/// Time-of-use bands as `(name, start, end)`; `end` of `None` means midnight.
pub const TOU_PERIODS: [(&str, &str, Option<&str>); 5] = [
    ("Overnight", "00:00", Some("05:00")),
    ("Morning", "05:00", Some("08:00")),
    ("Day", "08:00", Some("16:00")),
    ("Evening", "16:00", Some("22:00")),
    ("Late", "22:00", None),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodLevel {
    pub name: &'static str,
    pub start: &'static str,
    pub end: &'static str,
    pub level: Option<f64>,
}

/// Mean of the slot averages inside each time-of-use band.
pub fn period_levels(tod: &[TimeOfDayPoint]) -> Vec<PeriodLevel> {
    TOU_PERIODS
        .iter()
        .map(|&(name, start, end)| {
            let from = slot_index(start).unwrap_or(0);
            let to = end.and_then(slot_index).unwrap_or(SLOTS_PER_DAY);
            let mut mean = Mean::default();
            for v in tod.iter().skip(from).take(to.saturating_sub(from)).filter_map(|p| p.value) {
                mean.add(v);
            }
            PeriodLevel {
                name,
                start,
                end: end.unwrap_or("24:00"),
                level: mean.value(),
            }
        })
        .collect()
}
