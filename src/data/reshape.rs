use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

use crate::data::blocks::Block;
use crate::data::parser::RawTable;

pub const SLOTS_PER_DAY: usize = 48;

/// Half-hour slot labels in day order.
pub const TIME_LABELS: [&str; SLOTS_PER_DAY] = [
    "00:00", "00:30", "01:00", "01:30", "02:00", "02:30", "03:00", "03:30", "04:00", "04:30",
    "05:00", "05:30", "06:00", "06:30", "07:00", "07:30", "08:00", "08:30", "09:00", "09:30",
    "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "13:00", "13:30", "14:00", "14:30",
    "15:00", "15:30", "16:00", "16:30", "17:00", "17:30", "18:00", "18:30", "19:00", "19:30",
    "20:00", "20:30", "21:00", "21:30", "22:00", "22:30", "23:00", "23:30",
];

/// Record type of an interval data row.
pub const INTERVAL_RECORD: i64 = 300;

const DATE_COLUMN: usize = 1;
const FIRST_SLOT_COLUMN: usize = 2;

/// Start time of a slot, `None` past the end of the day.
pub fn slot_time(slot: usize) -> Option<NaiveTime> {
    if slot >= SLOTS_PER_DAY {
        return None;
    }
    NaiveTime::from_hms_opt((slot / 2) as u32, ((slot % 2) * 30) as u32, 0)
}

/// Slot index of a label such as `"13:30"`.
pub fn slot_index(label: &str) -> Option<usize> {
    TIME_LABELS.iter().position(|l| *l == label)
}

/// One meter-read day: record code, date, 48 slot values and any trailing
/// columns kept verbatim. `slots` always holds `SLOTS_PER_DAY` entries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReshapedRow {
    pub source_row: usize,
    pub record: String,
    pub date: NaiveDate,
    pub slots: Vec<Option<f64>>,
    pub extras: Vec<String>,
}

impl ReshapedRow {
    pub fn observed(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }
}

/// Rows and cells that were dropped while reshaping. `rows` and `cells`
/// are unreadable data; `non_interval` counts the 400/500/900 records that
/// sit inside a block in every well-formed file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub rows: usize,
    pub cells: usize,
    pub non_interval: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ReshapedBlock {
    pub rows: Vec<ReshapedRow>,
    pub skipped: Skipped,
}

/// Parse an 8-digit `YYYYMMDD` date.
pub fn parse_date(cell: &str) -> Option<NaiveDate> {
    let cell = cell.trim();
    if cell.len() != 8 || !cell.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(cell, "%Y%m%d").ok()
}

/// Parse an interval cell. Blank is plain missing; anything else that is
/// not a finite number is a skipped cell.
fn parse_value(cell: &str) -> Result<Option<f64>, ()> {
    let cell = cell.trim();
    if cell.is_empty() {
        return Ok(None);
    }
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(()),
    }
}

/// Turn a block's raw rows into dated rows of 48 half-hour values.
pub fn reshape(table: &RawTable, block: &Block) -> ReshapedBlock {
    let mut out = ReshapedBlock::default();

    for idx in block.rows() {
        let Some(row) = table.row(idx) else { break };
        let record = table.record_type(idx);
        if record != Some(INTERVAL_RECORD) {
            tracing::debug!(channel = %block.channel, row = idx, record = ?record, "Ignoring non-interval record");
            out.skipped.non_interval += 1;
            continue;
        }

        let date_cell = row.get(DATE_COLUMN).map(String::as_str).unwrap_or("");
        let Some(date) = parse_date(date_cell) else {
            tracing::debug!(channel = %block.channel, row = idx, date = date_cell, "Skipping row without a valid date");
            out.skipped.rows += 1;
            continue;
        };

        let mut slots = vec![None; SLOTS_PER_DAY];
        for (slot, value) in slots.iter_mut().enumerate() {
            let Some(cell) = row.get(FIRST_SLOT_COLUMN + slot) else { break };
            match parse_value(cell) {
                Ok(v) => *value = v,
                Err(()) => {
                    tracing::debug!(channel = %block.channel, row = idx, slot = TIME_LABELS[slot], cell = %cell, "Unparseable interval value");
                    out.skipped.cells += 1;
                }
            }
        }

        out.rows.push(ReshapedRow {
            source_row: idx,
            record: row[0].clone(),
            date,
            slots,
            extras: row
                .iter()
                .skip(FIRST_SLOT_COLUMN + SLOTS_PER_DAY)
                .cloned()
                .collect(),
        });
    }

    if out.skipped.rows > 0 || out.skipped.cells > 0 {
        tracing::warn!(
            channel = %block.channel,
            rows = out.skipped.rows,
            cells = out.skipped.cells,
            "Skipped unparseable rows and cells"
        );
    }
    out
}
