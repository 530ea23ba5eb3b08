use std::fmt;

use serde::Serialize;

use crate::data::parser::RawTable;
use crate::error::{Nem12Error, Result};

/// Record type that opens a metering block.
pub const HEADER_RECORD: i64 = 200;

/// Longest generation block sliced when no third header closes it.
pub const MAX_GENERATION_SPAN: usize = 300;

/// NMI suffix column of a NEM12 200 record.
pub const DEFAULT_TAG_COLUMN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Consumption,
    Generation,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Consumption => f.write_str("consumption"),
            Self::Generation => f.write_str("generation"),
        }
    }
}

/// How header rows are assigned to channels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BlockStrategy {
    /// First header is consumption, second is generation.
    #[default]
    Positional,
    /// Channel read from a tag column on each header row.
    Tagged {
        column: usize,
        consumption_tag: String,
        generation_tag: String,
    },
}

impl BlockStrategy {
    /// Tagged strategy with the usual NEM12 suffixes (E1 import, B1 export).
    pub fn tagged() -> Self {
        Self::Tagged {
            column: DEFAULT_TAG_COLUMN,
            consumption_tag: "E1".into(),
            generation_tag: "B1".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMarker {
    pub row: usize,
    pub tag: Option<String>,
}

/// Which header rows open each channel, resolved once per table.
/// Values are row positions in the raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Classification {
    Positional { consumption: usize, generation: usize },
    Tagged { consumption: usize, generation: usize },
}

impl Classification {
    /// Raw row of the 200 record that opens `channel`.
    pub fn header_row(&self, channel: Channel) -> usize {
        match (*self, channel) {
            (Self::Positional { consumption, .. }, Channel::Consumption)
            | (Self::Tagged { consumption, .. }, Channel::Consumption) => consumption,
            (Self::Positional { generation, .. }, Channel::Generation)
            | (Self::Tagged { generation, .. }, Channel::Generation) => generation,
        }
    }
}

/// Half-open row range `[start, end)` of one channel in the raw table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Block {
    pub channel: Channel,
    pub start: usize,
    pub end: usize,
}

impl Block {
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockPair {
    pub classification: Classification,
    pub consumption: Block,
    pub generation: Block,
}

/// Collect header markers, reading the tag column when one is configured.
pub fn header_markers(table: &RawTable, tag_column: Option<usize>) -> Vec<HeaderMarker> {
    table
        .rows_with_record(HEADER_RECORD)
        .map(|row| HeaderMarker {
            row,
            tag: tag_column
                .and_then(|col| table.cell(row, col))
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        })
        .collect()
}

pub fn classify(markers: &[HeaderMarker], strategy: &BlockStrategy) -> Result<Classification> {
    if markers.len() < 2 {
        return Err(Nem12Error::InsufficientHeaders {
            found: markers.len(),
        });
    }

    match strategy {
        BlockStrategy::Positional => Ok(Classification::Positional {
            consumption: markers[0].row,
            generation: markers[1].row,
        }),
        BlockStrategy::Tagged {
            column,
            consumption_tag,
            generation_tag,
        } => Ok(Classification::Tagged {
            consumption: tagged_row(markers, Channel::Consumption, consumption_tag, *column)?,
            generation: tagged_row(markers, Channel::Generation, generation_tag, *column)?,
        }),
    }
}

fn tagged_row(markers: &[HeaderMarker], channel: Channel, tag: &str, column: usize) -> Result<usize> {
    let rows: Vec<usize> = markers
        .iter()
        .filter(|m| m.tag.as_deref() == Some(tag))
        .map(|m| m.row)
        .collect();
    match rows.as_slice() {
        [] => Err(Nem12Error::MissingChannelTag {
            channel,
            tag: tag.to_string(),
            column,
        }),
        [row] => Ok(*row),
        _ => Err(Nem12Error::DuplicateChannelTag {
            channel,
            tag: tag.to_string(),
            rows,
        }),
    }
}

/// Locate the consumption and generation blocks of a table.
pub fn locate(table: &RawTable, strategy: &BlockStrategy) -> Result<BlockPair> {
    let tag_column = match strategy {
        BlockStrategy::Positional => None,
        BlockStrategy::Tagged { column, .. } => Some(*column),
    };
    let markers = header_markers(table, tag_column);
    let classification = classify(&markers, strategy)?;
    let total = table.len();

    let next_header = |after: usize| markers.iter().map(|m| m.row).find(|&r| r > after);

    let (consumption, generation) = match classification {
        Classification::Positional {
            consumption,
            generation,
        } => {
            let gen_end = next_header(generation)
                .unwrap_or_else(|| (generation + 1 + MAX_GENERATION_SPAN).min(total));
            (
                Block {
                    channel: Channel::Consumption,
                    start: consumption + 1,
                    end: generation,
                },
                Block {
                    channel: Channel::Generation,
                    start: generation + 1,
                    end: gen_end,
                },
            )
        }
        Classification::Tagged {
            consumption,
            generation,
        } => (
            Block {
                channel: Channel::Consumption,
                start: consumption + 1,
                end: next_header(consumption).unwrap_or(total),
            },
            Block {
                channel: Channel::Generation,
                start: generation + 1,
                end: next_header(generation).unwrap_or(total),
            },
        ),
    };

    tracing::info!(
        headers = markers.len(),
        consumption = ?consumption.rows(),
        generation = ?generation.rows(),
        "Located metering blocks"
    );

    Ok(BlockPair {
        classification,
        consumption,
        generation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with_headers(len: usize, headers: &[(usize, &str)]) -> RawTable {
        let rows = (0..len)
            .map(|i| match headers.iter().find(|(r, _)| *r == i) {
                Some((_, tag)) => vec![
                    "200".to_string(),
                    "NMI0001".into(),
                    "E1B1".into(),
                    "1".into(),
                    tag.to_string(),
                ],
                None => vec!["300".to_string(), "20240101".into()],
            })
            .collect();
        RawTable::from_rows(rows).unwrap()
    }

    #[test]
    fn positional_blocks_end_at_next_header() {
        let table = table_with_headers(150, &[(0, "E1"), (50, "B1"), (100, "E2")]);
        let pair = locate(&table, &BlockStrategy::Positional).unwrap();

        assert_eq!(pair.consumption.rows(), 1..50);
        assert_eq!(pair.generation.rows(), 51..100);
        assert_eq!(
            pair.classification,
            Classification::Positional {
                consumption: 0,
                generation: 50
            }
        );
    }

    #[test]
    fn positional_generation_capped_without_third_header() {
        let table = table_with_headers(500, &[(0, "E1"), (10, "B1")]);
        let pair = locate(&table, &BlockStrategy::Positional).unwrap();
        assert_eq!(pair.generation.rows(), 11..311);

        let short = table_with_headers(40, &[(0, "E1"), (10, "B1")]);
        let pair = locate(&short, &BlockStrategy::Positional).unwrap();
        assert_eq!(pair.generation.rows(), 11..40);
    }

    #[test]
    fn single_header_is_insufficient() {
        let table = table_with_headers(20, &[(0, "E1")]);
        let err = locate(&table, &BlockStrategy::Positional).unwrap_err();
        assert!(matches!(err, Nem12Error::InsufficientHeaders { found: 1 }));
    }

    #[test]
    fn tagged_blocks_follow_tags_not_order() {
        let table = table_with_headers(30, &[(0, "B1"), (12, "E1"), (20, "Q1")]);
        let pair = locate(&table, &BlockStrategy::tagged()).unwrap();

        assert_eq!(pair.consumption.rows(), 13..20);
        assert_eq!(pair.generation.rows(), 1..12);
        assert_eq!(pair.classification.header_row(Channel::Consumption), 12);
        assert_eq!(pair.classification.header_row(Channel::Generation), 0);
    }

    #[test]
    fn tagged_last_block_runs_to_end_of_table() {
        let table = table_with_headers(25, &[(0, "E1"), (10, "B1")]);
        let pair = locate(&table, &BlockStrategy::tagged()).unwrap();
        assert_eq!(pair.generation.rows(), 11..25);
        assert_eq!(pair.generation.len(), 14);
    }

    #[test]
    fn tagged_missing_channel() {
        let table = table_with_headers(25, &[(0, "E1"), (10, "E2")]);
        let err = locate(&table, &BlockStrategy::tagged()).unwrap_err();
        match err {
            Nem12Error::MissingChannelTag { channel, tag, column } => {
                assert_eq!(channel, Channel::Generation);
                assert_eq!(tag, "B1");
                assert_eq!(column, DEFAULT_TAG_COLUMN);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tagged_duplicate_channel() {
        let table = table_with_headers(30, &[(0, "E1"), (10, "B1"), (20, "E1")]);
        let err = locate(&table, &BlockStrategy::tagged()).unwrap_err();
        assert!(matches!(
            err,
            Nem12Error::DuplicateChannelTag { channel: Channel::Consumption, .. }
        ));
    }
}
