use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use crate::data::blocks::{self, Block, BlockStrategy, Channel, Classification};
use crate::data::parser::RawTable;
use crate::data::reshape::{self, Skipped};
use crate::engine::analyzer::{
    self, DailyTotal, DayType, PeriodLevel, Profile, Season, TimeOfDayPoint,
};
use crate::engine::forecast::{self, Forecast, ForecastUnavailable};
use crate::engine::outliers::{self, Outlier};
use crate::engine::series::{self, DailySeries, LongSeries};
use crate::error::Result;

/// Everything derived for one channel.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelAnalysis {
    pub channel: Channel,
    /// Raw row of the 200 record that opened this channel.
    pub header_row: usize,
    pub block: Block,
    pub skipped: Skipped,
    pub daily: DailySeries,
    pub long: LongSeries,
    pub time_of_day: Vec<TimeOfDayPoint>,
    pub daily_totals: Vec<DailyTotal>,
    pub seasonal: Vec<Profile<Season>>,
    pub day_type: Vec<Profile<DayType>>,
    pub period_levels: Vec<PeriodLevel>,
    pub peak_interval: Option<&'static str>,
    pub outliers: Vec<Outlier>,
    #[serde(serialize_with = "forecast_outcome")]
    pub forecast: std::result::Result<Forecast, ForecastUnavailable>,
}

impl ChannelAnalysis {
    pub fn total(&self) -> f64 {
        self.daily.grand_total()
    }
}

fn forecast_outcome<S: Serializer>(
    outcome: &std::result::Result<Forecast, ForecastUnavailable>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    #[serde(tag = "status", rename_all = "snake_case")]
    enum Outcome<'a> {
        Available { forecast: &'a Forecast },
        Unavailable {
            reason: &'a ForecastUnavailable,
            message: String,
        },
    }

    match outcome {
        Ok(forecast) => Outcome::Available { forecast },
        Err(reason) => Outcome::Unavailable {
            reason,
            message: reason.to_string(),
        },
    }
    .serialize(serializer)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergySummary {
    pub total_consumption: f64,
    pub total_generation: f64,
    /// Consumption minus generation.
    pub net: f64,
    pub consumption_peak: Option<&'static str>,
    pub generation_peak: Option<&'static str>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub classification: Classification,
    pub summary: EnergySummary,
    pub consumption: ChannelAnalysis,
    pub generation: ChannelAnalysis,
}

impl Dashboard {
    pub fn channel(&self, channel: Channel) -> &ChannelAnalysis {
        match channel {
            Channel::Consumption => &self.consumption,
            Channel::Generation => &self.generation,
        }
    }
}

fn analyze_channel(
    table: &RawTable,
    classification: Classification,
    block: Block,
) -> ChannelAnalysis {
    let reshaped = reshape::reshape(table, &block);
    let (daily, long) = series::build(&reshaped);

    let time_of_day = analyzer::time_of_day_average(&long);
    let totals: Vec<(NaiveDate, f64)> = daily.totals_by_date().into_iter().collect();
    let outliers = outliers::detect(&totals);
    let forecast = forecast::forecast(&totals);
    if let Err(e) = &forecast {
        tracing::warn!(channel = %block.channel, error = %e, "Forecast unavailable");
    }

    tracing::info!(
        channel = %block.channel,
        rows = block.len(),
        days = daily.len(),
        readings = long.len(),
        outliers = outliers.len(),
        "Analysed channel"
    );

    ChannelAnalysis {
        channel: block.channel,
        header_row: classification.header_row(block.channel),
        block,
        skipped: reshaped.skipped,
        daily_totals: analyzer::daily_totals(&daily),
        seasonal: analyzer::seasonal_profile(&long),
        day_type: analyzer::day_type_profile(&long),
        period_levels: analyzer::period_levels(&time_of_day),
        peak_interval: analyzer::peak_interval(&time_of_day),
        time_of_day,
        outliers,
        forecast,
        daily,
        long,
    }
}

/// Run the full computation over a loaded table. Fails only when the
/// consumption and generation blocks cannot be located.
pub fn analyze(table: &RawTable, strategy: &BlockStrategy) -> Result<Dashboard> {
    let pair = blocks::locate(table, strategy)?;
    let consumption = analyze_channel(table, pair.classification, pair.consumption);
    let generation = analyze_channel(table, pair.classification, pair.generation);

    let dates = consumption
        .daily_totals
        .iter()
        .chain(&generation.daily_totals)
        .map(|d| d.date);
    let first_date = dates.clone().min();
    let last_date = dates.max();

    let total_consumption = consumption.total();
    let total_generation = generation.total();

    Ok(Dashboard {
        classification: pair.classification,
        summary: EnergySummary {
            total_consumption,
            total_generation,
            net: total_consumption - total_generation,
            consumption_peak: consumption.peak_interval,
            generation_peak: generation.peak_interval,
            first_date,
            last_date,
        },
        consumption,
        generation,
    })
}
