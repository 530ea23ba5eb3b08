//! ARIMA(1,1,1) forecast of daily totals.
//!
//! Fitting and projection are done by `anofox_forecast`; this module guards
//! the input, maps dates to timestamps and dates the projected values.

use anofox_forecast::core::TimeSeries;
use anofox_forecast::models::arima::ARIMA;
use anofox_forecast::models::Forecaster;
use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use thiserror::Error;

/// Days projected past the last observed date.
pub const HORIZON: usize = 7;

/// Shortest daily series the model is fitted on.
pub const MIN_OBSERVATIONS: usize = 10;

pub const ORDER: (usize, usize, usize) = (1, 1, 1);

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ForecastUnavailable {
    #[error("need at least {required} daily totals, got {observations}")]
    TooShort { observations: usize, required: usize },

    #[error("daily totals are constant or contain non-finite values")]
    Degenerate,

    #[error("model fit failed: {message}")]
    Fit { message: String },

    #[error("model fit produced non-finite values")]
    NonFinite,

    #[error("forecast dates run past the supported calendar")]
    DateOverflow,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// `(p, d, q)` of the fitted model.
    pub order: (usize, usize, usize),
    pub observations: usize,
    pub points: Vec<ForecastPoint>,
}

fn check_input(values: &[f64]) -> Result<(), ForecastUnavailable> {
    if values.len() < MIN_OBSERVATIONS {
        return Err(ForecastUnavailable::TooShort {
            observations: values.len(),
            required: MIN_OBSERVATIONS,
        });
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(ForecastUnavailable::Degenerate);
    }
    let (lo, hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if hi - lo == 0.0 {
        return Err(ForecastUnavailable::Degenerate);
    }
    Ok(())
}

fn fit_failed(e: impl std::fmt::Display) -> ForecastUnavailable {
    ForecastUnavailable::Fit {
        message: e.to_string(),
    }
}

/// Fit on chronologically ordered daily totals and project `HORIZON` days
/// after the last date. Gaps between dates are not filled.
pub fn forecast(totals: &[(NaiveDate, f64)]) -> Result<Forecast, ForecastUnavailable> {
    let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();
    check_input(&values)?;
    let Some(&(last_date, _)) = totals.last() else {
        return Err(ForecastUnavailable::TooShort {
            observations: 0,
            required: MIN_OBSERVATIONS,
        });
    };

    let timestamps = totals
        .iter()
        .map(|(date, _)| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
        .collect();
    let series = TimeSeries::univariate(timestamps, values).map_err(fit_failed)?;

    let (p, d, q) = ORDER;
    let mut model = ARIMA::new(p, d, q);
    model.fit(&series).map_err(fit_failed)?;
    let predicted = model.predict(HORIZON).map_err(fit_failed)?;
    let projected = predicted.primary();
    if projected.len() != HORIZON {
        return Err(fit_failed(format!(
            "expected {HORIZON} projected values, got {}",
            projected.len()
        )));
    }

    let mut date = last_date;
    let mut points = Vec::with_capacity(HORIZON);
    for &value in projected.iter() {
        if !value.is_finite() {
            return Err(ForecastUnavailable::NonFinite);
        }
        date = date.succ_opt().ok_or(ForecastUnavailable::DateOverflow)?;
        points.push(ForecastPoint { date, value });
    }

    tracing::debug!(observations = totals.len(), first = points[0].value, "Fitted ARIMA(1,1,1)");

    Ok(Forecast {
        order: ORDER,
        observations: totals.len(),
        points,
    })
}
