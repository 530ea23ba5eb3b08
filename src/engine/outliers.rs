use chrono::NaiveDate;
use serde::Serialize;

/// Days further than this many sample standard deviations from the mean
/// are flagged.
pub const Z_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub date: NaiveDate,
    pub value: f64,
    pub z_score: f64,
}

/// Sample mean and standard deviation (n - 1 denominator).
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    Some((mean, var.sqrt()))
}

/// Flag days whose total has `|z| > Z_THRESHOLD`. Fewer than two days or a
/// zero spread flags nothing.
pub fn detect(totals: &[(NaiveDate, f64)]) -> Vec<Outlier> {
    let values: Vec<f64> = totals.iter().map(|(_, v)| *v).collect();
    let Some((mean, std)) = mean_and_std(&values) else {
        return Vec::new();
    };
    if std == 0.0 || !std.is_finite() {
        return Vec::new();
    }

    let outliers: Vec<Outlier> = totals
        .iter()
        .filter_map(|&(date, value)| {
            let z = (value - mean) / std;
            (z.abs() > Z_THRESHOLD).then_some(Outlier {
                date,
                value,
                z_score: z,
            })
        })
        .collect();

    tracing::debug!(days = totals.len(), mean, std, flagged = outliers.len(), "Outlier scan");
    outliers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Vec<(NaiveDate, f64)> {
        let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + chrono::Days::new(i as u64), *v))
            .collect()
    }

    #[test]
    fn flags_single_spike() {
        let mut values = vec![10.0; 20];
        values.push(100.0);
        let found = detect(&series(&values));

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].value, 100.0);
        assert_eq!(found[0].date, NaiveDate::from_ymd_opt(2024, 2, 21).unwrap());
        assert!(found[0].z_score > 4.0);
    }

    #[test]
    fn five_day_spike_stays_under_threshold() {
        // With n = 5 the largest possible sample z-score is (n - 1) / sqrt(n).
        let found = detect(&series(&[10.0, 10.0, 10.0, 10.0, 100.0]));
        assert!(found.is_empty());
    }

    #[test]
    fn flags_low_days_too() {
        let mut values: Vec<f64> = (0..30).map(|i| 50.0 + (i % 3) as f64).collect();
        values[7] = 0.0;
        let found = detect(&series(&values));
        assert_eq!(found.len(), 1);
        assert!(found[0].z_score < -3.0);
    }

    #[test]
    fn constant_or_short_series_flags_nothing() {
        assert!(detect(&series(&[5.0; 30])).is_empty());
        assert!(detect(&series(&[5.0])).is_empty());
        assert!(detect(&[]).is_empty());
    }

    #[test]
    fn sample_statistics() {
        let (mean, std) = mean_and_std(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!((mean - 3.0).abs() < 1e-12);
        assert!((std - 1.5811388300841898).abs() < 1e-12);
    }
}
