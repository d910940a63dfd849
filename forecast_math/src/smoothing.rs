//! Exponential smoothing implementations
//!
//! Contains the additive Holt-Winters method (triple exponential smoothing):
//! level, trend and one additive seasonal offset per position in the cycle.

use crate::{MathError, Result};

/// Additive Holt-Winters smoothing
///
/// Observations are fed one at a time with [`HoltWinters::update`] after the
/// initial states have been estimated from the first two seasons. The
/// seasonal offsets are indexed by observation position modulo the period.
#[derive(Debug, Clone)]
pub struct HoltWinters {
    alpha: f64,
    beta: f64,
    gamma: f64,
    period: usize,
    level: Option<f64>,
    trend: Option<f64>,
    seasonals: Vec<f64>,
    values_seen: usize,
    sse: f64,
}

impl HoltWinters {
    /// Create a new Holt-Winters smoother with the given smoothing parameters
    pub fn new(alpha: f64, beta: f64, gamma: f64, period: usize) -> Result<Self> {
        for (name, value) in [("Alpha", alpha), ("Beta", beta), ("Gamma", gamma)] {
            if value <= 0.0 || value >= 1.0 {
                return Err(MathError::InvalidInput(format!(
                    "{} must be between 0 and 1 (exclusive)",
                    name
                )));
            }
        }
        if period < 2 {
            return Err(MathError::InvalidInput(
                "Seasonal period must be at least 2".to_string(),
            ));
        }

        Ok(Self {
            alpha,
            beta,
            gamma,
            period,
            level: None,
            trend: None,
            seasonals: Vec::new(),
            values_seen: 0,
            sse: 0.0,
        })
    }

    /// Initialise and run the recursion over `values`
    pub fn fit(alpha: f64, beta: f64, gamma: f64, period: usize, values: &[f64]) -> Result<Self> {
        let mut model = Self::new(alpha, beta, gamma, period)?;
        model.initialize(values)?;
        for &value in values {
            model.update(value)?;
        }
        Ok(model)
    }

    /// Estimate the initial level, trend and seasonal offsets
    ///
    /// Uses every complete season available (at least two). The level is
    /// placed one step before the first observation so the first update
    /// produces a genuine one-step-ahead error.
    pub fn initialize(&mut self, values: &[f64]) -> Result<()> {
        let m = self.period;
        let seasons = values.len() / m;
        if seasons < 2 {
            return Err(MathError::InsufficientData(format!(
                "Holt-Winters needs at least two full seasons ({} values), have {}",
                2 * m,
                values.len()
            )));
        }

        let season_means: Vec<f64> = (0..seasons)
            .map(|s| values[s * m..(s + 1) * m].iter().sum::<f64>() / m as f64)
            .collect();

        let trend = (season_means[1] - season_means[0]) / m as f64;
        let level = season_means[0] - trend * (m as f64 + 1.0) / 2.0;

        // Offsets are measured against the initial trend line, then centred
        let mut seasonals: Vec<f64> = (0..m)
            .map(|i| {
                (0..seasons)
                    .map(|s| {
                        let t = s * m + i;
                        values[t] - (level + trend * (t as f64 + 1.0))
                    })
                    .sum::<f64>()
                    / seasons as f64
            })
            .collect();
        let offset = seasonals.iter().sum::<f64>() / m as f64;
        for seasonal in seasonals.iter_mut() {
            *seasonal -= offset;
        }

        self.level = Some(level);
        self.trend = Some(trend);
        self.seasonals = seasonals;
        self.values_seen = 0;
        self.sse = 0.0;

        Ok(())
    }

    /// Feed the next observation, returning its one-step-ahead error
    pub fn update(&mut self, value: f64) -> Result<f64> {
        let (prev_level, prev_trend) = match (self.level, self.trend) {
            (Some(level), Some(trend)) => (level, trend),
            _ => {
                return Err(MathError::CalculationError(
                    "Holt-Winters must be initialized before updating".to_string(),
                ))
            }
        };

        let slot = self.values_seen % self.period;
        let prev_seasonal = self.seasonals[slot];

        let error = value - (prev_level + prev_trend + prev_seasonal);

        let new_level =
            self.alpha * (value - prev_seasonal) + (1.0 - self.alpha) * (prev_level + prev_trend);
        let new_trend = self.beta * (new_level - prev_level) + (1.0 - self.beta) * prev_trend;
        let new_seasonal =
            self.gamma * (value - new_level) + (1.0 - self.gamma) * prev_seasonal;

        if !(new_level.is_finite() && new_trend.is_finite() && new_seasonal.is_finite()) {
            return Err(MathError::CalculationError(
                "Holt-Winters state diverged".to_string(),
            ));
        }

        self.level = Some(new_level);
        self.trend = Some(new_trend);
        self.seasonals[slot] = new_seasonal;
        self.values_seen += 1;
        self.sse += error * error;

        Ok(error)
    }

    /// Forecast `h` steps (h >= 1) past the last observation
    pub fn forecast(&self, h: usize) -> Result<f64> {
        if h == 0 {
            return Err(MathError::InvalidInput(
                "Forecast step must be at least 1".to_string(),
            ));
        }

        match (self.level, self.trend) {
            (Some(level), Some(trend)) => {
                let slot = (self.values_seen + h - 1) % self.period;
                Ok(level + h as f64 * trend + self.seasonals[slot])
            }
            _ => Err(MathError::InsufficientData(
                "Not enough data to make a forecast".to_string(),
            )),
        }
    }

    /// Ratio of the h-step forecast variance to the one-step variance
    ///
    /// `1 + sum_{j=1}^{h-1} (alpha * (1 + j * beta) + gamma * (1 - alpha) * [j mod m = 0])^2`
    pub fn variance_multiplier(&self, h: usize) -> f64 {
        let mut total = 1.0;
        for j in 1..h {
            let seasonal_hit = if j % self.period == 0 {
                self.gamma * (1.0 - self.alpha)
            } else {
                0.0
            };
            let c = self.alpha * (1.0 + j as f64 * self.beta) + seasonal_hit;
            total += c * c;
        }
        total
    }

    /// Root mean squared one-step-ahead error over the fitted observations
    pub fn residual_std(&self) -> f64 {
        if self.values_seen == 0 {
            return 0.0;
        }
        (self.sse / self.values_seen as f64).sqrt()
    }

    /// Sum of squared one-step-ahead errors
    pub fn sse(&self) -> f64 {
        self.sse
    }

    /// Current level
    pub fn level(&self) -> Result<f64> {
        self.level.ok_or_else(|| {
            MathError::InsufficientData("Level not calculated yet".to_string())
        })
    }

    /// Current trend
    pub fn trend(&self) -> Result<f64> {
        self.trend.ok_or_else(|| {
            MathError::InsufficientData("Trend not calculated yet".to_string())
        })
    }

    /// Smoothing parameters `(alpha, beta, gamma)`
    pub fn parameters(&self) -> (f64, f64, f64) {
        (self.alpha, self.beta, self.gamma)
    }

    /// Seasonal period
    pub fn period(&self) -> usize {
        self.period
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weekly_pattern(weeks: usize) -> Vec<f64> {
        (0..weeks * 7)
            .map(|i| if i % 7 < 5 { 100.0 } else { 50.0 })
            .collect()
    }

    #[test]
    fn test_parameter_validation() {
        assert!(HoltWinters::new(0.0, 0.1, 0.1, 7).is_err());
        assert!(HoltWinters::new(0.3, 1.0, 0.1, 7).is_err());
        assert!(HoltWinters::new(0.3, 0.1, 0.1, 1).is_err());
        assert!(HoltWinters::new(0.3, 0.1, 0.1, 7).is_ok());
    }

    #[test]
    fn test_requires_two_seasons() {
        let mut hw = HoltWinters::new(0.3, 0.1, 0.1, 7).unwrap();
        assert!(hw.initialize(&[1.0; 13]).is_err());
        assert!(hw.initialize(&[1.0; 14]).is_ok());
        assert!(hw.update(1.0).is_ok());

        let mut fresh = HoltWinters::new(0.3, 0.1, 0.1, 7).unwrap();
        assert!(fresh.update(1.0).is_err());
        assert!(fresh.forecast(1).is_err());
    }

    #[test]
    fn test_reproduces_clean_seasonality() {
        let data = weekly_pattern(4);
        let hw = HoltWinters::fit(0.3, 0.1, 0.2, 7, &data).unwrap();

        assert!(hw.sse() < 1e-9);
        // Series length 28 is a whole number of weeks, so step h lands on slot h - 1
        for h in 1..=14 {
            let expected = if (h - 1) % 7 < 5 { 100.0 } else { 50.0 };
            assert!((hw.forecast(h).unwrap() - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_tracks_linear_trend() {
        let data: Vec<f64> = (0..21).map(|i| 10.0 + 2.0 * i as f64).collect();
        let hw = HoltWinters::fit(0.5, 0.3, 0.1, 7, &data).unwrap();

        assert!((hw.trend().unwrap() - 2.0).abs() < 1e-6);
        assert!((hw.forecast(1).unwrap() - 52.0).abs() < 1e-6);
    }

    #[test]
    fn test_variance_multiplier_grows() {
        let hw = HoltWinters::new(0.3, 0.1, 0.2, 7).unwrap();
        assert_eq!(hw.variance_multiplier(1), 1.0);
        let mut previous = 1.0;
        for h in 2..=14 {
            let current = hw.variance_multiplier(h);
            assert!(current > previous);
            previous = current;
        }
    }
}
