use crate::models::IndicatorSnapshot;

pub const RSI_PERIOD: usize = 14;
pub const MA_SHORT_PERIOD: usize = 50;
pub const MA_LONG_PERIOD: usize = 200;

pub const RSI_OVERSOLD: f64 = 30.0;
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// Simple Moving Average (SMA)
/// Returns a vector aligned with `values`:
/// - `None` until enough values exist
/// - `Some(avg)` after `window` values
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }

    // Running sum; subtract the value that falls out of the window.
    values
        .iter()
        .enumerate()
        .scan(0.0_f64, move |sum, (i, &v)| {
            *sum += v;
            if i >= window {
                *sum -= values[i - window];
            }

            let out = if i + 1 >= window {
                Some(*sum / window as f64)
            } else {
                None
            };

            Some(out)
        })
        .collect()
}

/// Running sum over a fixed window of non-negative values.
///
/// Tracks how many values in the window are non-zero so that a window of
/// zeros sums to exactly 0.0 instead of floating-point residue.
#[derive(Debug, Default)]
struct WindowSum {
    sum: f64,
    non_zero: usize,
}

impl WindowSum {
    fn push(&mut self, v: f64) {
        if v > 0.0 {
            self.sum += v;
            self.non_zero += 1;
        }
    }

    fn evict(&mut self, v: f64) {
        if v > 0.0 {
            self.sum -= v;
            self.non_zero -= 1;
        }
        if self.non_zero == 0 {
            self.sum = 0.0;
        }
    }

    fn mean(&self, window: usize) -> f64 {
        if self.non_zero == 0 {
            0.0
        } else {
            self.sum / window as f64
        }
    }
}

/// Relative Strength Index (RSI)
///
/// Average gain and average loss are plain means over the trailing `period`
/// price changes (no Wilder smoothing):
/// 1. change[i] = price[i] - price[i-1]
/// 2. gain = max(change, 0), loss = max(-change, 0)
/// 3. RS = mean(gain) / mean(loss)
/// 4. RSI = 100 - (100 / (1 + RS))
///
/// The first close has no change and counts as a zero gain and zero loss, so
/// the first value appears at index `period - 1`; earlier entries are `None`.
/// A window without losses yields exactly 100.
pub fn rsi(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; prices.len()];
    if period == 0 || prices.len() < period {
        return result;
    }

    let changes: Vec<(f64, f64)> = std::iter::once((0.0, 0.0))
        .chain(prices.windows(2).map(|w| {
            let delta = w[1] - w[0];
            (delta.max(0.0), (-delta).max(0.0))
        }))
        .collect();

    let mut gains = WindowSum::default();
    let mut losses = WindowSum::default();

    for (i, &(gain, loss)) in changes.iter().enumerate() {
        gains.push(gain);
        losses.push(loss);

        if i >= period {
            let (old_gain, old_loss) = changes[i - period];
            gains.evict(old_gain);
            losses.evict(old_loss);
        }

        if i + 1 >= period {
            result[i] = Some(rsi_value(gains.mean(period), losses.mean(period)));
        }
    }

    result
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

/// Per-point RSI(14), MA(50) and MA(200) over a close series in ascending
/// date order.
pub fn snapshots(closes: &[f64]) -> Vec<IndicatorSnapshot> {
    let rsi14 = rsi(closes, RSI_PERIOD);
    let ma50 = sma(closes, MA_SHORT_PERIOD);
    let ma200 = sma(closes, MA_LONG_PERIOD);

    rsi14
        .into_iter()
        .zip(ma50)
        .zip(ma200)
        .map(|((rsi14, ma50), ma200)| IndicatorSnapshot { rsi14, ma50, ma200 })
        .collect()
}

pub fn latest_snapshot(closes: &[f64]) -> IndicatorSnapshot {
    snapshots(closes).last().copied().unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Oversold,
    Neutral,
    Overbought,
    Unavailable,
}

impl RsiZone {
    pub fn classify(rsi: Option<f64>) -> Self {
        match rsi {
            Some(v) if v < RSI_OVERSOLD => RsiZone::Oversold,
            Some(v) if v > RSI_OVERBOUGHT => RsiZone::Overbought,
            Some(_) => RsiZone::Neutral,
            None => RsiZone::Unavailable,
        }
    }
}
