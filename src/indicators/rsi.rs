/// Relative Strength Index from pre-computed average gain and loss.
///
/// RSI measures the magnitude of recent price changes to evaluate
/// overbought or oversold conditions:
/// - RSI > 70: Overbought
/// - RSI < 30: Oversold
///
/// A period with zero losses is RSI 100 by definition; that case is
/// answered directly instead of routing a division by zero through
/// floating-point infinity.
pub fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }

    let rs = avg_gain / avg_loss;
    100.0 - (100.0 / (1.0 + rs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_formula() {
        // avg gain 1.0, avg loss 0.5 -> RS 2 -> RSI 100 - 100/3
        let rsi = rsi_from_averages(1.0, 0.5);
        assert!((rsi - 66.6666).abs() < 0.001);
    }

    #[test]
    fn test_rsi_all_gains() {
        assert_eq!(rsi_from_averages(1.5, 0.0), 100.0);
    }

    #[test]
    fn test_rsi_all_losses() {
        assert_eq!(rsi_from_averages(0.0, 1.5), 0.0);
    }

    #[test]
    fn test_rsi_balanced() {
        let rsi = rsi_from_averages(1.0, 1.0);
        assert!((rsi - 50.0).abs() < f64::EPSILON);
    }
}
