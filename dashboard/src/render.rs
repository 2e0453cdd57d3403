use crate::MarketPoint;

/// Rendering surface consuming decoded, sorted market data.
///
/// Implementations receive fully prepared values: latest points aligned
/// with the configured token order, and history series already reversed to
/// chronological (oldest → newest) order.
pub trait RenderSurface: Send {
    /// One box per token; a `None` entry (no data yet) renders nothing.
    fn render_price_boxes(&mut self, latest: &[Option<MarketPoint>]);
    /// One bar per token; a `None` entry is shown as zero.
    fn render_market_cap_bars(&mut self, latest: &[Option<MarketPoint>]);
    /// Price history for one token, oldest first.
    fn render_price_history(&mut self, token: &str, series: &[MarketPoint]);
}

/// Terminal renderer printing aligned tables.
#[derive(Default)]
pub struct ConsoleRenderer;

impl RenderSurface for ConsoleRenderer {
    fn render_price_boxes(&mut self, latest: &[Option<MarketPoint>]) {
        println!(
            "{:<12} {:>14} {:>9}  {}",
            "Token", "Price", "24h", "Record key"
        );
        for point in latest.iter().flatten() {
            let snapshot = &point.snapshot;
            let change = snapshot.change_24h.unwrap_or(0.0);
            println!(
                "{:<12} {:>14} {:>+8.2}%  {}",
                snapshot.token_id,
                format_price(snapshot.price.unwrap_or(0.0)),
                change,
                point.key,
            );
        }
    }

    fn render_market_cap_bars(&mut self, latest: &[Option<MarketPoint>]) {
        println!("{:<12} {:>10}", "Token", "Market cap");
        for point in latest {
            match point {
                Some(point) => println!(
                    "{:<12} {:>10}",
                    point.snapshot.token_id,
                    format_market_cap(point.snapshot.market_cap.unwrap_or(0.0)),
                ),
                None => println!("{:<12} {:>10}", "-", format_market_cap(0.0)),
            }
        }
    }

    fn render_price_history(&mut self, token: &str, series: &[MarketPoint]) {
        let first = series.first().map(|p| p.snapshot.timestamp_ms).unwrap_or(0);
        let last = series.last().map(|p| p.snapshot.timestamp_ms).unwrap_or(0);
        println!(
            "{token}: {} points, {}ms..{}ms, latest {}",
            series.len(),
            first,
            last,
            format_price(
                series
                    .last()
                    .and_then(|p| p.snapshot.price)
                    .unwrap_or(0.0)
            ),
        );
    }
}

/// `$1.2T` / `$345.6B` / `$789M` formatting for market-cap figures.
pub fn format_market_cap(value: f64) -> String {
    if value >= 1e12 {
        format!("${:.1}T", value / 1e12)
    } else if value >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if value >= 1e6 {
        format!("${:.0}M", value / 1e6)
    } else {
        format!("${value:.0}")
    }
}

/// Dollar price with thousands separators and two decimals.
pub fn format_price(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;
    let mut digits = whole.to_string();
    let mut grouped = String::new();
    while digits.len() > 3 {
        let split = digits.len() - 3;
        grouped = format!(",{}{}", &digits[split..], grouped);
        digits.truncate(split);
    }
    let sign = if negative { "-" } else { "" };
    format!("{sign}${digits}{grouped}.{frac:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn market_cap_scales_through_thresholds() {
        assert_eq!(format_market_cap(1.32e12), "$1.3T");
        assert_eq!(format_market_cap(4.2e11), "$420.0B");
        assert_eq!(format_market_cap(7.89e8), "$789M");
        assert_eq!(format_market_cap(950_000.0), "$950000");
    }

    #[test]
    fn price_groups_thousands() {
        assert_eq!(format_price(67000.5), "$67,000.50");
        assert_eq!(format_price(0.41), "$0.41");
        assert_eq!(format_price(1_234_567.0), "$1,234,567.00");
        assert_eq!(format_price(-12.3), "-$12.30");
    }
}
