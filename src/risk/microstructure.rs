// Trade-flow and order-book facts derived from raw exchange data

use serde::{Deserialize, Serialize};

use crate::models::{BookLevel, BookPressure, OrderBookSummary, TradePrint};

/// Large-trade ("whale") activity in a sample of trade prints
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WhaleActivity {
    /// Share of notional traded in large prints
    pub whale_ratio: f64,
    /// Large buy notional minus large sell notional (USD)
    pub net_whale_volume: f64,
    pub total_volume_usd: f64,
    /// Aggressive buy notional over aggressive sell notional (1.0 with no sells)
    pub buy_sell_ratio: f64,
    pub whale_trades: usize,
}

impl WhaleActivity {
    /// Aggregate trade prints; a print is large when its notional is at least
    /// `threshold_usd`. Returns None for an empty sample.
    pub fn from_trades(trades: &[TradePrint], threshold_usd: f64) -> Option<Self> {
        if trades.is_empty() {
            return None;
        }

        let mut activity = WhaleActivity::default();
        let (mut buy_volume, mut sell_volume, mut whale_volume) = (0.0, 0.0, 0.0);

        for trade in trades {
            let value = trade.price * trade.quantity;
            if !value.is_finite() || value <= 0.0 {
                continue;
            }
            activity.total_volume_usd += value;

            // Buyer as maker means the taker sold
            let is_buy = !trade.is_buyer_maker;
            if is_buy {
                buy_volume += value;
            } else {
                sell_volume += value;
            }

            if value >= threshold_usd {
                whale_volume += value;
                activity.whale_trades += 1;
                activity.net_whale_volume += if is_buy { value } else { -value };
            }
        }

        if activity.total_volume_usd > 0.0 {
            activity.whale_ratio = whale_volume / activity.total_volume_usd;
        }
        activity.buy_sell_ratio = if sell_volume > 0.0 {
            buy_volume / sell_volume
        } else {
            1.0
        };

        Some(activity)
    }
}

impl OrderBookSummary {
    /// Summarize raw depth (bids best-first, asks best-first)
    ///
    /// Mid price comes from the best bid and ask. Nearby volume is summed
    /// within ±1% of mid; pressure needs a 1.5x imbalance. Up to three orders
    /// of at least `large_order_volume` are kept per side.
    pub fn from_depth(bids: &[BookLevel], asks: &[BookLevel], large_order_volume: f64) -> Option<Self> {
        let (best_bid, best_ask) = (bids.first()?, asks.first()?);
        let mid = (best_bid.price + best_ask.price) / 2.0;

        let total_bid_volume: f64 = bids.iter().map(|l| l.volume).sum();
        let total_ask_volume: f64 = asks.iter().map(|l| l.volume).sum();

        let nearby_bid_1pct: f64 = bids
            .iter()
            .filter(|l| l.price >= mid * 0.99)
            .map(|l| l.volume)
            .sum();
        let nearby_ask_1pct: f64 = asks
            .iter()
            .filter(|l| l.price <= mid * 1.01)
            .map(|l| l.volume)
            .sum();

        let nearby_pressure = if nearby_bid_1pct > nearby_ask_1pct * 1.5 {
            BookPressure::BuyPressure
        } else if nearby_ask_1pct > nearby_bid_1pct * 1.5 {
            BookPressure::SellPressure
        } else {
            BookPressure::Balanced
        };

        let largest = |levels: &[BookLevel]| {
            levels
                .iter()
                .copied()
                .max_by(|a, b| a.volume.total_cmp(&b.volume))
                .unwrap_or_default()
        };
        let large = |levels: &[BookLevel]| -> Vec<BookLevel> {
            levels
                .iter()
                .copied()
                .filter(|l| l.volume >= large_order_volume)
                .take(3)
                .collect()
        };

        Some(Self {
            bid_ask_ratio: if total_ask_volume > 0.0 {
                total_bid_volume / total_ask_volume
            } else {
                0.0
            },
            total_bid_volume,
            total_ask_volume,
            major_support: largest(bids),
            major_resistance: largest(asks),
            nearby_bid_1pct,
            nearby_ask_1pct,
            nearby_pressure,
            large_bids: large(bids),
            large_asks: large(asks),
        })
    }
}

/// Side of the book with almost no resting liquidity near the price
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LiquidityGap {
    /// Thin asks: little resistance above
    Upward,
    /// Thin bids: little support below
    Downward,
}

/// Liquidity gaps from the ±1% nearby volumes
///
/// One side outweighing the other by more than `ratio` is a gap on the thin
/// side. A book with no nearby volume reports nothing.
pub fn detect_liquidity_gaps(book: &OrderBookSummary, ratio: f64) -> Vec<LiquidityGap> {
    let (bid, ask) = (book.nearby_bid_1pct, book.nearby_ask_1pct);
    let mut gaps = Vec::new();

    if ask > 0.0 && bid / ask > ratio {
        gaps.push(LiquidityGap::Upward);
    } else if bid > 0.0 && ask / bid > ratio {
        gaps.push(LiquidityGap::Downward);
    }

    gaps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trade(price: f64, quantity: f64, is_buyer_maker: bool) -> TradePrint {
        TradePrint {
            price,
            quantity,
            is_buyer_maker,
        }
    }

    fn level(price: f64, volume: f64) -> BookLevel {
        BookLevel { price, volume }
    }

    #[test]
    fn test_whale_activity() {
        let trades = vec![
            trade(50_000.0, 2.0, false), // $100k buy, whale
            trade(50_000.0, 0.5, true),  // $25k sell
            trade(50_000.0, 0.5, false), // $25k buy
        ];

        let activity = WhaleActivity::from_trades(&trades, 50_000.0).unwrap();
        assert_eq!(activity.total_volume_usd, 150_000.0);
        assert!((activity.whale_ratio - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(activity.net_whale_volume, 100_000.0);
        assert_eq!(activity.buy_sell_ratio, 5.0);
        assert_eq!(activity.whale_trades, 1);
    }

    #[test]
    fn test_whale_activity_no_sells() {
        let activity = WhaleActivity::from_trades(&[trade(10.0, 1.0, false)], 50_000.0).unwrap();
        assert_eq!(activity.buy_sell_ratio, 1.0);
        assert_eq!(activity.whale_ratio, 0.0);
        assert!(WhaleActivity::from_trades(&[], 50_000.0).is_none());
    }

    #[test]
    fn test_order_book_from_depth() {
        let bids = vec![level(99.9, 10.0), level(99.5, 2.0), level(95.0, 50.0)];
        let asks = vec![level(100.1, 1.0), level(100.5, 1.0), level(110.0, 6.0)];

        let book = OrderBookSummary::from_depth(&bids, &asks, 5.0).unwrap();
        assert_eq!(book.nearby_bid_1pct, 12.0);
        assert_eq!(book.nearby_ask_1pct, 2.0);
        assert_eq!(book.nearby_pressure, BookPressure::BuyPressure);
        assert_eq!(book.major_support.price, 95.0);
        assert_eq!(book.major_resistance.price, 110.0);
        assert_eq!(book.large_bids.len(), 2);
        assert_eq!(book.large_asks.len(), 1);
        assert!((book.bid_ask_ratio - 62.0 / 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_side_has_no_summary() {
        assert!(OrderBookSummary::from_depth(&[], &[level(1.0, 1.0)], 5.0).is_none());
    }

    #[test]
    fn test_liquidity_gaps() {
        let mut book = OrderBookSummary {
            nearby_bid_1pct: 60.0,
            nearby_ask_1pct: 10.0,
            ..OrderBookSummary::default()
        };
        assert_eq!(detect_liquidity_gaps(&book, 5.0), vec![LiquidityGap::Upward]);

        book.nearby_bid_1pct = 1.0;
        assert_eq!(detect_liquidity_gaps(&book, 5.0), vec![LiquidityGap::Downward]);

        book.nearby_bid_1pct = 5.0;
        assert!(detect_liquidity_gaps(&book, 5.0).is_empty());

        assert!(detect_liquidity_gaps(&OrderBookSummary::default(), 5.0).is_empty());
    }
}
