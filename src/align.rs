//! Series alignment: duplicate-bar aggregation and as-of matching.
//!
//! Both transforms assume their inputs are ordered by timestamp, which the
//! provider guarantees.

use chrono::{DateTime, Utc};

use crate::provider::{Bar, Timestamped};

/// Which secondary point wins when two are equidistant from a primary point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TieBreak {
    /// Prefer the earlier secondary point.
    #[default]
    Earlier,
    /// Prefer the later secondary point.
    Later,
}

/// Collapses runs of bars sharing a timestamp into single bars.
///
/// Options-venue bar feeds interleave several reporting venues that stamp
/// their bars identically; the collapsed bar takes the mean open and close,
/// the extreme high and low, and the summed volume. Distinct timestamps pass
/// through untouched and order is preserved.
#[must_use]
pub fn aggregate_duplicate_bars(bars: &[Bar]) -> Vec<Bar> {
    let mut out = Vec::with_capacity(bars.len());
    let mut pending: Option<BarGroup> = None;

    for bar in bars {
        match pending.as_mut() {
            Some(group) if group.ts == bar.ts => group.add(bar),
            _ => {
                if let Some(group) = pending.take() {
                    out.push(group.finish());
                }
                pending = Some(BarGroup::new(bar));
            }
        }
    }
    if let Some(group) = pending {
        out.push(group.finish());
    }

    out
}

/// Matches each primary point to the secondary point nearest in time.
///
/// Nearest by absolute distance in either direction; equidistant neighbors
/// resolve per `tie_break`. An empty secondary series drops every primary
/// point. Output order follows the primary series.
#[must_use]
pub fn asof_align<'a, P, S>(
    primary: &'a [P],
    secondary: &'a [S],
    tie_break: TieBreak,
) -> Vec<(&'a P, &'a S)>
where
    P: Timestamped,
    S: Timestamped,
{
    if secondary.is_empty() {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(primary.len());
    let mut j = 0usize;

    for p in primary {
        let t = p.ts();
        // Advance to the last secondary point at or before t. Primary order
        // is ascending, so j never moves backwards.
        while j + 1 < secondary.len() && secondary[j + 1].ts() <= t {
            j += 1;
        }

        let before = (secondary[j].ts() <= t).then(|| &secondary[j]);
        let after = if secondary[j].ts() > t {
            Some(&secondary[j])
        } else {
            secondary.get(j + 1)
        };

        let chosen = match (before, after) {
            (Some(b), Some(a)) => {
                let to_before = t - b.ts();
                let to_after = a.ts() - t;
                if to_before < to_after {
                    b
                } else if to_after < to_before {
                    a
                } else {
                    match tie_break {
                        TieBreak::Earlier => b,
                        TieBreak::Later => a,
                    }
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => continue,
        };
        out.push((p, chosen));
    }

    out
}

/// Accumulator for one run of same-timestamp bars.
struct BarGroup {
    ts: DateTime<Utc>,
    open_sum: f64,
    close_sum: f64,
    high: f64,
    low: f64,
    volume: u64,
    count: u32,
}

impl BarGroup {
    fn new(bar: &Bar) -> Self {
        Self {
            ts: bar.ts,
            open_sum: bar.open,
            close_sum: bar.close,
            high: bar.high,
            low: bar.low,
            volume: bar.volume,
            count: 1,
        }
    }

    fn add(&mut self, bar: &Bar) {
        self.open_sum += bar.open;
        self.close_sum += bar.close;
        self.high = self.high.max(bar.high);
        self.low = self.low.min(bar.low);
        self.volume += bar.volume;
        self.count += 1;
    }

    fn finish(self) -> Bar {
        let count = f64::from(self.count);
        Bar {
            ts: self.ts,
            open: self.open_sum / count,
            high: self.high,
            low: self.low,
            close: self.close_sum / count,
            volume: self.volume,
        }
    }
}
