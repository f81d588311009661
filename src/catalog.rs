// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Static registry of tradable equities and funds, each with one bounded
//! price history per [`Timeframe`].

use crate::models::{InstrumentKind, Timeframe};
use crate::utils::round2;
use once_cell::sync::Lazy;
use rand::Rng;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Maximum points retained per series; the oldest point is dropped on overflow.
pub const HISTORY_CAP: usize = 40;

/// Points generated per timeframe when the universe is seeded.
pub const SEED_POINTS: usize = 30;

const SEED_DRIFT_PCT: Decimal = dec!(0.02);
const PRICE_FLOOR: Decimal = dec!(1);
const INDEX_BASE: Decimal = dec!(65000);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceHistory {
    points: Vec<Decimal>,
}

impl PriceHistory {
    pub fn new(points: Vec<Decimal>) -> Self {
        let mut h = Self {
            points: Vec::with_capacity(HISTORY_CAP),
        };
        for p in points {
            h.push(p);
        }
        h
    }

    pub fn push(&mut self, price: Decimal) {
        self.points.push(price);
        if self.points.len() > HISTORY_CAP {
            let excess = self.points.len() - HISTORY_CAP;
            self.points.drain(..excess);
        }
    }

    pub fn latest(&self) -> Option<Decimal> {
        self.points.last().copied()
    }

    pub fn previous(&self) -> Option<Decimal> {
        self.points.iter().rev().nth(1).copied()
    }

    pub fn points(&self) -> &[Decimal] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Instrument {
    pub id: String,
    pub name: String,
    pub kind: InstrumentKind,
    /// Percent move between the last two points of the primary series.
    pub change_pct: Decimal,
    /// Trailing one-year return, funds only, display only.
    pub one_year_return: Option<Decimal>,
    histories: BTreeMap<Timeframe, PriceHistory>,
}

impl Instrument {
    /// Equity with a single-point history at `price` in every timeframe.
    pub fn equity(id: &str, name: &str, price: Decimal) -> Self {
        Self::flat(id, name, InstrumentKind::Equity, price, None)
    }

    /// Fund with a single-point history at `nav` in every timeframe.
    pub fn fund(id: &str, name: &str, nav: Decimal, one_year_return: Decimal) -> Self {
        Self::flat(id, name, InstrumentKind::Fund, nav, Some(one_year_return))
    }

    fn flat(
        id: &str,
        name: &str,
        kind: InstrumentKind,
        price: Decimal,
        one_year_return: Option<Decimal>,
    ) -> Self {
        let histories = Timeframe::ALL
            .into_iter()
            .map(|tf| (tf, PriceHistory::new(vec![price])))
            .collect();
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            change_pct: Decimal::ZERO,
            one_year_return,
            histories,
        }
    }

    pub fn with_history(mut self, tf: Timeframe, points: Vec<Decimal>) -> Self {
        self.histories.insert(tf, PriceHistory::new(points));
        self
    }

    pub fn with_change(mut self, change_pct: Decimal) -> Self {
        self.change_pct = change_pct;
        self
    }

    pub fn history(&self, tf: Timeframe) -> Option<&PriceHistory> {
        self.histories.get(&tf)
    }

    /// Latest point of the timeframe's series.
    pub fn latest(&self, tf: Timeframe) -> Option<Decimal> {
        self.history(tf).and_then(PriceHistory::latest)
    }

    /// Latest primary-series price.
    pub fn price(&self) -> Option<Decimal> {
        self.latest(Timeframe::PRIMARY)
    }

    /// Appends a point. Updating the primary series also refreshes `change_pct`.
    pub fn record(&mut self, tf: Timeframe, price: Decimal) {
        let history = self
            .histories
            .entry(tf)
            .or_insert_with(|| PriceHistory::new(Vec::new()));
        history.push(price);
        if tf == Timeframe::PRIMARY {
            self.change_pct = match history.previous() {
                Some(prev) if !prev.is_zero() => (price - prev) / prev * dec!(100),
                _ => Decimal::ZERO,
            };
        }
    }
}

/// Uniform perturbation in `[-vol/2, vol/2)` percent.
pub(crate) fn perturbation<R: Rng + ?Sized>(rng: &mut R, vol: Decimal) -> Decimal {
    let u = Decimal::from(rng.gen_range(0u32..1_000_000)) / dec!(1_000_000);
    (u - dec!(0.5)) * vol
}

/// Applies a percent move, rounds to 2 dp and floors at 1.
pub(crate) fn walk_step(last: Decimal, change_pct: Decimal) -> Decimal {
    round2(last * (Decimal::ONE + change_pct / dec!(100))).max(PRICE_FLOOR)
}

fn seed_series<R: Rng + ?Sized>(rng: &mut R, start: Decimal, vol: Decimal) -> Vec<Decimal> {
    let mut out = Vec::with_capacity(SEED_POINTS);
    out.push(start);
    for i in 1..SEED_POINTS {
        let change = perturbation(rng, vol) + SEED_DRIFT_PCT;
        out.push(walk_step(out[i - 1], change));
    }
    out
}

fn seed_volatility(tf: Timeframe) -> Decimal {
    match tf {
        Timeframe::Day => dec!(0.8),
        Timeframe::Week => dec!(1.2),
        Timeframe::Month => dec!(1.5),
        Timeframe::Year => dec!(2.0),
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    instruments: Vec<Instrument>,
    index: HashMap<String, usize>,
}

impl Catalog {
    pub fn new(instruments: Vec<Instrument>) -> Self {
        let index = instruments
            .iter()
            .enumerate()
            .map(|(i, inst)| (inst.id.clone(), i))
            .collect();
        Self { instruments, index }
    }

    /// The standard equity and fund universe with random-walk seed histories.
    pub fn seeded<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut instruments = Vec::with_capacity(EQUITIES.len() + FUNDS.len());
        for &(id, name, price, change) in EQUITIES {
            let mut inst = Instrument::equity(id, name, price).with_change(change);
            for tf in Timeframe::ALL {
                inst = inst.with_history(tf, seed_series(rng, price, seed_volatility(tf)));
            }
            instruments.push(inst);
        }
        for &(id, name, nav, one_y) in FUNDS {
            let mut inst = Instrument::fund(id, name, nav, one_y);
            for tf in Timeframe::ALL {
                inst = inst.with_history(tf, seed_series(rng, nav, seed_volatility(tf)));
            }
            instruments.push(inst);
        }
        Self::new(instruments)
    }

    pub fn get(&self, id: &str) -> Option<&Instrument> {
        self.index.get(id).map(|&i| &self.instruments[i])
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Instrument> {
        self.index.get(id).map(|&i| &mut self.instruments[i])
    }

    pub fn equity(&self, id: &str) -> Option<&Instrument> {
        self.get(id).filter(|i| i.kind == InstrumentKind::Equity)
    }

    pub fn fund(&self, id: &str) -> Option<&Instrument> {
        self.get(id).filter(|i| i.kind == InstrumentKind::Fund)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Instrument> {
        self.instruments.iter_mut()
    }

    pub fn equities(&self) -> impl Iterator<Item = &Instrument> {
        self.iter().filter(|i| i.kind == InstrumentKind::Equity)
    }

    pub fn funds(&self) -> impl Iterator<Item = &Instrument> {
        self.iter().filter(|i| i.kind == InstrumentKind::Fund)
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Synthetic large-cap index: the average relative move of the constituents
    /// over their common window, scaled to `INDEX_BASE` and rounded to whole points.
    pub fn index_series(&self, tf: Timeframe) -> Vec<Decimal> {
        let series: Vec<&[Decimal]> = INDEX_CONSTITUENTS
            .iter()
            .filter_map(|id| self.equity(id))
            .filter_map(|i| i.history(tf))
            .map(PriceHistory::points)
            .filter(|p| !p.is_empty())
            .collect();
        if series.is_empty() {
            return vec![INDEX_BASE; SEED_POINTS];
        }
        let len = series.iter().map(|s| s.len()).min().unwrap_or(0);
        let count = Decimal::from(series.len());
        (0..len)
            .map(|i| {
                let mut rel = Decimal::ZERO;
                for s in &series {
                    let offset = s.len() - len;
                    let start = s[offset];
                    if !start.is_zero() {
                        rel += s[offset + i] / start - Decimal::ONE;
                    }
                }
                (INDEX_BASE * (Decimal::ONE + rel / count))
                    .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            })
            .collect()
    }
}

static QUOTE_SYMBOLS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("TCS", "TCS.NS"),
        ("INFY", "INFY.NS"),
        ("RELI", "RELIANCE.NS"),
        ("HDFCB", "HDFCBANK.NS"),
        ("ICICI", "ICICIBANK.NS"),
        ("SBIN", "SBIN.NS"),
        ("LT", "LT.NS"),
        ("ITC", "ITC.NS"),
        ("BHARTI", "BHARTIARTL.NS"),
        ("HINDUNIL", "HINDUNILVR.NS"),
    ])
});

/// External quote-provider symbol for an instrument id; unmapped ids pass through.
pub fn quote_symbol(id: &str) -> &str {
    QUOTE_SYMBOLS.get(id).copied().unwrap_or(id)
}

const INDEX_CONSTITUENTS: &[&str] = &[
    "RELI", "HDFCB", "ICICI", "SBIN", "TCS", "INFY", "ITC", "KOTAK", "HCLTECH", "LT", "BHARTI",
    "HINDUNIL", "TATASTEEL", "SUNPHARMA", "NTPC", "ONGC", "POWERGRID", "BAJAJ-AUTO", "M_M",
    "ASIANPAINT",
];

// (id, name, price, change %)
const EQUITIES: &[(&str, &str, Decimal, Decimal)] = &[
    ("TCS", "TCS", dec!(3850), dec!(0.6)),
    ("INFY", "Infosys", dec!(1620), dec!(-0.3)),
    ("RELI", "Reliance", dec!(2520), dec!(0.9)),
    ("HDFCB", "HDFC Bank", dec!(1530), dec!(-0.2)),
    ("ICICI", "ICICI Bank", dec!(980), dec!(0.4)),
    ("SBIN", "SBI", dec!(710), dec!(1.1)),
    ("LT", "Larsen & Toubro", dec!(3520), dec!(-0.5)),
    ("ITC", "ITC", dec!(460), dec!(0.2)),
    ("BHARTI", "Bharti Airtel", dec!(1210), dec!(-0.4)),
    ("HINDUNIL", "HUL", dec!(2490), dec!(0.1)),
    ("MARUTI", "Maruti Suzuki", dec!(10950), dec!(0.3)),
    ("BAJFIN", "Bajaj Finance", dec!(7250), dec!(-0.6)),
    ("ADANIENT", "Adani Enterprises", dec!(2740), dec!(0.8)),
    ("WIPRO", "Wipro", dec!(455), dec!(0.2)),
    ("TECHM", "Tech Mahindra", dec!(1340), dec!(-0.1)),
    ("ULTRACEM", "UltraTech Cement", dec!(9800), dec!(0.5)),
    ("KOTAK", "Kotak Mahindra Bank", dec!(1770), dec!(0.2)),
    ("TATAMOT", "Tata Motors", dec!(860), dec!(1.0)),
    ("JSWSTEEL", "JSW Steel", dec!(875), dec!(-0.3)),
    ("HCLTECH", "HCL Technologies", dec!(1505), dec!(0.4)),
    ("TATASTEEL", "Tata Steel", dec!(145), dec!(0.3)),
    ("COAL", "Coal India", dec!(420), dec!(-0.2)),
    ("POWERGRID", "Power Grid", dec!(255), dec!(0.1)),
    ("NTPC", "NTPC", dec!(330), dec!(0.2)),
    ("ONGC", "ONGC", dec!(205), dec!(-0.1)),
    ("BPCL", "BPCL", dec!(610), dec!(0.3)),
    ("HDFCLIFE", "HDFC Life", dec!(640), dec!(0.2)),
    ("SBILIFE", "SBI Life", dec!(1420), dec!(-0.1)),
    ("BAJAJ-AUTO", "Bajaj Auto", dec!(8940), dec!(0.5)),
    ("EICHER", "Eicher Motors", dec!(4130), dec!(0.3)),
    ("HEROMOTO", "Hero MotoCorp", dec!(4100), dec!(-0.2)),
    ("TATAPOWER", "Tata Power", dec!(390), dec!(0.4)),
    ("M_M", "Mahindra & Mahindra", dec!(1725), dec!(0.2)),
    ("SUNPHARMA", "Sun Pharma", dec!(1390), dec!(0.3)),
    ("DRREDDY", "Dr. Reddy's", dec!(12450), dec!(-0.1)),
    ("CIPLA", "Cipla", dec!(1260), dec!(0.2)),
    ("DIVIS", "Divi's Labs", dec!(4270), dec!(0.2)),
    ("APOLLOHOSP", "Apollo Hospitals", dec!(6350), dec!(0.4)),
    ("BRITANNIA", "Britannia", dec!(5180), dec!(0.1)),
    ("DABUR", "Dabur", dec!(550), dec!(-0.1)),
    ("NESTLE", "Nestle India", dec!(24300), dec!(0.2)),
    ("PIDILITE", "Pidilite", dec!(2900), dec!(0.3)),
    ("ASIANPAINT", "Asian Paints", dec!(3180), dec!(-0.2)),
    ("GRASIM", "Grasim", dec!(2190), dec!(0.2)),
    ("ADANIPORTS", "Adani Ports", dec!(1240), dec!(0.4)),
    ("ADANIGREEN", "Adani Green", dec!(980), dec!(-0.3)),
    ("ADANITRANS", "Adani Energy", dec!(920), dec!(0.5)),
    ("INDUSIND", "IndusInd Bank", dec!(1420), dec!(0.1)),
    ("BANDHAN", "Bandhan Bank", dec!(206), dec!(-0.2)),
    ("ZOMATO", "Zomato", dec!(160), dec!(0.8)),
    ("NYKAA", "FSN E-Com (Nykaa)", dec!(175), dec!(-0.5)),
    ("PAYTM", "Paytm", dec!(460), dec!(0.6)),
    ("DMART", "Avenue Supermarts", dec!(3920), dec!(0.2)),
    ("IRCTC", "IRCTC", dec!(910), dec!(0.1)),
    ("POLYCAB", "Polycab", dec!(5900), dec!(0.4)),
    ("TATACHEM", "Tata Chemicals", dec!(1120), dec!(-0.2)),
    ("HAVELLS", "Havells", dec!(1550), dec!(0.3)),
    ("ABB", "ABB India", dec!(6400), dec!(0.2)),
    ("LTIM", "LTIMindtree", dec!(5450), dec!(0.3)),
];

// (id, name, NAV, 1Y return %)
const FUNDS: &[(&str, &str, Decimal, Decimal)] = &[
    ("NIP-ELSS", "Nippon India Tax Saver", dec!(145.3), dec!(18.4)),
    ("PARAG-FLEXI", "Parag Parikh Flexi Cap", dec!(79.6), dec!(21.1)),
    ("MIRA-LARGE", "Mirae Asset Large Cap", dec!(102.1), dec!(16.9)),
    ("AXIS-SML", "Axis Small Cap", dec!(64.5), dec!(28.6)),
    ("HDFC-MID", "HDFC Mid-Cap Opp.", dec!(132.7), dec!(23.2)),
    ("SBI-BLUE", "SBI Bluechip", dec!(74.2), dec!(15.8)),
    ("ICICI-VAL", "ICICI Pru Value Discovery", dec!(225.4), dec!(19.5)),
    ("UTI-NIFTY", "UTI Nifty 50 Index", dec!(205.8), dec!(17.2)),
    ("KOTAK-EMERGE", "Kotak Emerging Equity", dec!(84.6), dec!(26.7)),
    ("QUANT-SML", "Quant Small Cap", dec!(120.3), dec!(31.4)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn history_drops_oldest_past_cap() {
        let mut h = PriceHistory::new((1..=HISTORY_CAP as i64).map(Decimal::from).collect());
        assert_eq!(h.len(), HISTORY_CAP);
        h.push(dec!(99));
        assert_eq!(h.len(), HISTORY_CAP);
        assert_eq!(h.points()[0], dec!(2));
        assert_eq!(h.latest(), Some(dec!(99)));
        assert_eq!(h.previous(), Some(dec!(40)));
    }

    #[test]
    fn record_on_primary_updates_change() {
        let mut inst = Instrument::equity("X", "X Corp", dec!(100));
        inst.record(Timeframe::Day, dec!(110));
        assert_eq!(inst.price(), Some(dec!(110)));
        assert_eq!(inst.change_pct, dec!(10));
        inst.record(Timeframe::Week, dec!(50));
        assert_eq!(inst.change_pct, dec!(10));
        assert_eq!(inst.latest(Timeframe::Week), Some(dec!(50)));
    }

    #[test]
    fn seeded_universe_has_all_instruments_and_bounded_series() {
        let mut rng = StdRng::seed_from_u64(7);
        let cat = Catalog::seeded(&mut rng);
        assert_eq!(cat.equities().count(), 59);
        assert_eq!(cat.funds().count(), 10);
        let tcs = cat.equity("TCS").unwrap();
        for tf in Timeframe::ALL {
            let h = tcs.history(tf).unwrap();
            assert_eq!(h.len(), SEED_POINTS);
            assert_eq!(h.points()[0], dec!(3850));
            assert!(h.points().iter().all(|p| *p >= dec!(1)));
        }
        assert_eq!(cat.fund("AXIS-SML").unwrap().one_year_return, Some(dec!(28.6)));
        assert!(cat.equity("AXIS-SML").is_none());
        assert!(cat.fund("TCS").is_none());
    }

    #[test]
    fn walk_step_floors_at_one() {
        assert_eq!(walk_step(dec!(1.00), dec!(-50)), dec!(1));
        assert_eq!(walk_step(dec!(100), dec!(0.5)), dec!(100.50));
    }

    #[test]
    fn quote_symbol_falls_back_to_id() {
        assert_eq!(quote_symbol("RELI"), "RELIANCE.NS");
        assert_eq!(quote_symbol("ZOMATO"), "ZOMATO");
    }

    #[test]
    fn index_starts_at_base_and_is_empty_safe() {
        let mut rng = StdRng::seed_from_u64(1);
        let cat = Catalog::seeded(&mut rng);
        let series = cat.index_series(Timeframe::Day);
        assert_eq!(series.len(), SEED_POINTS);
        assert_eq!(series[0], dec!(65000));

        let empty = Catalog::default();
        assert_eq!(empty.index_series(Timeframe::Day), vec![dec!(65000); SEED_POINTS]);
    }
}
