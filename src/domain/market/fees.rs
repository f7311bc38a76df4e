use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::trading::types::TakerOrMaker;

/// One volume threshold and the rate that applies from it upward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeTier {
    pub volume: Decimal,
    pub rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeeTiers {
    pub maker: Vec<FeeTier>,
    pub taker: Vec<FeeTier>,
}

/// Trading fee schedule of a market.
///
/// Tiers are kept in the order the exchange sent them. They are expected to be
/// ascending by volume and are not re-sorted here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FeeSchedule {
    pub maker: Option<Decimal>,
    pub taker: Option<Decimal>,
    /// Rates are fractions of cost rather than fixed amounts.
    pub percentage: bool,
    pub tier_based: bool,
    pub tiers: Option<FeeTiers>,
}

impl FeeSchedule {
    pub fn flat(maker: Option<Decimal>, taker: Option<Decimal>, percentage: bool) -> Self {
        Self {
            maker,
            taker,
            percentage,
            tier_based: false,
            tiers: None,
        }
    }

    /// Builds a tiered schedule. The first tier provides the base maker/taker rates;
    /// with no tiers the supplied flat rates are used.
    pub fn tiered(
        tiers: FeeTiers,
        flat_maker: Option<Decimal>,
        flat_taker: Option<Decimal>,
        percentage: bool,
    ) -> Self {
        let maker = tiers.maker.first().map(|t| t.rate).or(flat_maker);
        let taker = tiers.taker.first().map(|t| t.rate).or(flat_taker);
        Self {
            maker,
            taker,
            percentage,
            tier_based: true,
            tiers: Some(tiers),
        }
    }

    /// Rate applicable at a trailing `volume`: the last tier whose threshold does
    /// not exceed it, or the base rate below the first threshold.
    pub fn rate_for(&self, role: TakerOrMaker, volume: Decimal) -> Option<Decimal> {
        let (base, tiers) = match role {
            TakerOrMaker::Maker => (self.maker, self.tiers.as_ref().map(|t| &t.maker)),
            TakerOrMaker::Taker => (self.taker, self.tiers.as_ref().map(|t| &t.taker)),
        };
        let Some(tiers) = tiers else {
            return base;
        };
        tiers
            .iter()
            .take_while(|tier| tier.volume <= volume)
            .last()
            .map(|tier| tier.rate)
            .or(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn schedule() -> FeeSchedule {
        let tiers = FeeTiers {
            maker: vec![
                FeeTier { volume: dec!(1500000), rate: dec!(0.00500) },
                FeeTier { volume: dec!(2000000), rate: dec!(0.00490) },
                FeeTier { volume: dec!(5000000), rate: dec!(0.00480) },
            ],
            taker: vec![
                FeeTier { volume: dec!(1500000), rate: dec!(0.00650) },
                FeeTier { volume: dec!(2000000), rate: dec!(0.00637) },
                FeeTier { volume: dec!(5000000), rate: dec!(0.00624) },
            ],
        };
        FeeSchedule::tiered(tiers, Some(dec!(0.005)), Some(dec!(0.0065)), true)
    }

    #[test]
    fn test_first_tier_is_base_rate() {
        let s = schedule();
        assert_eq!(s.maker, Some(dec!(0.00500)));
        assert_eq!(s.taker, Some(dec!(0.00650)));
        assert!(s.tier_based);
    }

    #[test]
    fn test_rate_lookup_by_volume() {
        let s = schedule();
        assert_eq!(s.rate_for(TakerOrMaker::Taker, dec!(100)), Some(dec!(0.00650)));
        assert_eq!(s.rate_for(TakerOrMaker::Taker, dec!(2000000)), Some(dec!(0.00637)));
        assert_eq!(s.rate_for(TakerOrMaker::Maker, dec!(9000000)), Some(dec!(0.00480)));
    }

    #[test]
    fn test_empty_tiers_fall_back_to_flat() {
        let s = FeeSchedule::tiered(FeeTiers::default(), Some(dec!(0.001)), Some(dec!(0.002)), true);
        assert_eq!(s.maker, Some(dec!(0.001)));
        assert_eq!(s.rate_for(TakerOrMaker::Taker, dec!(10)), Some(dec!(0.002)));
    }
}
