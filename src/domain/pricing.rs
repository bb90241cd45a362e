use crate::domain::DateRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Amount in the property's currency minor units.
pub type Money = i64;

/// Twelve percent, in basis points.
pub const DEFAULT_SERVICE_FEE_BPS: u32 = 1_200;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("price unavailable: nightly rate must be positive")]
    PriceUnavailable,

    #[error("{field} cannot be negative (got {amount})")]
    NegativeAmount { field: &'static str, amount: Money },

    #[error("a stay needs at least one night")]
    NoNights,

    #[error("{0} does not fit in a money amount")]
    Overflow(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rates {
    pub price_per_night: Money,
    pub cleaning_fee: Money,
    /// Explicit service fee. `None` or zero falls back to the percentage.
    #[serde(default)]
    pub service_fee: Option<Money>,
}

impl Rates {
    pub fn new(price_per_night: Money, cleaning_fee: Money) -> Self {
        Self {
            price_per_night,
            cleaning_fee,
            service_fee: None,
        }
    }

    pub fn with_service_fee(mut self, fee: Money) -> Self {
        self.service_fee = Some(fee);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub nights: i64,
    pub accommodation_cost: Money,
    pub cleaning_fee: Money,
    pub service_fee: Money,
    pub total: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceCalculator {
    service_fee_bps: u32,
}

impl Default for PriceCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_FEE_BPS)
    }
}

impl PriceCalculator {
    pub fn new(service_fee_bps: u32) -> Self {
        Self { service_fee_bps }
    }

    pub fn service_fee_bps(&self) -> u32 {
        self.service_fee_bps
    }

    /// Percentage fee rounded half up.
    pub fn default_service_fee(&self, accommodation_cost: Money) -> Result<Money, PricingError> {
        let bps = i128::from(self.service_fee_bps);
        let fee = (i128::from(accommodation_cost) * bps + 5_000) / 10_000;
        Money::try_from(fee).map_err(|_| PricingError::Overflow("service fee"))
    }

    pub fn quote(&self, stay: DateRange, rates: &Rates) -> Result<PriceQuote, PricingError> {
        if rates.price_per_night <= 0 {
            return Err(PricingError::PriceUnavailable);
        }
        if rates.cleaning_fee < 0 {
            return Err(PricingError::NegativeAmount {
                field: "cleaning fee",
                amount: rates.cleaning_fee,
            });
        }
        if let Some(fee) = rates.service_fee.filter(|fee| *fee < 0) {
            return Err(PricingError::NegativeAmount {
                field: "service fee",
                amount: fee,
            });
        }

        let nights = stay.nights();
        if nights <= 0 {
            return Err(PricingError::NoNights);
        }

        let accommodation_cost = nights
            .checked_mul(rates.price_per_night)
            .ok_or(PricingError::Overflow("accommodation cost"))?;
        let service_fee = match rates.service_fee {
            Some(fee) if fee > 0 => fee,
            _ => self.default_service_fee(accommodation_cost)?,
        };
        let total = accommodation_cost
            .checked_add(rates.cleaning_fee)
            .and_then(|sum| sum.checked_add(service_fee))
            .ok_or(PricingError::Overflow("total"))?;

        Ok(PriceQuote {
            nights,
            accommodation_cost,
            cleaning_fee: rates.cleaning_fee,
            service_fee,
            total,
        })
    }
}

/// Upfront share the payment flow collects after a quote is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DepositKind {
    /// Per-night stays.
    Stay,
    /// Rent and lease deposits.
    Lease,
}

impl DepositKind {
    pub fn percent(&self) -> i64 {
        match self {
            DepositKind::Stay => 30,
            DepositKind::Lease => 50,
        }
    }

    pub fn amount(&self, total: Money) -> Money {
        let amount = (i128::from(total) * i128::from(self.percent()) + 50) / 100;
        // A share of at most half never exceeds the total it came from.
        Money::try_from(amount).unwrap_or(total)
    }
}

/// What a committed guest selection hands to the booking flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingIntent {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub total_price: Money,
}

impl BookingIntent {
    pub fn new(stay: DateRange, quote: &PriceQuote) -> Self {
        Self {
            check_in: stay.start(),
            check_out: stay.end(),
            nights: quote.nights,
            total_price: quote.total,
        }
    }
}
