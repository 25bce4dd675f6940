//! Fee schedule: percentages, clamping and the `fee_configs` table.
//!
//! A fee is a percentage of the amount, rounded **up** to a whole taka, then
//! clamped to `[minimum_fee, maximum_fee]`. A zero bound means "no bound".

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, ResultEngine, util::parse_uuid};

const BASIS_POINTS_PER_UNIT: i64 = 10_000;

/// A percentage stored as basis points (`1.5%` is `150`).
///
/// ```rust
/// use engine::Percent;
///
/// assert_eq!("1.5".parse::<Percent>().unwrap().basis_points(), 150);
/// assert!("100.01".parse::<Percent>().is_err());
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Percent(i64);

impl Percent {
    pub const ZERO: Percent = Percent(0);
    pub const HUNDRED: Percent = Percent(BASIS_POINTS_PER_UNIT);

    /// Builds a percentage from basis points, rejecting values outside `0..=100%`.
    pub fn from_basis_points(bp: i64) -> ResultEngine<Self> {
        if !(0..=BASIS_POINTS_PER_UNIT).contains(&bp) {
            return Err(EngineError::Validation(
                "percentage must be between 0 and 100".to_string(),
            ));
        }
        Ok(Self(bp))
    }

    #[must_use]
    pub const fn basis_points(self) -> i64 {
        self.0
    }

    /// Applies the percentage to `amount`, rounding up to the next paisa.
    #[must_use]
    pub fn of_ceil(self, amount: Money) -> Money {
        let numerator = i128::from(amount.minor()) * i128::from(self.0);
        let denom = i128::from(BASIS_POINTS_PER_UNIT);
        let minor = (numerator + denom - 1).div_euclid(denom);
        Money::new(i64::try_from(minor).unwrap_or(i64::MAX))
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for Percent {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::Validation(format!("invalid percentage: {s}"));
        let trimmed = s.trim().trim_end_matches('%').trim();
        let (whole, frac) = match trimmed.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (trimmed, ""),
        };
        if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let whole: i64 = whole.parse().map_err(|_| invalid())?;
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => frac.parse::<i64>().map_err(|_| invalid())?,
        };
        let bp = whole
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(invalid)?;
        Percent::from_basis_points(bp)
    }
}

/// The fee schedule applied when a request or transfer is created.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// `None` for the implicit zero schedule used before any admin set one.
    pub id: Option<Uuid>,
    pub transfer_fee: Percent,
    pub mobile_money_fee: Percent,
    pub minimum_fee: Money,
    pub maximum_fee: Money,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl FeeSchedule {
    /// Builds an unsaved schedule and validates its bounds.
    pub fn new(
        transfer_fee: Percent,
        mobile_money_fee: Percent,
        minimum_fee: Money,
        maximum_fee: Money,
    ) -> ResultEngine<Self> {
        let schedule = Self {
            id: None,
            transfer_fee,
            mobile_money_fee,
            minimum_fee,
            maximum_fee,
            created_by: None,
            created_at: None,
        };
        schedule.validate()?;
        Ok(schedule)
    }

    pub fn validate(&self) -> ResultEngine<()> {
        for percent in [self.transfer_fee, self.mobile_money_fee] {
            Percent::from_basis_points(percent.basis_points())?;
        }
        if self.minimum_fee.is_negative() || self.maximum_fee.is_negative() {
            return Err(EngineError::Validation(
                "fee bounds must not be negative".to_string(),
            ));
        }
        if self.maximum_fee.is_positive() && self.minimum_fee > self.maximum_fee {
            return Err(EngineError::Validation(
                "minimum fee must not exceed maximum fee".to_string(),
            ));
        }
        Ok(())
    }

    /// Fee charged on a mobile-money request of `amount`.
    pub fn mobile_money_fee(&self, amount: Money) -> ResultEngine<Money> {
        self.fee(self.mobile_money_fee, amount)
    }

    /// Fee charged on a wallet-to-wallet transfer of `amount`.
    pub fn transfer_fee(&self, amount: Money) -> ResultEngine<Money> {
        self.fee(self.transfer_fee, amount)
    }

    fn fee(&self, percent: Percent, amount: Money) -> ResultEngine<Money> {
        let mut fee = percent
            .of_ceil(amount)
            .checked_ceil_major()
            .ok_or_else(|| EngineError::InvalidAmount("amount too large".to_string()))?;
        if self.minimum_fee.is_positive() && fee < self.minimum_fee {
            fee = self.minimum_fee;
        }
        if self.maximum_fee.is_positive() && fee > self.maximum_fee {
            fee = self.maximum_fee;
        }
        Ok(fee)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "fee_configs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub transfer_fee_bp: i64,
    pub mobile_money_fee_bp: i64,
    pub minimum_fee: i64,
    pub maximum_fee: i64,
    pub is_active: bool,
    pub created_by: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for FeeSchedule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(parse_uuid(&model.id, "fee config")?),
            transfer_fee: Percent::from_basis_points(model.transfer_fee_bp)?,
            mobile_money_fee: Percent::from_basis_points(model.mobile_money_fee_bp)?,
            minimum_fee: Money::new(model.minimum_fee),
            maximum_fee: Money::new(model.maximum_fee),
            created_by: Some(model.created_by),
            created_at: Some(model.created_at),
        })
    }
}

impl ActiveModel {
    pub(crate) fn active_from(
        schedule: &FeeSchedule,
        id: Uuid,
        created_by: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::Set(id.to_string()),
            transfer_fee_bp: ActiveValue::Set(schedule.transfer_fee.basis_points()),
            mobile_money_fee_bp: ActiveValue::Set(schedule.mobile_money_fee.basis_points()),
            minimum_fee: ActiveValue::Set(schedule.minimum_fee.minor()),
            maximum_fee: ActiveValue::Set(schedule.maximum_fee.minor()),
            is_active: ActiveValue::Set(true),
            created_by: ActiveValue::Set(created_by.to_string()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}
