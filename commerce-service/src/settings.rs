//! Business settings read once from the `business_settings` table and handed
//! to each service at construction.

use bigdecimal::{BigDecimal, Zero};
use std::str::FromStr;

pub const WALLET_STATUS: &str = "wallet_status";
pub const LOYALTY_POINT_STATUS: &str = "loyalty_point_status";
pub const LOYALTY_POINT_EXCHANGE_RATE: &str = "loyalty_point_exchange_rate";
pub const LOYALTY_POINT_PERCENT_ON_ITEM_PURCHASE: &str = "loyalty_point_percent_on_item_purchase";
pub const REF_EARNING_EXCHANGE_RATE: &str = "ref_earning_exchange_rate";
pub const ORDER_CONFIRMATION_STATUS: &str = "order_confirmation_status";

#[derive(Debug, thiserror::Error)]
#[error("business setting {key} has invalid value {value:?}")]
pub struct SettingsError {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct BusinessSettings {
    pub wallet_enabled: bool,
    pub loyalty_enabled: bool,
    /// Loyalty points per one unit of wallet currency.
    pub loyalty_exchange_rate: BigDecimal,
    /// Percent of an order amount awarded as loyalty points.
    pub loyalty_purchase_percent: BigDecimal,
    /// Flat wallet credit for a successful referral.
    pub referral_reward: BigDecimal,
    pub order_confirmation_enabled: bool,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        Self {
            wallet_enabled: false,
            loyalty_enabled: false,
            loyalty_exchange_rate: BigDecimal::from(1),
            loyalty_purchase_percent: BigDecimal::zero(),
            referral_reward: BigDecimal::zero(),
            order_confirmation_enabled: false,
        }
    }
}

impl BusinessSettings {
    /// Builds settings from raw key/value rows. Keys this service does not
    /// use are skipped; missing keys keep their defaults.
    pub fn from_entries<I, K, V>(entries: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = Self::default();
        for (key, value) in entries {
            let (key, value) = (key.as_ref(), value.as_ref());
            match key {
                WALLET_STATUS => settings.wallet_enabled = parse_flag(key, value)?,
                LOYALTY_POINT_STATUS => settings.loyalty_enabled = parse_flag(key, value)?,
                ORDER_CONFIRMATION_STATUS => {
                    settings.order_confirmation_enabled = parse_flag(key, value)?
                }
                LOYALTY_POINT_EXCHANGE_RATE => {
                    let rate = parse_decimal(key, value)?;
                    if rate <= BigDecimal::zero() {
                        return Err(invalid(key, value));
                    }
                    settings.loyalty_exchange_rate = rate;
                }
                LOYALTY_POINT_PERCENT_ON_ITEM_PURCHASE => {
                    settings.loyalty_purchase_percent = parse_non_negative(key, value)?
                }
                REF_EARNING_EXCHANGE_RATE => {
                    settings.referral_reward = parse_non_negative(key, value)?
                }
                _ => {}
            }
        }
        Ok(settings)
    }
}

fn invalid(key: &str, value: &str) -> SettingsError {
    SettingsError {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim() {
        "1" | "true" => Ok(true),
        "0" | "false" | "" => Ok(false),
        _ => Err(invalid(key, value)),
    }
}

fn parse_decimal(key: &str, value: &str) -> Result<BigDecimal, SettingsError> {
    BigDecimal::from_str(value.trim()).map_err(|_| invalid(key, value))
}

fn parse_non_negative(key: &str, value: &str) -> Result<BigDecimal, SettingsError> {
    let parsed = parse_decimal(key, value)?;
    if parsed < BigDecimal::zero() {
        return Err(invalid(key, value));
    }
    Ok(parsed)
}
