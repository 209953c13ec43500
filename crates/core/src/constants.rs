/// Currency every converted amount is expressed in unless configured otherwise.
pub const DEFAULT_BASE_CURRENCY: &str = "LKR";

/// Settings key holding the base currency.
pub const BASE_CURRENCY_SETTING: &str = "base_currency";

/// Settings key holding the JSON-encoded exchange-rate table.
pub const EXCHANGE_RATES_SETTING: &str = "exchange_rates";
