use std::collections::HashMap;

/// `/simple/price` body: coin id -> quote currency -> price.
pub type SimplePriceResponse = HashMap<String, HashMap<String, f64>>;

pub const USD: &str = "usd";
