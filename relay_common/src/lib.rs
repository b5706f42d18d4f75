pub mod helpers;
mod networks;
mod rubles;
mod secret;

pub use networks::{IpNetwork, NetworkParseError, TrustedNetworks};
pub use rubles::{Rubles, RublesConversionError, RUB_CURRENCY_CODE};
pub use secret::Secret;
