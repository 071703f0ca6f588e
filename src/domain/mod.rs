pub mod currency;
pub mod money;
pub mod valuation;
pub mod wallet;

pub use currency::CurrencyCode;
pub use money::Money;
pub use valuation::{value_in_reference, Valuation};
pub use wallet::Wallet;
