pub mod memory;
pub mod users;
pub mod wallet_store;
pub mod wallets;

pub use memory::MemoryWalletStore;
pub use wallet_store::{StoreError, WalletStore};
pub use wallets::PgWalletStore;
