//! External collaborator facades (spec §4.7). The core never owns a
//! socket, a certificate store, a crypto library instance or the
//! information model — it only calls through these traits. Concrete
//! implementations live outside this crate (or, for crypto, behind the
//! `libsodium` feature here) and are supplied by whoever embeds the
//! core.

pub mod config;
pub mod crypto;
pub mod services;
pub mod socket;

pub use config::ConfigStore;
pub use crypto::CryptoProvider;
pub use services::Services;
pub use socket::Socket;
