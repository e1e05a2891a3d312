pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod feed;
pub mod ledger;
pub mod notify;
pub mod pipeline;
pub mod plate;
pub mod state;
pub mod status;
pub mod traffic;
