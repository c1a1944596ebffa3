//! Microsoft Graph scheduling backend

pub mod oauth;
mod schedule;

pub use oauth::TokenCache;
pub use schedule::{GraphClient, GraphSettings};
