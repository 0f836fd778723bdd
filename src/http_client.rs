use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const CONNECT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("nba_sheet_sync/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Shared blocking client. No overall request timeout: dataset downloads are
/// large and the remote APIs enforce their own limits.
pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(None::<Duration>)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
