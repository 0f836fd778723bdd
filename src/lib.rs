pub mod config;
pub mod dedup;
pub mod error;
pub mod game_time;
pub mod google_auth;
pub mod http_client;
pub mod importer;
pub mod kaggle;
pub mod logging;
pub mod memory_sheets;
pub mod pipelines;
pub mod row_filter;
pub mod runner;
pub mod season;
pub mod sheets;
pub mod sheets_api;
pub mod stat_rows;
pub mod writer;
