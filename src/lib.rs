pub mod approach;
pub mod config;
pub mod content_size;
pub mod database;
pub mod language;
pub mod quota;
pub mod routes;
pub mod sandbox;
pub mod session;
pub mod validation;
pub mod web_server;

pub fn create_timestamp() -> String {
    use chrono::{SecondsFormat, Utc};
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
