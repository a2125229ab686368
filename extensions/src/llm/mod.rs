mod connection;
mod exchange_log;

pub use connection::HttpLlmConnection;
pub use exchange_log::{ExchangeLog, EXCHANGE_FILE_PREFIX};
