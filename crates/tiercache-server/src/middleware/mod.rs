//! Tower middleware applied to every request.
//!
//! - `RequestIdLayer`: propagates or generates `x-request-id`
//! - `LoggingLayer`: one structured span and log line per request

mod logging;
mod request_id;

pub use logging::{LoggingLayer, LoggingMiddleware};
pub use request_id::{MAX_REQUEST_ID_LEN, REQUEST_ID_HEADER, RequestIdLayer, RequestIdMiddleware};
