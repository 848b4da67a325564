//! External collaborators consumed by `taxi-core`: deterministic
//! address/time parsing, and HTTP clients for the geocoder, dispatcher,
//! amender, and human-transfer sink.

pub mod address;
pub mod amend;
pub mod dispatch;
pub mod geocode;
pub mod sink;
pub mod time;

pub use address::UkAddressParser;
pub use amend::HttpAmender;
pub use dispatch::HttpDispatcher;
pub use geocode::HttpGeocoder;
pub use sink::LoggingTransferSink;
pub use time::UkPickupTimeParser;

/// Convert a `reqwest::Error` into a domain `Error`. Timeouts become
/// `Error::Timeout`; everything else becomes `Error::Http`.
pub fn from_reqwest(e: reqwest::Error) -> taxi_domain::error::Error {
    if e.is_timeout() {
        taxi_domain::error::Error::Timeout(e.to_string())
    } else {
        taxi_domain::error::Error::Http(e.to_string())
    }
}
