pub mod socket;

pub use socket::RawIpSink;
