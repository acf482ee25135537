pub mod config;
pub mod conn;
pub mod errors;
pub mod retransmit;
pub mod state;
pub mod tcp_flags;
pub mod tcp_header;
pub mod wrap32;

pub use config::{ephemeral_port, TcpConfig};
pub use conn::{Clock, TcpConnection};
pub use errors::TcpError;
pub use retransmit::{RetransmissionTimer, RetransmitPolicy};
pub use state::{TcpEvent, TcpState};
pub use tcp_flags::TcpFlags;
pub use tcp_header::{TcpHeader, TCP_HEADER_LEN};
pub use wrap32::Wrap32;
