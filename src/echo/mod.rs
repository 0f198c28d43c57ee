//! Echo service.
//!
//! Raw byte-stream echo with no framing:
//! - Client sends: any bytes
//! - Server echoes: the same bytes, in order, on the same connection
//!
//! ```text
//! Request:  hello
//! Response: hello
//! ```
//!
//! The relay runs until the client closes its write side or an I/O error
//! occurs. The connection is closed when its handler returns, whichever
//! way it exits.

pub mod handler;

pub use handler::handle_connection;
