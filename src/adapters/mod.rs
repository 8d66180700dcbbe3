//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter         | Implements   | Connects to                      |
//! |-----------------|--------------|----------------------------------|
//! | `http_gateway`  | GatewayPort  | podcore pub/sub REST endpoints   |
//! | `null_gateway`  | GatewayPort  | nothing (local-only runs)        |
//! | `time`          | DelayPort    | tokio timer                      |
//! | `log_sink`      | EventSink    | `log` facade                     |
//! | `config_file`   | ConfigPort   | JSON file on disk                |
//!
//! The network and timer adapters are compiled only with the `http`
//! feature, so the pure-logic core (and the fuzz harness) builds without
//! an async runtime or TLS stack.

pub mod config_file;
#[cfg(feature = "http")]
pub mod http_gateway;
pub mod log_sink;
pub mod null_gateway;
#[cfg(feature = "http")]
pub mod time;
