// src/checks/mod.rs
mod http;
mod tcp;

pub use http::HttpCheck;
pub use tcp::TcpCheck;
