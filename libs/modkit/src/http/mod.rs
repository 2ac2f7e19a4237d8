//! HTTP utilities shared by REST modules.

pub mod sse;
