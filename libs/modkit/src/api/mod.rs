//! REST helpers shared by all modules: RFC 9457 problem details and the
//! OpenAPI registry that REST modules merge their documents into.

pub mod openapi;
pub mod problem;
