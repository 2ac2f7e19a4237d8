pub mod client;
pub mod error;
pub mod model;
mod validation;

pub use client::UsersInfoApi;
pub use error::UsersInfoError;
pub use model::{FieldViolation, NewUser, User, UserPatch, ValidationErrors};
