//! Value objects - immutable types that represent domain concepts

mod phone;

pub use phone::PhoneNumber;
