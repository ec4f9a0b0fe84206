//! SMS gateway clients

mod twilio;

pub use twilio::TwilioGateway;
