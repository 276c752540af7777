pub mod email;
pub mod factory;
pub mod media;
pub mod payments;
pub mod repositories;
pub mod sms;
