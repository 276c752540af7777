pub mod asset;
pub mod booking;
pub mod contact;
pub mod invoice;
pub mod money;
pub mod webhook;
