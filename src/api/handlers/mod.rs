pub mod asset;
pub mod booking;
pub mod contact;
pub mod health;
pub mod invoice;
pub mod pricing;
pub mod webhook;
