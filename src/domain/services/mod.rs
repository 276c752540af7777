pub mod delivery;
pub mod invoice_service;
pub mod notification_service;
pub mod pricing;
pub mod signature;
pub mod webhook_router;
