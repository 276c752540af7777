pub mod twilio_service;
