use serde::Serialize;

use crate::error::AppError;

pub const MAX_MESSAGE_LEN: usize = 5000;

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: Option<String>,
    pub message: String,
    pub service: Option<String>,
}

impl ContactMessage {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".into()));
        }
        if !self.email.contains('@') {
            return Err(AppError::Validation("A valid email address is required".into()));
        }
        let message = self.message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message is required".into()));
        }
        if message.chars().count() > MAX_MESSAGE_LEN {
            return Err(AppError::Validation(format!("Message must be at most {} characters", MAX_MESSAGE_LEN)));
        }
        Ok(())
    }

    pub fn subject_line(&self) -> String {
        match &self.subject {
            Some(subject) if !subject.trim().is_empty() => format!("New inquiry: {}", subject.trim()),
            _ => format!("New inquiry from {}", self.name.trim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> ContactMessage {
        ContactMessage {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            phone: None,
            subject: None,
            message: "Do you service Oakland?".into(),
            service: None,
        }
    }

    #[test]
    fn test_valid_message() {
        assert!(message().validate().is_ok());
        assert_eq!(message().subject_line(), "New inquiry from Jane");
    }

    #[test]
    fn test_rejects_bad_input() {
        let mut m = message();
        m.email = "not-an-email".into();
        assert!(matches!(m.validate(), Err(AppError::Validation(_))));

        let mut m = message();
        m.message = "   ".into();
        assert!(matches!(m.validate(), Err(AppError::Validation(_))));

        let mut m = message();
        m.message = "x".repeat(MAX_MESSAGE_LEN + 1);
        assert!(matches!(m.validate(), Err(AppError::Validation(_))));
    }
}
