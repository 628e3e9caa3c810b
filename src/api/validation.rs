//! Form payloads and their field checks.
//!
//! Missing fields deserialize to empty values so they are reported per field
//! instead of rejecting the whole body.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

use crate::models::{FieldErrors, GigInput, Role};
use crate::services::Registration;

const REQUIRED: &str = "Input is required!";

static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s.]+$").ok());

fn required(errors: &mut FieldErrors, field: &str, value: &str) -> bool {
    if value.trim().is_empty() {
        errors.add(field, REQUIRED);
        return false;
    }
    true
}

fn length(
    errors: &mut FieldErrors,
    field: &str,
    value: &str,
    (min, max): (usize, usize),
    label: &str,
) {
    if !required(errors, field, value) {
        return;
    }
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(
            field,
            format!("{label} must be between {min} and {max} characters long"),
        );
    }
}

fn email(errors: &mut FieldErrors, value: &str) {
    let valid = EMAIL_RE.as_ref().is_some_and(|re| re.is_match(value));
    if !value.trim().is_empty() && !valid {
        errors.add("email", "You did not enter a valid email!");
    }
}

fn password_pair(errors: &mut FieldErrors, password: &str, confirm: &str) {
    length(errors, "password", password, (10, 40), "Password");
    required(errors, "password_confirm", confirm);
    if !password.is_empty() && password != confirm {
        errors.add("password", "Passwords must match");
    }
}

fn profile_fields(errors: &mut FieldErrors, location: &str, description: &str) {
    length(errors, "location", location, (3, 40), "Location");
    length(errors, "description", description, (10, 200), "Description");
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub location: String,
    pub description: String,
    pub role: String,
}

impl RegisterForm {
    pub fn validate(self) -> Result<Registration, FieldErrors> {
        let mut errors = FieldErrors::new();

        length(&mut errors, "username", &self.username, (5, 20), "Username");
        length(&mut errors, "email", &self.email, (10, 30), "Email");
        email(&mut errors, &self.email);
        password_pair(&mut errors, &self.password, &self.password_confirm);
        profile_fields(&mut errors, &self.location, &self.description);

        let role = match self.role.to_ascii_lowercase().as_str() {
            "musician" => Some(Role::Musician),
            "employer" => Some(Role::Employer),
            _ => {
                errors.add("role", "Not a valid choice");
                None
            }
        };

        errors.into_result()?;

        Ok(Registration {
            username: self.username,
            email: self.email,
            password: self.password,
            role: role.unwrap_or(Role::Musician),
            location: self.location,
            description: self.description,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        length(&mut errors, "email", &self.email, (10, 30), "Email");
        length(&mut errors, "password", &self.password, (10, 40), "Password");
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PasswordResetForm {
    pub email: String,
}

impl PasswordResetForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        required(&mut errors, "email", &self.email);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdatePasswordForm {
    pub password: String,
    pub password_confirm: String,
}

impl UpdatePasswordForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        password_pair(&mut errors, &self.password, &self.password_confirm);
        errors.into_result()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GigForm {
    pub title: String,
    pub description: String,
    pub payment: Option<f64>,
    pub location: String,
}

impl GigForm {
    pub fn validate(self) -> Result<GigInput, FieldErrors> {
        let mut errors = FieldErrors::new();

        length(&mut errors, "title", &self.title, (5, 80), "Title");
        length(&mut errors, "description", &self.description, (10, 200), "Description");
        length(&mut errors, "location", &self.location, (3, 40), "Location");

        if let Some(payment) = self.payment
            && (!payment.is_finite() || payment < 0.0)
        {
            errors.add("payment", "Payment must be a positive amount");
        }

        errors.into_result()?;

        Ok(GigInput {
            title: self.title,
            description: self.description,
            payment: self.payment,
            location: self.location,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AccountForm {
    pub location: String,
    pub description: String,
}

impl AccountForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        profile_fields(&mut errors, &self.location, &self.description);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> RegisterForm {
        RegisterForm {
            username: "alice_m".to_string(),
            email: "alice@example.com".to_string(),
            password: "violin-strings".to_string(),
            password_confirm: "violin-strings".to_string(),
            location: "Vienna".to_string(),
            description: "Classical violinist".to_string(),
            role: "musician".to_string(),
        }
    }

    #[test]
    fn test_valid_registration() {
        let registration = registration().validate().unwrap();
        assert_eq!(registration.role, Role::Musician);
        assert_eq!(registration.username, "alice_m");
    }

    #[test]
    fn test_registration_field_errors() {
        let form = RegisterForm {
            username: "al".to_string(),
            email: "not-an-email".to_string(),
            password_confirm: "something-else".to_string(),
            role: "admin".to_string(),
            ..registration()
        };

        let errors = form.validate().unwrap_err();
        assert!(errors.contains("username"));
        assert!(errors.contains("email"));
        assert!(errors.contains("role"));
        assert_eq!(errors.messages("password"), ["Passwords must match"]);
        assert!(!errors.contains("location"));
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = RegisterForm::default().validate().unwrap_err();
        for field in ["username", "email", "password", "password_confirm", "location", "description"] {
            assert_eq!(errors.messages(field), [REQUIRED], "{field}");
        }
    }

    #[test]
    fn test_email_shape() {
        let mut errors = FieldErrors::new();
        email(&mut errors, "someone@example.com");
        assert!(errors.is_empty());

        for bad in ["someone@", "@example.com", "some one@example.com", "someone@example"] {
            let mut errors = FieldErrors::new();
            email(&mut errors, bad);
            assert!(errors.contains("email"), "{bad}");
        }
    }

    #[test]
    fn test_lengths_count_characters() {
        let mut errors = FieldErrors::new();
        length(&mut errors, "location", "Köln", (3, 40), "Location");
        assert!(errors.is_empty());

        length(&mut errors, "location", &"x".repeat(41), (3, 40), "Location");
        assert_eq!(
            errors.messages("location"),
            ["Location must be between 3 and 40 characters long"]
        );
    }

    #[test]
    fn test_gig_form() {
        let form = GigForm {
            title: "Need Violin Player".to_string(),
            description: "Wedding reception, two sets".to_string(),
            payment: None,
            location: "Vienna".to_string(),
        };
        assert!(form.validate().is_ok());

        let form = GigForm {
            title: "Gig".to_string(),
            description: "Too short".to_string(),
            payment: Some(-5.0),
            location: "Vienna".to_string(),
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("title"));
        assert!(errors.contains("description"));
        assert!(errors.contains("payment"));
    }

    #[test]
    fn test_update_password_form() {
        let form = UpdatePasswordForm {
            password: "short".to_string(),
            password_confirm: "short".to_string(),
        };
        assert!(form.validate().unwrap_err().contains("password"));

        let form = UpdatePasswordForm {
            password: "long-enough-password".to_string(),
            password_confirm: "long-enough-password".to_string(),
        };
        assert!(form.validate().is_ok());
    }
}
