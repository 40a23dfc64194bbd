//! Profile form rules applied before anything is sent.

use chrono::NaiveDate;

use crate::auth::credentials::is_valid_email;
use crate::auth::password::MIN_PASSWORD_LEN;
use crate::profile::age::check_age;

const MIN_NAME_LEN: usize = 2;

/// What the profile editor holds. Empty strings mean "not filled in".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileForm {
    pub first_name: String,
    pub last_name: String,
    pub nickname: String,
    pub email: String,
    pub date_of_birth: String,
    pub profile_picture: Option<String>,
    pub is_anonymous: bool,
    pub password: String,
    pub confirm_password: String,
}

impl ProfileForm {
    /// The date of birth, if it parses as `YYYY-MM-DD`.
    pub fn birth_date(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.date_of_birth.trim(), "%Y-%m-%d").ok()
    }

    pub fn wants_password_change(&self) -> bool {
        !self.password.is_empty() || !self.confirm_password.is_empty()
    }
}

/// One rejected form field, keyed by its wire name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_name(errors: &mut Vec<FieldError>, field: &'static str, label: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
    } else if value.chars().count() < MIN_NAME_LEN {
        errors.push(FieldError::new(
            field,
            format!("{} must be at least {} characters", label, MIN_NAME_LEN),
        ));
    }
}

/// Every problem with `form`, in field order. Empty means the form can be sent.
pub fn validate_profile_form(form: &ProfileForm, today: NaiveDate) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_name(&mut errors, "firstName", "First name", &form.first_name);
    check_name(&mut errors, "lastName", "Last name", &form.last_name);

    let nickname = form.nickname.trim();
    if nickname.is_empty() {
        if form.is_anonymous {
            errors.push(FieldError::new(
                "nickname",
                "Nickname is required when posting anonymously",
            ));
        }
    } else if nickname.chars().count() < MIN_NAME_LEN {
        errors.push(FieldError::new(
            "nickname",
            format!("Nickname must be at least {} characters", MIN_NAME_LEN),
        ));
    }

    let email = form.email.trim();
    if email.is_empty() {
        errors.push(FieldError::new("email", "Email is required"));
    } else if !is_valid_email(email) {
        errors.push(FieldError::new("email", "Please enter a valid email"));
    }

    if form.date_of_birth.trim().is_empty() {
        errors.push(FieldError::new("dateOfBirth", "Date of birth is required"));
    } else {
        match form.birth_date() {
            None => errors.push(FieldError::new("dateOfBirth", "Please enter a valid date")),
            Some(dob) => {
                if let Err(e) = check_age(dob, today) {
                    errors.push(FieldError::new("dateOfBirth", e.to_string()));
                }
            }
        }
    }

    if form.wants_password_change() {
        if form.password.chars().count() < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
            ));
        }
        if form.password != form.confirm_password {
            errors.push(FieldError::new("confirmPassword", "Passwords do not match"));
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn valid_form() -> ProfileForm {
        ProfileForm {
            first_name: "Ana".into(),
            last_name: "Lim".into(),
            email: "ana@x.com".into(),
            date_of_birth: "1990-01-01".into(),
            ..Default::default()
        }
    }

    fn fields(form: &ProfileForm) -> Vec<&'static str> {
        validate_profile_form(form, today())
            .into_iter()
            .map(|e| e.field)
            .collect()
    }

    #[test]
    fn valid_form_passes() {
        assert!(fields(&valid_form()).is_empty());
    }

    #[test]
    fn empty_form_flags_required_fields() {
        assert_eq!(
            fields(&ProfileForm::default()),
            ["firstName", "lastName", "email", "dateOfBirth"]
        );
    }

    #[test]
    fn short_names_are_rejected() {
        let form = ProfileForm {
            first_name: "A".into(),
            nickname: "F".into(),
            ..valid_form()
        };
        assert_eq!(fields(&form), ["firstName", "nickname"]);
    }

    #[test]
    fn anonymous_needs_nickname() {
        let form = ProfileForm {
            is_anonymous: true,
            ..valid_form()
        };
        assert_eq!(fields(&form), ["nickname"]);

        let form = ProfileForm {
            is_anonymous: true,
            nickname: "Fox".into(),
            ..valid_form()
        };
        assert!(fields(&form).is_empty());
    }

    #[test]
    fn malformed_email_is_rejected() {
        let form = ProfileForm {
            email: "ana@x".into(),
            ..valid_form()
        };
        assert_eq!(fields(&form), ["email"]);
    }

    #[test]
    fn birth_date_rules() {
        for (dob, ok) in [
            ("2011-06-15", true),
            ("2011-06-16", false),
            ("2030-01-01", false),
            ("15/06/2000", false),
        ] {
            let form = ProfileForm {
                date_of_birth: dob.into(),
                ..valid_form()
            };
            assert_eq!(fields(&form).is_empty(), ok, "{}", dob);
        }
    }

    #[test]
    fn password_is_optional_but_checked_when_given() {
        let form = ProfileForm {
            password: "secret1".into(),
            confirm_password: "secret1".into(),
            ..valid_form()
        };
        assert!(fields(&form).is_empty());

        let form = ProfileForm {
            password: "abc".into(),
            confirm_password: "abd".into(),
            ..valid_form()
        };
        assert_eq!(fields(&form), ["password", "confirmPassword"]);

        let form = ProfileForm {
            confirm_password: "secret1".into(),
            ..valid_form()
        };
        assert_eq!(fields(&form), ["password", "confirmPassword"]);
    }
}
