use super::*;

fn form(username: &str, email: &str, password: &str, confirm: &str) -> RegistrationForm {
    RegistrationForm {
        username: username.into(),
        email: email.into(),
        password: password.into(),
        confirm_password: confirm.into(),
    }
}

#[test]
fn password_without_uppercase_or_special_fails() {
    assert_eq!(password_error("abc12345"), Some("Password must contain at least one uppercase letter"));
    assert_eq!(password_error("Abc12345"), Some("Password must contain at least one special character"));
}

#[test]
fn strong_password_passes() {
    assert_eq!(password_error("Abc123!@"), None);
}

#[test]
fn password_rules_report_in_order() {
    assert_eq!(password_error(""), Some("Password is required"));
    assert_eq!(password_error("Ab1!"), Some("Password must be at least 8 characters"));
    assert_eq!(password_error("Abcdefg!"), Some("Password must contain at least one number"));
}

#[test]
fn every_listed_special_character_counts() {
    for special in r#"!@#$%^&*()_+-=[]{};':"\|,.<>/?"#.chars() {
        let password = format!("Abcdef1{special}");
        assert_eq!(password_error(&password), None, "special {special:?}");
    }
    assert!(password_error("Abcdef1~").is_some());
}

#[test]
fn valid_registration_passes() {
    assert!(form("ada", "ada@example.com", "Abc123!@", "Abc123!@").validate().is_ok());
}

#[test]
fn registration_collects_each_field() {
    let errors = form("  ", "not-an-email", "abc12345", "different").validate().unwrap_err();
    assert_eq!(errors.get(Field::Username), Some("Username name is required"));
    assert_eq!(errors.get(Field::Email), Some("Email format is invalid"));
    assert_eq!(errors.get(Field::Password), Some("Password must contain at least one uppercase letter"));
    assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords do not match"));
    assert_eq!(errors.iter().count(), 4);
}

#[test]
fn registration_requires_email() {
    let errors = form("ada", "", "Abc123!@", "Abc123!@").validate().unwrap_err();
    assert_eq!(errors.get(Field::Email), Some("Email is required"));
    assert_eq!(errors.iter().count(), 1);
}

#[test]
fn revalidation_reflects_corrected_input() {
    let mut registration = form("ada", "ada@example.com", "short", "short");
    assert!(registration.validate().is_err());
    registration.password = "Abc123!@".into();
    registration.confirm_password = "Abc123!@".into();
    assert!(registration.validate().is_ok());
}

#[test]
fn registration_request_omits_confirmation() {
    let request = form("ada", "ada@example.com", "Abc123!@", "Abc123!@").to_request();
    assert_eq!(request.username, "ada");
    assert_eq!(request.email, "ada@example.com");
    assert_eq!(request.password, "Abc123!@");
}

#[test]
fn debug_output_hides_passwords() {
    let rendered = format!("{:?}", form("ada", "ada@example.com", "Abc123!@", "Abc123!@"));
    assert!(!rendered.contains("Abc123!@"));
}

#[test]
fn password_change_requires_matching_confirmation() {
    let change = PasswordChangeForm {
        current_password: "old".into(),
        new_password: "Newpass1!".into(),
        confirm_password: "Newpass2!".into(),
    };
    let errors = change.validate().unwrap_err();
    assert_eq!(errors.get(Field::ConfirmPassword), Some("New passwords don't match"));
}

#[test]
fn password_change_enforces_min_length() {
    let change = PasswordChangeForm {
        current_password: "old".into(),
        new_password: "short".into(),
        confirm_password: "short".into(),
    };
    let errors = change.validate().unwrap_err();
    assert_eq!(errors.get(Field::NewPassword), Some("Password must be at least 8 characters"));
    assert_eq!(errors.get(Field::ConfirmPassword), None);
}

#[test]
fn url_input_must_not_be_blank() {
    assert_eq!(validate_url_input("  https://example.com  ").unwrap(), "https://example.com");
    let errors = validate_url_input("   ").unwrap_err();
    assert_eq!(errors.get(Field::Url), Some("URL is required"));
    assert_eq!(errors.to_string(), "url: URL is required");
}

#[test]
fn password_length_counts_utf16_units() {
    assert_eq!(password_error("Ab1!😀😀"), None);
    assert_eq!(password_error("Ab1!😀"), Some("Password must be at least 8 characters"));

    let change = PasswordChangeForm {
        current_password: "old".into(),
        new_password: "Ab1!😀😀".into(),
        confirm_password: "Ab1!😀😀".into(),
    };
    assert!(change.validate().is_ok());
}
