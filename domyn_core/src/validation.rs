//! Form validation.
//!
//! Every check runs before any state is touched and fails with
//! [`Error::Validation`] carrying the message shown to the user.

use crate::{Error, ExerciseDraft, PersonalProfile, Result, Weekday};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern compiles"));

const FILL_ALL_FIELDS: &str = "Please fill out all fields.";

fn require(condition: bool, message: impl Into<String>) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(Error::Validation(message.into()))
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn validate_email(email: &str) -> Result<()> {
    require(is_valid_email(email), "Please enter a valid email address.")
}

/// Sign-up form: all fields filled, matching passwords, minimum length,
/// well-formed email.
pub fn validate_credentials(
    email: &str,
    password: &str,
    retype_password: &str,
    min_password_length: usize,
) -> Result<()> {
    require(
        !email.trim().is_empty()
            && !password.trim().is_empty()
            && !retype_password.trim().is_empty(),
        FILL_ALL_FIELDS,
    )?;
    require(password == retype_password, "Passwords do not match.")?;
    require(
        password.chars().count() >= min_password_length,
        format!(
            "Password must be at least {} characters.",
            min_password_length
        ),
    )?;
    validate_email(email)
}

/// Login form: both fields filled
pub fn validate_login(email: &str, password: &str) -> Result<()> {
    require(
        !email.trim().is_empty() && !password.trim().is_empty(),
        FILL_ALL_FIELDS,
    )
}

/// Personal details: all filled, age and weight numeric
pub fn validate_profile(profile: &PersonalProfile) -> Result<()> {
    require(profile.is_complete(), FILL_ALL_FIELDS)?;
    require(
        profile.age.trim().parse::<u32>().is_ok(),
        "Age must be a whole number.",
    )?;
    require(
        profile
            .weight
            .trim()
            .parse::<f64>()
            .is_ok_and(|w| w.is_finite() && w > 0.0),
        "Weight must be a positive number.",
    )
}

/// Lenient integer parse: leading digits count, anything else is zero
fn parse_leading_int(text: &str) -> i64 {
    let trimmed = text.trim();
    let sign_len = usize::from(trimmed.starts_with('-') || trimmed.starts_with('+'));
    let digits: String = trimmed[sign_len..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    let value = digits.parse::<i64>().unwrap_or(0);
    if trimmed.starts_with('-') {
        -value
    } else {
        value
    }
}

/// Turn the add/edit exercise form into a draft.
///
/// Name, weight, reps and sets are required; weight, reps and sets must be
/// greater than zero. Rest time is optional.
pub fn parse_exercise_form(
    name: &str,
    weight: &str,
    reps: &str,
    sets: &str,
    rest_time: Option<&str>,
) -> Result<ExerciseDraft> {
    require(
        [name, weight, reps, sets]
            .iter()
            .all(|field| !field.trim().is_empty()),
        FILL_ALL_FIELDS,
    )?;

    let weight = parse_leading_int(weight);
    let reps = parse_leading_int(reps);
    let sets = parse_leading_int(sets);
    require(
        weight > 0 && reps > 0 && sets > 0,
        "Weight, reps, and sets must be greater than zero.",
    )?;

    let rest_time = rest_time.map(parse_leading_int).unwrap_or(0);
    require(rest_time >= 0, "Rest time cannot be negative.")?;

    let too_large = || Error::Validation("Value is too large.".into());
    Ok(ExerciseDraft {
        name: name.trim().to_string(),
        weight: weight as f64,
        reps: u32::try_from(reps).map_err(|_| too_large())?,
        sets: u32::try_from(sets).map_err(|_| too_large())?,
        rest_time: u32::try_from(rest_time).map_err(|_| too_large())?,
        notes: None,
    })
}

/// Workout name as entered on the customize screen: trimmed, bounded
pub fn validate_custom_name(name: &str, max_len: usize) -> Result<String> {
    let trimmed = name.trim();
    require(
        trimmed.chars().count() <= max_len,
        format!("Workout name must be at most {} characters.", max_len),
    )?;
    Ok(trimmed.to_string())
}

/// At least one workout day must be picked
pub fn validate_day_selection(days: &[Weekday]) -> Result<()> {
    require(!days.is_empty(), "Please select at least one day.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("me@example.com"));
        assert!(!is_valid_email("me@example"));
        assert!(!is_valid_email("plainaddress"));
        assert!(validate_email("a b@c.d").is_ok());
    }

    #[test]
    fn test_credentials() {
        assert!(validate_credentials("me@example.com", "secret1", "secret1", 6).is_ok());

        let err = validate_credentials("", "secret1", "secret1", 6).unwrap_err();
        assert_eq!(err.user_message(), "Please fill out all fields.");

        let err = validate_credentials("me@example.com", "secret1", "secret2", 6).unwrap_err();
        assert_eq!(err.user_message(), "Passwords do not match.");

        let err = validate_credentials("me@example.com", "abc", "abc", 6).unwrap_err();
        assert_eq!(err.user_message(), "Password must be at least 6 characters.");

        assert!(validate_credentials("nope", "secret1", "secret1", 6).is_err());
    }

    #[test]
    fn test_login() {
        assert!(validate_login("me@example.com", "pw").is_ok());
        assert!(validate_login("  ", "pw").is_err());
    }

    #[test]
    fn test_profile() {
        let mut profile = PersonalProfile {
            name: "Sam".into(),
            age: "30".into(),
            gender: "m".into(),
            weight: "180.5".into(),
        };
        assert!(validate_profile(&profile).is_ok());

        profile.age = "thirty".into();
        assert!(validate_profile(&profile).is_err());

        profile.age = "30".into();
        profile.weight = "".into();
        let err = validate_profile(&profile).unwrap_err();
        assert_eq!(err.user_message(), "Please fill out all fields.");
    }

    #[test]
    fn test_exercise_form() {
        let draft = parse_exercise_form(" Squat ", "135", "5", "3", Some("90")).unwrap();
        assert_eq!(draft.name, "Squat");
        assert_eq!(draft.weight, 135.0);
        assert_eq!(draft.reps, 5);
        assert_eq!(draft.sets, 3);
        assert_eq!(draft.rest_time, 90);

        let lenient = parse_exercise_form("Row", "45lbs", "10", "3", None).unwrap();
        assert_eq!(lenient.weight, 45.0);
        assert_eq!(lenient.rest_time, 0);
    }

    #[test]
    fn test_exercise_form_rejections() {
        let err = parse_exercise_form("Squat", "", "5", "3", None).unwrap_err();
        assert_eq!(err.user_message(), "Please fill out all fields.");

        let err = parse_exercise_form("Squat", "abc", "5", "3", None).unwrap_err();
        assert_eq!(
            err.user_message(),
            "Weight, reps, and sets must be greater than zero."
        );

        assert!(parse_exercise_form("Squat", "100", "-5", "3", None).is_err());
        assert!(parse_exercise_form("Squat", "100", "5", "3", Some("-1")).is_err());
    }

    #[test]
    fn test_custom_name() {
        assert_eq!(validate_custom_name("  Leg Day ", 12).unwrap(), "Leg Day");
        assert!(validate_custom_name("Thirteen char", 12).is_err());
        assert_eq!(validate_custom_name("", 12).unwrap(), "");
    }

    #[test]
    fn test_day_selection() {
        assert!(validate_day_selection(&[]).is_err());
        assert!(validate_day_selection(&[Weekday::Monday]).is_ok());
    }
}
