use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::fmt;

pub const NAME_MAX_LEN: usize = 200;
pub const CONTACT_MAX_LEN: usize = 200;
pub const REFERENCE_MAX_LEN: usize = 255;
pub const REASON_MAX_LEN: usize = 1000;
pub const EMAIL_MAX_LEN: usize = 254;
pub const MONEY_MAX_SCALE: i64 = 2;
/// Whole-unit digits that fit a `NUMERIC(20,2)` column.
pub const MONEY_MAX_INTEGER_DIGITS: u32 = 18;
pub const RATE_MAX_SCALE: i64 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Collapses runs of whitespace to one space and drops other control
/// characters.
pub fn sanitize_string(value: &str) -> String {
    value
        .split_whitespace()
        .map(|word| word.chars().filter(|ch| !ch.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn validate_required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }

    Ok(())
}

pub fn validate_max_len(field: &'static str, value: &str, max_len: usize) -> ValidationResult {
    if value.chars().count() > max_len {
        return Err(ValidationError::new(
            field,
            format!("must be at most {} characters", max_len),
        ));
    }

    Ok(())
}

/// Sanitizes `value` and checks it is present and within `max_len`.
pub fn clean_text(
    field: &'static str,
    value: &str,
    max_len: usize,
) -> Result<String, ValidationError> {
    let cleaned = sanitize_string(value);
    validate_required(field, &cleaned)?;
    validate_max_len(field, &cleaned, max_len)?;
    Ok(cleaned)
}

/// Like [`clean_text`] but an absent or blank value yields `None`.
pub fn clean_optional_text(
    field: &'static str,
    value: Option<&str>,
    max_len: usize,
) -> Result<Option<String>, ValidationError> {
    match value.map(sanitize_string) {
        Some(cleaned) if !cleaned.is_empty() => {
            validate_max_len(field, &cleaned, max_len)?;
            Ok(Some(cleaned))
        }
        _ => Ok(None),
    }
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = clean_text("email", email, EMAIL_MAX_LEN)?.to_lowercase();

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(' ')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::new("email", "must be a valid email address"));
    }

    Ok(email)
}

/// Positive, expressible in whole cents and small enough to store.
pub fn validate_money(field: &'static str, amount: &BigDecimal) -> ValidationResult {
    if amount <= &BigDecimal::from(0) {
        return Err(ValidationError::new(field, "must be greater than zero"));
    }

    if amount >= &BigDecimal::from(10_i64.pow(MONEY_MAX_INTEGER_DIGITS)) {
        return Err(ValidationError::new(
            field,
            format!(
                "must have at most {} digits before the decimal point",
                MONEY_MAX_INTEGER_DIGITS
            ),
        ));
    }

    if amount.with_scale(MONEY_MAX_SCALE) != *amount {
        return Err(ValidationError::new(field, "must not have more than 2 decimal places"));
    }

    Ok(())
}

/// A percentage in `(0, 100]`.
pub fn validate_rate(field: &'static str, rate: &BigDecimal) -> ValidationResult {
    if rate <= &BigDecimal::from(0) || rate > &BigDecimal::from(100) {
        return Err(ValidationError::new(field, "must be greater than 0 and at most 100"));
    }

    if rate.with_scale(RATE_MAX_SCALE) != *rate {
        return Err(ValidationError::new(field, "must not have more than 4 decimal places"));
    }

    Ok(())
}

pub fn validate_not_past(
    field: &'static str,
    date: NaiveDate,
    today: NaiveDate,
) -> ValidationResult {
    if date < today {
        return Err(ValidationError::new(field, "must not be in the past"));
    }

    Ok(())
}

/// Accepts `YYYY-MM` with a real month.
pub fn validate_month(month: &str) -> ValidationResult {
    let parsed = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d");
    if month.trim().len() != 7 || parsed.is_err() {
        return Err(ValidationError::new("month", "must be formatted as YYYY-MM"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn validates_required_field() {
        assert!(validate_required("field", "value").is_ok());
        assert!(validate_required("field", "   ").is_err());
    }

    #[test]
    fn validates_max_len() {
        assert!(validate_max_len("field", "abc", 3).is_ok());
        assert!(validate_max_len("field", "abcd", 3).is_err());
    }

    #[test]
    fn sanitizes_string() {
        assert_eq!(sanitize_string("  hello\tworld  "), "hello world");
        assert_eq!(sanitize_string("single"), "single");
        assert_eq!(sanitize_string(" \n "), "");
        assert_eq!(sanitize_string("ab\u{0000}cd\u{0007}"), "abcd");
        assert_eq!(sanitize_string("Kunene\nFarms"), "Kunene Farms");
        assert_eq!(sanitize_string("a \u{0007} b"), "a b");
    }

    #[test]
    fn cleans_optional_text() {
        assert_eq!(clean_optional_text("postal", None, 10).unwrap(), None);
        assert_eq!(clean_optional_text("postal", Some("  "), 10).unwrap(), None);
        assert_eq!(
            clean_optional_text("postal", Some(" PO  Box 1 "), 10).unwrap(),
            Some("PO Box 1".to_string())
        );
        assert!(clean_optional_text("postal", Some("far too long value"), 10).is_err());
    }

    #[test]
    fn validates_email() {
        assert_eq!(validate_email(" Jane@Fund.NA ").unwrap(), "jane@fund.na");
        assert!(validate_email("jane").is_err());
        assert!(validate_email("@fund.na").is_err());
        assert!(validate_email("jane@fund").is_err());
    }

    #[test]
    fn validates_money_scale() {
        assert!(validate_money("amount", &dec("10000")).is_ok());
        assert!(validate_money("amount", &dec("0.01")).is_ok());
        assert!(validate_money("amount", &dec("0.001")).is_err());
        assert!(validate_money("amount", &dec("-5")).is_err());
    }

    #[test]
    fn rejects_money_too_large_to_store() {
        assert!(validate_money("amount", &dec("999999999999999999.99")).is_ok());
        assert!(validate_money("amount", &dec("1000000000000000000")).is_err());
        assert!(validate_money("amount", &dec("1000000000000000000000.00")).is_err());
    }

    #[test]
    fn validates_rate_bounds() {
        assert!(validate_rate("interest_rate", &dec("12.5")).is_ok());
        assert!(validate_rate("interest_rate", &dec("100")).is_ok());
        assert!(validate_rate("interest_rate", &dec("0")).is_err());
        assert!(validate_rate("interest_rate", &dec("100.01")).is_err());
        assert!(validate_rate("interest_rate", &dec("12.1234")).is_ok());
        assert!(validate_rate("interest_rate", &dec("12.12345")).is_err());
    }

    #[test]
    fn validates_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        assert!(validate_not_past("settlement_date", today, today).is_ok());
        assert!(validate_not_past("settlement_date", today.pred_opt().unwrap(), today).is_err());
    }

    #[test]
    fn validates_month() {
        assert!(validate_month("2025-01").is_ok());
        assert!(validate_month("2025-13").is_err());
        assert!(validate_month("2025-1").is_err());
        assert!(validate_month("January").is_err());
    }
}
