use crate::utils::error::{AdError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// GAM network codes are plain digit strings.
pub fn validate_numeric_id(field_name: &str, value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AdError::MissingConfigError {
            field: field_name.to_string(),
        });
    }
    if !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(AdError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value must contain digits only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(AdError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| AdError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AdError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(AdError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_numeric_id() {
        assert!(validate_numeric_id("network_id", "21804848220").is_ok());
        assert!(matches!(
            validate_numeric_id("network_id", "  "),
            Err(AdError::MissingConfigError { .. })
        ));
        assert!(validate_numeric_id("network_id", "12ab").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("seconds_to_wait_after_viewability", 30, 1).is_ok());
        assert!(validate_positive_number("seconds_to_wait_after_viewability", 0, 1).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("intersection_margin", 200, 0, 1000).is_ok());
        assert!(validate_range("intersection_margin", 1001, 0, 1000).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("x".to_string());
        assert_eq!(validate_required_field("item", &present).unwrap(), "x");
        assert!(validate_required_field::<String>("item", &None).is_err());
    }
}
