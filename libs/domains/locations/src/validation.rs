//! Address field rules.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{ValidationError, ValidationErrors};

use crate::countries::canonical_country;
use crate::error::{LocationError, LocationResult};

/// Letters (any script) with inner spaces, hyphens, apostrophes and periods.
static CITY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{L}[\p{L}\p{M} '’.\-]*$").unwrap());

static POST_CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 \-]{0,11}$").unwrap());

/// Split on the separators people put between address parts.
static ADDRESS_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,_\-]+").unwrap());

const FIELD_MAX: usize = 100;

fn invalid(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    ValidationError::new(code).with_message(message.into())
}

pub fn validate_country(country: &str) -> Result<(), ValidationError> {
    if country.trim().is_empty() {
        return Err(invalid("country_required", "Country name is required"));
    }
    match canonical_country(country) {
        Some(_) => Ok(()),
        None => Err(invalid(
            "country",
            format!("{} is not a valid country", country.trim()),
        )),
    }
}

pub fn validate_city(city: &str) -> Result<(), ValidationError> {
    let city = city.trim();
    if city.is_empty() {
        return Err(invalid("city_required", "City name is required"));
    }
    if city.chars().count() > FIELD_MAX || !CITY_RE.is_match(city) {
        return Err(invalid("city", format!("{city} is not a valid city name")));
    }
    Ok(())
}

pub fn validate_post_code(post_code: &str) -> Result<(), ValidationError> {
    if POST_CODE_RE.is_match(post_code.trim()) {
        Ok(())
    } else {
        Err(invalid(
            "post_code",
            format!("{} is not a valid postcode", post_code.trim()),
        ))
    }
}

/// Free-form address parts (district, ward, street, number).
pub fn validate_address_part(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() > FIELD_MAX {
        return Err(invalid(
            "address_part",
            "Address fields cannot exceed 100 characters",
        ));
    }
    Ok(())
}

/// Non-empty tokens of a free-text address query.
pub fn address_tokens(address: &str) -> Vec<String> {
    ADDRESS_SEPARATORS
        .split(address.trim())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse an optional coordinate query parameter; blank counts as absent.
pub fn parse_coordinate(name: &str, raw: Option<&str>) -> LocationResult<Option<f64>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(Some)
        .ok_or_else(|| LocationError::Validation(format!("{name} must be a number")))
}

/// Human-readable message of the first failing field, ordered by field name.
pub fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    let mut names: Vec<_> = fields.keys().collect();
    names.sort();

    names
        .first()
        .and_then(|name| {
            fields.get(*name).and_then(|errs| errs.first()).map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid {}", name))
            })
        })
        .unwrap_or_else(|| "Invalid input".to_string())
}

pub fn check(result: Result<(), ValidationError>) -> LocationResult<()> {
    result.map_err(|e| {
        LocationError::Validation(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid input".to_string()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_messages() {
        assert!(validate_country("finland").is_ok());
        let err = validate_country("Narnia").unwrap_err();
        assert_eq!(err.message.unwrap(), "Narnia is not a valid country");
        let err = validate_country(" ").unwrap_err();
        assert_eq!(err.message.unwrap(), "Country name is required");
    }

    #[test]
    fn test_city_shapes() {
        for ok in ["Helsinki", "Saint-Étienne", "St. John's", "Hồ Chí Minh", "New York"] {
            assert!(validate_city(ok).is_ok(), "{ok}");
        }
        for bad in ["", "12345", "Berlin!", "-Oslo"] {
            assert!(validate_city(bad).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_post_code_shapes() {
        assert!(validate_post_code("00100").is_ok());
        assert!(validate_post_code("SW1A 1AA").is_ok());
        assert!(validate_post_code("1234-567").is_ok());
        assert!(validate_post_code("#123").is_err());
        assert!(validate_post_code("").is_err());
    }

    #[test]
    fn test_address_tokens() {
        assert_eq!(
            address_tokens(" Mannerheimintie 5, Helsinki_00100-Finland "),
            vec!["Mannerheimintie", "5", "Helsinki", "00100", "Finland"]
        );
        assert!(address_tokens(" ,, - ").is_empty());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate("Latitude", Some("60.17")).unwrap(), Some(60.17));
        assert_eq!(parse_coordinate("Latitude", Some("  ")).unwrap(), None);
        assert_eq!(parse_coordinate("Latitude", None).unwrap(), None);
        assert!(matches!(
            parse_coordinate("Longitude", Some("east")),
            Err(LocationError::Validation(m)) if m == "Longitude must be a number"
        ));
    }
}
