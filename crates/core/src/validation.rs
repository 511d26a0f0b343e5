//! Ordered structural/semantic validation of the raw creation payload.
//!
//! Checks run in a fixed order and stop at the first violation; that
//! violation's message is surfaced verbatim to the caller. The honeypot
//! check lives here too but is evaluated separately by the creation guard
//! (it must produce a generic error, not a field message).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::listing::{Condition, ListingUpdate, PriceType, MAX_IMAGES, MIN_IMAGES};

pub const TITLE_MIN: usize = 3;
pub const TITLE_MAX: usize = 120;
pub const DESCRIPTION_MIN: usize = 10;
pub const DESCRIPTION_MAX: usize = 5_000;
pub const PRICE_MAX: f64 = 999_999_999.0;
pub const LOCATION_MAX: usize = 160;
pub const CATEGORY_MAX: usize = 64;
pub const ATTRIBUTES_MAX: usize = 30;
pub const ATTRIBUTE_KEY_MAX: usize = 40;
pub const ATTRIBUTE_VALUE_MAX: usize = 200;

/// Accepted values for the `listing_type` discriminator.
pub const LISTING_TYPES: &[&str] = &["offered", "wanted"];

/// Raw, untrusted creation payload as submitted by the client.
///
/// `website` is the honeypot: a hidden form field real users never fill in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateListingRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub price_type: String,
    #[serde(default)]
    pub category: String,
    pub condition: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub location: String,
    pub area_id: Option<String>,
    #[serde(default)]
    pub seller_phone: String,
    pub seller_whatsapp: Option<String>,
    /// Offered vs. wanted; defaults to `offered` when absent.
    pub listing_type: Option<String>,
    /// Honeypot field. Any non-empty value marks the request as automated.
    pub website: Option<String>,
}

/// True when the hidden honeypot field carries any non-empty value.
pub fn honeypot_triggered(request: &CreateListingRequest) -> bool {
    request
        .website
        .as_deref()
        .is_some_and(|value| !value.trim().is_empty())
}

/// Validate a creation payload, returning the first violation message.
pub fn validate_create(request: &CreateListingRequest) -> Result<(), String> {
    validate_title(&request.title)?;
    validate_description(&request.description)?;
    validate_price(request.price)?;
    if PriceType::parse(&request.price_type).is_none() {
        return Err(format!(
            "price_type must be one of: fixed, negotiable, contact (got '{}')",
            request.price_type
        ));
    }
    validate_category(&request.category)?;
    if let Some(condition) = request.condition.as_deref() {
        validate_condition(condition)?;
    }
    validate_images(&request.images)?;
    validate_phone("seller_phone", &request.seller_phone)?;
    if let Some(whatsapp) = request.seller_whatsapp.as_deref() {
        validate_phone("seller_whatsapp", whatsapp)?;
    }
    if let Some(listing_type) = request.listing_type.as_deref() {
        if !LISTING_TYPES.contains(&listing_type) {
            return Err(format!(
                "listing_type must be one of: offered, wanted (got '{listing_type}')"
            ));
        }
    }
    validate_location(&request.location)?;
    validate_attributes(&request.attributes)?;
    Ok(())
}

/// Validate a partial field update; only present fields are checked.
pub fn validate_update(update: &ListingUpdate) -> Result<(), String> {
    if update.is_empty() {
        return Err("update must change at least one field".into());
    }
    if let Some(title) = update.title.as_deref() {
        validate_title(title)?;
    }
    if let Some(description) = update.description.as_deref() {
        validate_description(description)?;
    }
    if let Some(price) = update.price {
        validate_price(price)?;
    }
    if let Some(category) = update.category.as_deref() {
        validate_category(category)?;
    }
    if let Some(images) = update.images.as_deref() {
        validate_images(images)?;
    }
    if let Some(phone) = update.seller_phone.as_deref() {
        validate_phone("seller_phone", phone)?;
    }
    if let Some(whatsapp) = update.seller_whatsapp.as_deref() {
        validate_phone("seller_whatsapp", whatsapp)?;
    }
    if let Some(location) = update.location.as_deref() {
        validate_location(location)?;
    }
    if let Some(attributes) = update.attributes.as_ref() {
        validate_attributes(attributes)?;
    }
    Ok(())
}

fn validate_title(title: &str) -> Result<(), String> {
    let len = title.trim().chars().count();
    if len < TITLE_MIN {
        return Err(format!("title must be at least {TITLE_MIN} characters"));
    }
    if len > TITLE_MAX {
        return Err(format!("title must be at most {TITLE_MAX} characters"));
    }
    Ok(())
}

fn validate_description(description: &str) -> Result<(), String> {
    let len = description.trim().chars().count();
    if len < DESCRIPTION_MIN {
        return Err(format!(
            "description must be at least {DESCRIPTION_MIN} characters"
        ));
    }
    if len > DESCRIPTION_MAX {
        return Err(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        ));
    }
    Ok(())
}

fn validate_price(price: f64) -> Result<(), String> {
    if !price.is_finite() || price <= 0.0 {
        return Err("price must be a positive number".into());
    }
    if price > PRICE_MAX {
        return Err(format!("price must not exceed {PRICE_MAX}"));
    }
    Ok(())
}

fn validate_category(category: &str) -> Result<(), String> {
    let trimmed = category.trim();
    if trimmed.is_empty() {
        return Err("category is required".into());
    }
    if trimmed.chars().count() > CATEGORY_MAX {
        return Err(format!("category must be at most {CATEGORY_MAX} characters"));
    }
    Ok(())
}

fn validate_condition(condition: &str) -> Result<(), String> {
    if Condition::parse(condition).is_none() {
        return Err(format!(
            "condition must be one of: new, like_new, good, fair, poor (got '{condition}')"
        ));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> Result<(), String> {
    if images.len() < MIN_IMAGES {
        return Err(format!("at least {MIN_IMAGES} image is required"));
    }
    if images.len() > MAX_IMAGES {
        return Err(format!("at most {MAX_IMAGES} images are allowed"));
    }
    if images.iter().any(|path| path.trim().is_empty()) {
        return Err("image entries must not be empty".into());
    }
    Ok(())
}

/// Phone numbers: optional leading `+`, 7..=15 digits, with spaces,
/// parentheses, and dashes tolerated (stripped during sanitization).
fn validate_phone(field: &str, phone: &str) -> Result<(), String> {
    let trimmed = phone.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    let mut digits = 0usize;
    for (index, ch) in trimmed.chars().enumerate() {
        match ch {
            '0'..='9' => digits += 1,
            '+' if index == 0 => {}
            ' ' | '(' | ')' | '-' => {}
            _ => return Err(format!("{field} contains an invalid character '{ch}'")),
        }
    }
    if !(7..=15).contains(&digits) {
        return Err(format!("{field} must contain 7 to 15 digits"));
    }
    Ok(())
}

fn validate_location(location: &str) -> Result<(), String> {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return Err("location is required".into());
    }
    if trimmed.chars().count() > LOCATION_MAX {
        return Err(format!("location must be at most {LOCATION_MAX} characters"));
    }
    Ok(())
}

fn validate_attributes(attributes: &BTreeMap<String, String>) -> Result<(), String> {
    if attributes.len() > ATTRIBUTES_MAX {
        return Err(format!("at most {ATTRIBUTES_MAX} attributes are allowed"));
    }
    for (key, value) in attributes {
        if key.trim().is_empty() {
            return Err("attribute keys must not be empty".into());
        }
        if key.chars().count() > ATTRIBUTE_KEY_MAX {
            return Err(format!(
                "attribute key '{key}' exceeds {ATTRIBUTE_KEY_MAX} characters"
            ));
        }
        if value.chars().count() > ATTRIBUTE_VALUE_MAX {
            return Err(format!(
                "attribute '{key}' value exceeds {ATTRIBUTE_VALUE_MAX} characters"
            ));
        }
    }
    Ok(())
}
