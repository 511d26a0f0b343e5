//! Sanitization of free-text fields, phone numbers, and the attribute bag.
//!
//! Runs after validation and before persistence. Output is a typed
//! [`CleanContent`] so later stages cannot observe unsanitized input.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::listing::{Condition, ListingUpdate, PriceType};
use crate::validation::CreateListingRequest;

/// Attribute key carrying the offered/wanted discriminator.
pub const ATTR_LISTING_TYPE: &str = "listing_type";

/// Attribute key that must never appear in the bag; condition is a
/// first-class field.
pub const ATTR_CONDITION: &str = "condition";

/// Default discriminator when the client omits `listing_type`.
pub const DEFAULT_LISTING_TYPE: &str = "offered";

fn markup_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("static regex"))
}

/// Strip markup tags and control characters from free text, collapsing the
/// result's surrounding whitespace.
pub fn strip_markup(text: &str) -> String {
    let without_tags = markup_re().replace_all(text, "");
    without_tags
        .chars()
        .filter(|ch| !ch.is_control() || *ch == '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Canonical phone form: optional leading `+` followed by digits only.
/// An international `00` prefix is rewritten to `+`.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|ch| ch.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        format!("+{digits}")
    } else if let Some(rest) = digits.strip_prefix("00") {
        format!("+{rest}")
    } else {
        digits
    }
}

/// Defensively remove quote characters from free-text search input before
/// it reaches the query builder.
pub fn strip_query_quotes(query: &str) -> String {
    query
        .chars()
        .filter(|ch| !matches!(ch, '\'' | '"' | '`'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Sanitized, typed listing content ready for slug assignment and persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanContent {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub price_type: PriceType,
    pub category: String,
    pub condition: Option<Condition>,
    pub images: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub location: String,
    pub area_id: Option<String>,
    pub seller_phone: String,
    pub seller_whatsapp: String,
}

/// Sanitize a validated creation payload.
///
/// Merges the `listing_type` discriminator into the attribute bag, drops any
/// stray `condition` attribute, normalizes phone numbers, and defaults the
/// WhatsApp contact to the sanitized phone.
pub fn sanitize_create(request: &CreateListingRequest) -> Result<CleanContent, String> {
    let price_type = PriceType::parse(&request.price_type)
        .ok_or_else(|| format!("unknown price_type '{}'", request.price_type))?;
    let condition = match request.condition.as_deref() {
        Some(raw) => Some(Condition::parse(raw).ok_or_else(|| format!("unknown condition '{raw}'"))?),
        None => None,
    };

    let mut attributes: BTreeMap<String, String> = request
        .attributes
        .iter()
        .map(|(key, value)| (key.trim().to_string(), strip_markup(value)))
        .collect();
    attributes.remove(ATTR_CONDITION);
    let listing_type = request
        .listing_type
        .as_deref()
        .unwrap_or(DEFAULT_LISTING_TYPE);
    attributes.insert(ATTR_LISTING_TYPE.to_string(), listing_type.to_string());

    let seller_phone = normalize_phone(&request.seller_phone);
    let seller_whatsapp = request
        .seller_whatsapp
        .as_deref()
        .map(normalize_phone)
        .unwrap_or_else(|| seller_phone.clone());

    Ok(CleanContent {
        title: strip_markup(&request.title),
        description: strip_markup(&request.description),
        price: request.price,
        price_type,
        category: request.category.trim().to_string(),
        condition,
        images: request.images.iter().map(|path| path.trim().to_string()).collect(),
        location: strip_markup(&request.location),
        area_id: request
            .area_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        attributes,
        seller_phone,
        seller_whatsapp,
    })
}

/// Sanitize a validated partial update in place.
pub fn sanitize_update(update: &ListingUpdate) -> ListingUpdate {
    let mut clean = update.clone();
    if let Some(title) = clean.title.take() {
        clean.title = Some(strip_markup(&title));
    }
    if let Some(description) = clean.description.take() {
        clean.description = Some(strip_markup(&description));
    }
    if let Some(location) = clean.location.take() {
        clean.location = Some(strip_markup(&location));
    }
    if let Some(phone) = clean.seller_phone.take() {
        clean.seller_phone = Some(normalize_phone(&phone));
    }
    if let Some(whatsapp) = clean.seller_whatsapp.take() {
        clean.seller_whatsapp = Some(normalize_phone(&whatsapp));
    }
    if let Some(attributes) = clean.attributes.take() {
        let mut bag: BTreeMap<String, String> = attributes
            .iter()
            .map(|(key, value)| (key.trim().to_string(), strip_markup(value)))
            .collect();
        bag.remove(ATTR_CONDITION);
        clean.attributes = Some(bag);
    }
    clean
}
