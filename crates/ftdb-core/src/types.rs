//! Domain enums shared by the storage layer and the API surface.
//!
//! Values are stored as plain text columns with CHECK constraints, so each
//! enum round-trips through its canonical lowercase string form.

use serde::{Deserialize, Serialize};

/// Polarity of a trend reference image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    Positive,
    Negative,
}

impl ImageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ImageType::Positive => "positive",
            ImageType::Negative => "negative",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "positive" => Some(ImageType::Positive),
            "negative" => Some(ImageType::Negative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Unisex,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unisex => "unisex",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "unisex" => Some(Gender::Unisex),
            _ => None,
        }
    }
}

impl Default for Gender {
    fn default() -> Self {
        Gender::Unisex
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    InStock,
    OutOfStock,
    Discontinued,
    PreOrder,
}

impl AvailabilityStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AvailabilityStatus::InStock => "in_stock",
            AvailabilityStatus::OutOfStock => "out_of_stock",
            AvailabilityStatus::Discontinued => "discontinued",
            AvailabilityStatus::PreOrder => "pre_order",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "in_stock" => Some(AvailabilityStatus::InStock),
            "out_of_stock" => Some(AvailabilityStatus::OutOfStock),
            "discontinued" => Some(AvailabilityStatus::Discontinued),
            "pre_order" => Some(AvailabilityStatus::PreOrder),
            _ => None,
        }
    }
}

impl Default for AvailabilityStatus {
    fn default() -> Self {
        AvailabilityStatus::InStock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_type_round_trips_through_str() {
        for t in [ImageType::Positive, ImageType::Negative] {
            assert_eq!(ImageType::parse(t.as_str()), Some(t));
        }
        assert_eq!(ImageType::parse("neutral"), None);
    }

    #[test]
    fn availability_status_round_trips_through_str() {
        for s in [
            AvailabilityStatus::InStock,
            AvailabilityStatus::OutOfStock,
            AvailabilityStatus::Discontinued,
            AvailabilityStatus::PreOrder,
        ] {
            assert_eq!(AvailabilityStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(AvailabilityStatus::parse("backorder"), None);
    }

    #[test]
    fn gender_serde_uses_snake_case() {
        let json = serde_json::to_string(&Gender::Unisex).expect("serialize");
        assert_eq!(json, "\"unisex\"");
        let back: Gender = serde_json::from_str("\"female\"").expect("deserialize");
        assert_eq!(back, Gender::Female);
    }
}
