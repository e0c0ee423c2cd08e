//! Parameter parsing for query and path inputs.
//!
//! Every value arrives as a raw string and is validated here, before any
//! storage access. Out-of-range or unparseable values are rejected with a
//! field-addressed validation error rather than being clamped, and a
//! non-numeric path id is a validation error distinct from not-found.

use rust_decimal::Decimal;

use ftdb_core::{AvailabilityStatus, Gender, ImageType};

use super::ApiError;

pub(super) const DEFAULT_LIMIT: i64 = 50;
pub(super) const MAX_LIMIT: i64 = 1000;
pub(super) const DEFAULT_FULLTEXT_LIMIT: i64 = 10;
pub(super) const MAX_FULLTEXT_LIMIT: i64 = 100;

/// Parses `limit` with the standard list bounds [1, 1000], defaulting to 50.
pub(super) fn parse_limit(raw: Option<&str>) -> Result<i64, ApiError> {
    parse_limit_with(raw, DEFAULT_LIMIT, MAX_LIMIT)
}

/// Parses `limit` for the full-text endpoint (bounds [1, 100], default 10).
pub(super) fn parse_fulltext_limit(raw: Option<&str>) -> Result<i64, ApiError> {
    parse_limit_with(raw, DEFAULT_FULLTEXT_LIMIT, MAX_FULLTEXT_LIMIT)
}

fn parse_limit_with(raw: Option<&str>, default: i64, max: i64) -> Result<i64, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let limit: i64 = raw
        .parse()
        .map_err(|_| ApiError::validation("limit must be an integer", "limit"))?;
    if !(1..=max).contains(&limit) {
        return Err(ApiError::validation(
            format!("limit must be between 1 and {max}"),
            "limit",
        ));
    }
    Ok(limit)
}

/// Parses `offset` (>= 0, default 0). Negative offsets are rejected, not clamped.
pub(super) fn parse_offset(raw: Option<&str>) -> Result<i64, ApiError> {
    let Some(raw) = raw else {
        return Ok(0);
    };
    let offset: i64 = raw
        .parse()
        .map_err(|_| ApiError::validation("offset must be an integer", "offset"))?;
    if offset < 0 {
        return Err(ApiError::validation("offset must be >= 0", "offset"));
    }
    Ok(offset)
}

/// Parses a numeric path identifier. Failure is a validation error, never a 404.
pub(super) fn parse_path_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::validation("id must be an integer", "id"))
}

/// Parses an optional integer query filter.
pub(super) fn parse_i64(field: &str, raw: Option<&str>) -> Result<Option<i64>, ApiError> {
    raw.map(|v| {
        v.parse::<i64>()
            .map_err(|_| ApiError::validation(format!("{field} must be an integer"), field))
    })
    .transpose()
}

/// Parses an optional decimal query filter (prices).
pub(super) fn parse_decimal(field: &str, raw: Option<&str>) -> Result<Option<Decimal>, ApiError> {
    raw.map(|v| {
        v.parse::<Decimal>()
            .map_err(|_| ApiError::validation(format!("{field} must be a number"), field))
    })
    .transpose()
}

/// Parses an optional boolean query filter (`true`/`false`/`1`/`0`).
pub(super) fn parse_bool(field: &str, raw: Option<&str>) -> Result<Option<bool>, ApiError> {
    raw.map(|v| match v {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ApiError::validation(
            format!("{field} must be true or false"),
            field,
        )),
    })
    .transpose()
}

/// Validates an optional `image_type` filter against the known polarities.
pub(super) fn parse_image_type(raw: Option<&str>) -> Result<Option<&'static str>, ApiError> {
    raw.map(|v| {
        ImageType::parse(v).map(ImageType::as_str).ok_or_else(|| {
            ApiError::validation("image_type must be 'positive' or 'negative'", "image_type")
        })
    })
    .transpose()
}

/// Validates an optional `gender` filter.
pub(super) fn parse_gender(raw: Option<&str>) -> Result<Option<&'static str>, ApiError> {
    raw.map(|v| {
        Gender::parse(v).map(Gender::as_str).ok_or_else(|| {
            ApiError::validation("gender must be 'male', 'female', or 'unisex'", "gender")
        })
    })
    .transpose()
}

/// Validates an optional `availability_status` filter.
pub(super) fn parse_availability(raw: Option<&str>) -> Result<Option<&'static str>, ApiError> {
    raw.map(|v| {
        AvailabilityStatus::parse(v)
            .map(AvailabilityStatus::as_str)
            .ok_or_else(|| {
                ApiError::validation(
                    "availability_status must be one of in_stock, out_of_stock, discontinued, pre_order",
                    "availability_status",
                )
            })
    })
    .transpose()
}
