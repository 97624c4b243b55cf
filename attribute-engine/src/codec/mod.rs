//! Value codec - per data type normalize / denormalize / validate
//!
//! Every data type owns one [`Codec`] entry in a static table. Nothing else
//! in the crate branches on the data type to transform a value.
//!
//! - `normalize`: wire payload -> in-memory value
//! - `denormalize`: in-memory value -> wire payload
//! - `validate`: whether a value may be saved
//!
//! All three are total: malformed input never panics or errors, it is either
//! kept as-is (JSON-encoded types) or normalized to `null` (dates).

mod compound;
mod scalar;

use serde_json::Value;
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::DataType;

/// Strategy entry for one data type
#[derive(Clone, Copy)]
pub struct Codec {
    pub normalize: fn(&Value) -> Value,
    pub denormalize: fn(&Value) -> Value,
    pub validate: fn(&Value) -> bool,
}

static TEXT: Codec = Codec {
    normalize: scalar::identity,
    denormalize: scalar::identity,
    validate: scalar::validate_text,
};

static URL: Codec = Codec {
    normalize: scalar::identity,
    denormalize: scalar::identity,
    validate: scalar::validate_url,
};

static EMAIL: Codec = Codec {
    normalize: scalar::identity,
    denormalize: scalar::identity,
    validate: scalar::validate_email,
};

static PHONE: Codec = Codec {
    normalize: scalar::identity,
    denormalize: scalar::identity,
    validate: scalar::validate_phone,
};

static NUMBER: Codec = Codec {
    normalize: scalar::normalize_number,
    denormalize: scalar::identity,
    validate: scalar::validate_number,
};

static BOOLEAN: Codec = Codec {
    normalize: scalar::normalize_boolean,
    denormalize: scalar::identity,
    validate: scalar::validate_boolean,
};

static DATE: Codec = Codec {
    normalize: scalar::normalize_date,
    denormalize: scalar::identity,
    validate: scalar::validate_date,
};

static PRICE: Codec = Codec {
    normalize: compound::normalize_price,
    denormalize: compound::denormalize_price,
    validate: compound::validate_price,
};

static MEASUREMENT: Codec = Codec {
    normalize: compound::normalize_measurement,
    denormalize: compound::denormalize_measurement,
    validate: compound::validate_measurement,
};

static MEDIA: Codec = Codec {
    normalize: compound::normalize_media,
    denormalize: compound::denormalize_media,
    validate: compound::validate_media,
};

/// Look up the codec for a data type
pub fn codec(data_type: DataType) -> &'static Codec {
    match data_type {
        DataType::Text | DataType::RichText => &TEXT,
        DataType::Url => &URL,
        DataType::Email => &EMAIL,
        DataType::Phone => &PHONE,
        DataType::Number => &NUMBER,
        DataType::Boolean => &BOOLEAN,
        DataType::Date => &DATE,
        DataType::Price => &PRICE,
        DataType::Measurement => &MEASUREMENT,
        DataType::Media => &MEDIA,
    }
}

/// Wire payload -> in-memory value
pub fn normalize(raw: &Value, data_type: DataType) -> Value {
    (codec(data_type).normalize)(raw)
}

/// In-memory value -> wire payload
pub fn denormalize(value: &Value, data_type: DataType) -> Value {
    (codec(data_type).denormalize)(value)
}

/// Whether `value` is acceptable for `data_type`
///
/// `null` is always valid: it is how a cleared field is saved.
pub fn validate(value: &Value, data_type: DataType) -> bool {
    (codec(data_type).validate)(value)
}

/// Validate, normalize and denormalize a user-supplied value for persistence
///
/// Fails with a validation error before anything reaches the catalog service.
pub fn encode_for_save(value: &Value, data_type: DataType) -> AppResult<Value> {
    if !validate(value, data_type) {
        let code = match data_type {
            DataType::Number => ErrorCode::InvalidNumber,
            DataType::Boolean => ErrorCode::InvalidBoolean,
            DataType::Date => ErrorCode::InvalidDate,
            DataType::Url | DataType::Email | DataType::Phone => ErrorCode::InvalidFormat,
            _ => ErrorCode::ValidationFailed,
        };
        return Err(AppError::with_message(
            code,
            format!("Invalid {} value", data_type),
        )
        .with_detail("data_type", data_type.as_str())
        .with_detail("value", value.clone()));
    }

    let normalized = normalize(value, data_type);
    Ok(denormalize(&normalized, data_type))
}
