/*
 * Responsibility
 * - Smeta request/response DTOs
 * - Ids leave the API sqids-encoded; the internal BIGSERIAL never shows
 * - Estimate blocks stay free-form JSON; only the fields pricing depends on are checked
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::repos::smeta_repo::SmetaData;
use crate::services::pricing::DetailedPrices;

pub const STATUSES: [&str; 5] = ["draft", "pending", "in-progress", "completed", "archived"];

pub const DEFAULT_LIMIT: i64 = 50;
pub const MAX_LIMIT: i64 = 100;

pub fn is_valid_status(status: &str) -> bool {
    STATUSES.contains(&status)
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

fn non_empty_str(block: &Value, field: &str) -> bool {
    block
        .get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn positive_number(block: &Value, field: &str) -> bool {
    let n = match block.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    n.is_some_and(|v| v.is_finite() && v > 0.0)
}

#[derive(Debug, Deserialize)]
pub struct SmetaPayload {
    #[serde(default = "empty_object")]
    pub customer: Value,
    #[serde(default = "empty_object")]
    pub production: Value,
    #[serde(default = "empty_object")]
    pub installation: Value,
    #[serde(default = "empty_object", rename = "additionalOptions", alias = "additional_options")]
    pub additional_options: Value,
    #[serde(default = "empty_object")]
    pub geolocation: Value,
    pub status: Option<String>,
}

impl SmetaPayload {
    pub fn data(&self) -> SmetaData<'_> {
        SmetaData {
            customer: &self.customer,
            production: &self.production,
            installation: &self.installation,
            additional_options: &self.additional_options,
            geolocation: &self.geolocation,
        }
    }

    /// Blocks must be JSON objects; a given status must be known.
    pub fn validate_shape(&self) -> Result<(), &'static str> {
        let blocks = [
            &self.customer,
            &self.production,
            &self.installation,
            &self.additional_options,
            &self.geolocation,
        ];
        if blocks.iter().any(|b| !b.is_object()) {
            return Err("estimate blocks must be JSON objects");
        }
        if let Some(status) = &self.status
            && !is_valid_status(status)
        {
            return Err("invalid status");
        }
        Ok(())
    }

    /// Creation additionally needs what the price depends on.
    pub fn validate_new(&self) -> Result<(), &'static str> {
        self.validate_shape()?;

        if !non_empty_str(&self.customer, "company") {
            return Err("company is required");
        }
        if !positive_number(&self.production, "length") {
            return Err("building length is required and must be a positive number");
        }
        if !positive_number(&self.production, "width") {
            return Err("building width is required and must be a positive number");
        }
        if !non_empty_str(&self.production, "foundation") {
            return Err("foundation type is required");
        }
        if !non_empty_str(&self.production, "walls") {
            return Err("wall type is required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub status: String,
}

impl StatusRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.status.is_empty() {
            return Err("status is required");
        }
        if !is_valid_status(&self.status) {
            return Err("invalid status");
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListQuery {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

impl SearchQuery {
    pub fn term(&self) -> Result<&str, &'static str> {
        match self.q.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            _ => Err("search term is required"),
        }
    }
}

/// One row of the dashboard list.
#[derive(Debug, Serialize)]
pub struct SmetaCard {
    pub id: String,
    pub company: String,
    pub parameters: String,
    pub price: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SmetaDetails {
    pub id: String,
    pub customer: Value,
    pub production: Value,
    pub installation: Value,
    pub additional_options: Value,
    pub geolocation: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub calculated_prices: DetailedPrices,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(v: Value) -> SmetaPayload {
        serde_json::from_value(v).unwrap()
    }

    fn valid() -> Value {
        json!({
            "customer": {"company": "ООО Ромашка"},
            "production": {"length": 12, "width": "8", "foundation": "slab", "walls": "sandwich"},
            "additionalOptions": {"gates": 2}
        })
    }

    #[test]
    fn accepts_complete_estimate() {
        let p = payload(valid());
        assert!(p.validate_new().is_ok());
        assert_eq!(p.additional_options, json!({"gates": 2}));
        assert_eq!(p.geolocation, json!({}));
    }

    #[test]
    fn rejects_missing_business_fields() {
        let mut v = valid();
        v["customer"]["company"] = json!("   ");
        assert_eq!(payload(v).validate_new(), Err("company is required"));

        let mut v = valid();
        v["production"]["length"] = json!(0);
        assert!(payload(v).validate_new().is_err());

        let mut v = valid();
        v["production"]["width"] = json!("wide");
        assert!(payload(v).validate_new().is_err());

        let mut v = valid();
        v["production"].as_object_mut().unwrap().remove("walls");
        assert_eq!(payload(v).validate_new(), Err("wall type is required"));
    }

    #[test]
    fn shape_checks_blocks_and_status() {
        let p = payload(json!({"customer": "acme"}));
        assert!(p.validate_shape().is_err());

        let p = payload(json!({"status": "done"}));
        assert_eq!(p.validate_shape(), Err("invalid status"));

        let p = payload(json!({"status": "in-progress"}));
        assert!(p.validate_shape().is_ok());
    }

    #[test]
    fn list_query_clamps() {
        let q = ListQuery::default();
        assert_eq!((q.limit(), q.offset()), (50, 0));

        let q = ListQuery {
            limit: Some(1000),
            offset: Some(-5),
        };
        assert_eq!((q.limit(), q.offset()), (100, 0));

        let q = ListQuery {
            limit: Some(0),
            offset: Some(20),
        };
        assert_eq!((q.limit(), q.offset()), (1, 20));
    }

    #[test]
    fn search_term_required() {
        assert!(SearchQuery { q: None }.term().is_err());
        assert!(SearchQuery { q: Some("  ".into()) }.term().is_err());
        assert_eq!(SearchQuery { q: Some(" роМ ".into()) }.term(), Ok("роМ"));
    }

    #[test]
    fn status_request() {
        assert!(StatusRequest { status: "archived".into() }.validate().is_ok());
        assert!(StatusRequest { status: "".into() }.validate().is_err());
        assert!(StatusRequest { status: "deleted".into() }.validate().is_err());
    }
}
