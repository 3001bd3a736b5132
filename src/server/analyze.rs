//! # Product Analysis Endpoint
//!
//! `POST /analyze_product` turns a scanned product's details into a
//! nutrition assessment via the completion service. Stateless, and shares
//! nothing with the scanning path.

use axum::{body::Bytes, extract::State, Json};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::error::AnalyzeError;
use super::relay::AppState;

/// Request body as sent by the client. Every field is optional at this
/// level so that validation can report missing fields uniformly.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    product_name: Option<String>,
    product_ingredients: Option<Ingredients>,
    product_nutrients: Option<Map<String, Value>>,
    /// `{}` only when the key is absent; an explicit `null` is kept.
    #[serde(default = "no_preferences")]
    user_preferences: Value,
    ecoscore_grade: Option<Value>,
    food_groups: Option<Value>,
}

/// Ingredients arrive either pre-joined or as a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Ingredients {
    Text(String),
    List(Vec<String>),
}

impl Ingredients {
    fn joined(self) -> String {
        match self {
            Ingredients::Text(text) => text,
            Ingredients::List(items) => items.join(", "),
        }
    }
}

fn no_preferences() -> Value {
    Value::Object(Map::new())
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    message: String,
}

/// A validated product, ready to be rendered into a prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub name: String,
    pub ingredients: String,
    pub nutrients: String,
    pub preferences: String,
}

impl AnalyzeRequest {
    /// Check required fields and render nested objects as indented JSON.
    pub fn validate(self) -> Result<ProductQuery, AnalyzeError> {
        debug!(
            "ecoscore_grade={:?} food_groups={:?}",
            self.ecoscore_grade, self.food_groups
        );

        let (Some(name), Some(ingredients), Some(nutrients)) = (
            self.product_name.filter(|name| !name.is_empty()),
            self.product_ingredients,
            self.product_nutrients,
        ) else {
            warn!("Missing or invalid required fields");
            return Err(AnalyzeError::InvalidFields);
        };

        let nutrients = serde_json::to_string_pretty(&nutrients).map_err(|e| {
            warn!("Error serializing nutrients: {}", e);
            AnalyzeError::InvalidInput
        })?;
        let preferences = serde_json::to_string_pretty(&self.user_preferences).map_err(|e| {
            warn!("Error serializing preferences: {}", e);
            AnalyzeError::InvalidInput
        })?;

        Ok(ProductQuery {
            name,
            ingredients: ingredients.joined(),
            nutrients,
            preferences,
        })
    }
}

impl ProductQuery {
    /// Render the prompt sent to the completion service.
    pub fn prompt(&self) -> String {
        format!(
            "Assess the following food product for the user.\n\n\
             Product: {}\n\
             Ingredients: {}\n\
             Nutrients (per 100g):\n{}\n\
             User preferences:\n{}\n\n\
             Give a short, friendly verdict on whether this product suits the user \
             and mention any ingredient or nutrient worth watching.",
            self.name, self.ingredients, self.nutrients, self.preferences
        )
    }
}

/// Parse and validate a raw request body.
pub fn parse_request(body: &[u8]) -> Result<ProductQuery, AnalyzeError> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        warn!("Request body is not JSON: {}", e);
        AnalyzeError::InvalidInput
    })?;

    let request: AnalyzeRequest = serde_json::from_value(value).map_err(|e| {
        warn!("Request fields have the wrong shape: {}", e);
        AnalyzeError::InvalidFields
    })?;

    request.validate()
}

/// `POST /analyze_product`
pub async fn analyze_product(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let product = parse_request(&body)?;

    info!("🤖 Sending '{}' to the AI model", product.name);
    let message = state
        .completion
        .complete(&product.prompt())
        .await
        .map_err(|e| {
            error!("❌ Completion failed for '{}': {}", product.name, e);
            AnalyzeError::from(e)
        })?;
    info!("✅ AI model response received for '{}'", product.name);

    Ok(Json(AnalyzeResponse { message }))
}
