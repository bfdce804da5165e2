//! OpenAI Chat Completions client used for clothing classification and
//! outfit suggestions.
//!
//! Both calls ask for strict JSON-schema structured output, so the reply can
//! be decoded straight into typed values.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{check_status, http_client, ClothingClassifier, OutfitStylist, ServiceError};
use crate::models::clothing::ClothingClassification;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

pub const CLASSIFY_PROMPT: &str = "Classify this clothing item.";

const STYLIST_INSTRUCTIONS: &str = "You are a personal stylist. Build one outfit from the \
user's closet inventory that fits their request. An outfit must contain at least a TOP, \
a BOTTOM and FOOTWEAR item; add HEADWEAR or OUTERWEAR only when it suits the request. \
Answer only with ids that appear in the inventory.";

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Value>,
    response_format: Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutfitSelection {
    outfit_item_ids: Vec<String>,
}

impl OpenAiClient {
    pub fn new(api_key: &str, model: &str) -> Result<Self, ServiceError> {
        Ok(OpenAiClient {
            client: http_client()?,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    async fn complete(&self, messages: Vec<Value>, response_format: Value) -> Result<String, ServiceError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            response_format,
        };

        let response = self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = check_status("OpenAI", response).await?;
        let body: ChatResponse = response.json().await?;
        extract_content(body)
    }
}

fn malformed(detail: impl Into<String>) -> ServiceError {
    ServiceError::Malformed {
        service: "OpenAI",
        detail: detail.into(),
    }
}

fn extract_content(body: ChatResponse) -> Result<String, ServiceError> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message)
        .ok_or_else(|| malformed("no choices returned"))?;
    if let Some(refusal) = message.refusal {
        return Err(malformed(format!("model refused: {}", refusal)));
    }
    message.content.ok_or_else(|| malformed("empty message content"))
}

pub fn clothing_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "clothing_item",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "type": { "type": "string", "enum": ["HEADWEAR", "TOP", "OUTERWEAR", "BOTTOM", "FOOTWEAR"] },
                    "primaryColor": { "type": "string" },
                    "secondaryColor": { "type": ["string", "null"] },
                    "otherColors": { "type": ["array", "null"], "items": { "type": "string" } },
                    "material": { "type": "string" },
                    "temperature": { "type": "string", "enum": ["HOT", "WARM", "MILD", "COLD", "FREEZING"] },
                    "description": { "type": "string" }
                },
                "required": ["type", "primaryColor", "secondaryColor", "otherColors", "material", "temperature", "description"],
                "additionalProperties": false
            }
        }
    })
}

pub fn outfit_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "outfit",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "outfitItemIds": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["outfitItemIds"],
                "additionalProperties": false
            }
        }
    })
}

pub fn classification_messages(image: &[u8], mime_type: &str) -> Vec<Value> {
    let data_url = format!("data:{};base64,{}", mime_type, STANDARD.encode(image));
    vec![json!({
        "role": "user",
        "content": [
            { "type": "text", "text": CLASSIFY_PROMPT },
            { "type": "image_url", "image_url": { "url": data_url } }
        ]
    })]
}

pub fn stylist_messages(request: &str, inventory: &[String]) -> Vec<Value> {
    let user_prompt = format!(
        "{}\n\nCloset inventory (one item per line):\n{}",
        request.trim(),
        inventory.join("\n")
    );
    vec![
        json!({ "role": "system", "content": STYLIST_INSTRUCTIONS }),
        json!({ "role": "user", "content": user_prompt }),
    ]
}

#[async_trait]
impl ClothingClassifier for OpenAiClient {
    async fn classify(&self, image: &[u8], mime_type: &str) -> Result<ClothingClassification, ServiceError> {
        let content = self
            .complete(classification_messages(image, mime_type), clothing_response_format())
            .await?;
        debug!("Classifier output: {}", content);
        serde_json::from_str(&content).map_err(|e| malformed(format!("classification: {}", e)))
    }
}

#[async_trait]
impl OutfitStylist for OpenAiClient {
    async fn suggest_outfit(&self, request: &str, inventory: &[String]) -> Result<Vec<String>, ServiceError> {
        let content = self
            .complete(stylist_messages(request, inventory), outfit_response_format())
            .await?;
        debug!("Stylist output: {}", content);
        let selection: OutfitSelection =
            serde_json::from_str(&content).map_err(|e| malformed(format!("outfit: {}", e)))?;
        Ok(selection.outfit_item_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_request_embeds_image_as_data_url() {
        let messages = classification_messages(b"\x89PNG", "image/png");
        let content = &messages[0]["content"];
        assert_eq!(content[0]["text"], CLASSIFY_PROMPT);
        assert_eq!(content[1]["image_url"]["url"], "data:image/png;base64,iVBORw==");
    }

    #[test]
    fn stylist_prompt_combines_request_and_inventory() {
        let inventory = vec!["id: 1, type: TOP".to_string(), "id: 2, type: BOTTOM".to_string()];
        let messages = stylist_messages("  date night  ", &inventory);

        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("TOP, a BOTTOM and FOOTWEAR"));

        let user = messages[1]["content"].as_str().unwrap();
        assert!(user.starts_with("date night\n\n"));
        assert!(user.ends_with("id: 1, type: TOP\nid: 2, type: BOTTOM"));
    }

    #[test]
    fn classification_schema_lists_every_field_as_required() {
        let format = clothing_response_format();
        let schema = &format["json_schema"]["schema"];
        let properties = schema["properties"].as_object().unwrap();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(properties.len(), required.len());
        assert_eq!(format["json_schema"]["strict"], true);
    }

    #[test]
    fn nullable_optional_fields_decode_to_none() {
        let content = r#"{"type":"TOP","primaryColor":"red","secondaryColor":null,"otherColors":null,"material":"cotton","temperature":"MILD","description":"red t-shirt"}"#;
        let parsed: ClothingClassification = serde_json::from_str(content).unwrap();
        assert_eq!(parsed.secondary_color, None);
        assert_eq!(parsed.description, "red t-shirt");
    }

    #[test]
    fn refusal_is_an_error() {
        let body: ChatResponse = serde_json::from_value(json!({
            "choices": [{ "message": { "content": null, "refusal": "cannot help" } }]
        }))
        .unwrap();
        assert!(matches!(extract_content(body), Err(ServiceError::Malformed { .. })));
    }

    #[test]
    fn empty_choices_are_an_error() {
        let body: ChatResponse = serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(extract_content(body).is_err());
    }
}
