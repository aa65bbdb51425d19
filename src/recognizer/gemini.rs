use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::GeminiConfig;
use crate::meals::{today_utc, MealEntry};
use crate::recognizer::{MealRecognizer, RecognitionError};

const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Instruction fixed by the application; the model must answer with the
/// plain JSON object described here, all numeric fields zero for non-food.
const SYSTEM_PROMPT: &str = "\
You are an expert nutritionist. Your job is to analyze photos of food. \
You must answer STRICTLY as JSON with exactly these fields:
1. \"dish_name\": short description.
2. \"calories_kcal\": an integer.
3. \"protein_g\": approximate integer grams.
4. \"carbs_g\": approximate integer grams.
5. \"fat_g\": approximate integer grams.
If the photo is not food, answer with every numeric value set to 0. \
Do not wrap the answer in markdown code blocks, output the plain JSON only.";

/// Meal recognizer backed by the Google Generative Language API.
pub struct GeminiRecognizer {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct GenerateRequest {
    system_instruction: Content,
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

/// Shape the model is instructed to answer with. Missing fields default to
/// zero so a partial answer degrades instead of failing.
#[derive(Deserialize)]
struct EstimatePayload {
    #[serde(default)]
    dish_name: String,
    #[serde(default)]
    calories_kcal: i64,
    #[serde(default)]
    protein_g: i64,
    #[serde(default)]
    carbs_g: i64,
    #[serde(default)]
    fat_g: i64,
}

impl GeminiRecognizer {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn from_config(config: &GeminiConfig) -> Self {
        Self::new(config.api_key.clone(), config.model.clone())
    }

    fn build_url(&self) -> String {
        format!(
            "{API_BASE_URL}/models/{}:generateContent?key={}",
            self.model, self.api_key
        )
    }

    fn build_request(image: &Bytes, hint: &str) -> GenerateRequest {
        let user_prompt = if hint.trim().is_empty() {
            "Analyze this food photo and estimate calories and macronutrients.".to_owned()
        } else {
            format!(
                "Analyze this photo. The user says it is: '{}'. Use that to improve accuracy.",
                hint.trim()
            )
        };
        GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: SYSTEM_PROMPT.to_owned(),
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg",
                            data: BASE64.encode(image),
                        },
                    },
                    Part::Text { text: user_prompt },
                ],
            }],
        }
    }
}

#[async_trait]
impl MealRecognizer for GeminiRecognizer {
    async fn recognize(&self, image: Bytes, hint: &str) -> Result<MealEntry, RecognitionError> {
        let request = Self::build_request(&image, hint);

        let response = self
            .client
            .post(self.build_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RecognitionError::Transport(e.to_string()))?;

        if !status.is_success() {
            error!(status = %status, "generative api error");
            return Err(RecognitionError::Api(format!("status {status}")));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| RecognitionError::Api(format!("malformed response envelope: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(RecognitionError::Api(err.message));
        }

        let text = extract_text(&parsed).ok_or(RecognitionError::EmptyResponse)?;
        debug!("received estimate text from model");

        Ok(entry_from_model_text(text, today_utc(), hint))
    }
}

fn extract_text(response: &GenerateResponse) -> Option<&str> {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.iter().find_map(|p| p.text.as_deref()))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Parse the model's JSON answer into a meal entry for `date`.
///
/// Markdown code fences are stripped first; an unparseable answer degrades
/// to an all-zero entry rather than an error, the same shape used for
/// non-food photos. Negative values clamp to zero.
fn entry_from_model_text(text: &str, date: String, hint: &str) -> MealEntry {
    let clean = text.replace("```json", "").replace("```", "");
    let source_description = if hint.trim().is_empty() {
        None
    } else {
        Some(hint.trim().to_owned())
    };

    match serde_json::from_str::<EstimatePayload>(clean.trim()) {
        Ok(payload) => {
            let name = if payload.dish_name.is_empty() {
                "Unknown dish".to_owned()
            } else {
                payload.dish_name
            };
            MealEntry {
                name,
                calories_kcal: clamp_to_u32(payload.calories_kcal),
                protein_g: clamp_to_u32(payload.protein_g),
                carbs_g: clamp_to_u32(payload.carbs_g),
                fat_g: clamp_to_u32(payload.fat_g),
                date,
                source_description,
            }
        }
        Err(e) => {
            warn!(error = %e, "could not parse model estimate; recording empty estimate");
            MealEntry {
                source_description,
                ..MealEntry::zero("Unrecognized meal", date)
            }
        }
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}
