use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::classifier;
use crate::emotion::Emotion;
use crate::error::RemoteError;
use crate::models::{AnalysisKind, DiaryAnalysis};

const SYSTEM_PROMPT: &str = "당신은 따뜻하고 공감적인 감정 상담사입니다. 사용자의 일기를 분석하여 감정을 파악하고, \
공감과 위로, 그리고 실용적인 조언을 제공해주세요. \
응답은 다음 JSON 형식으로 해주세요:
{
  \"emotion\": \"감정 (행복함/우울함/스트레스/설렘/평온함/지침 중 하나)\",
  \"analysis\": \"일기에 대한 깊이 있는 분석 (2-3문장)\",
  \"advice\": \"실용적인 조언이나 해결책 (2-3문장)\",
  \"encouragement\": \"따뜻한 격려나 응원의 말 (1-2문장)\"
}";

/// What the caller shows when the model is unavailable.
pub fn fallback_analysis(reason: &str) -> DiaryAnalysis {
    DiaryAnalysis {
        emotion: Emotion::Calm,
        analysis: reason.to_string(),
        advice: "마음을 편안하게 하고, 자신에게 친절하게 대하세요.".to_string(),
        encouragement: "당신은 충분히 잘하고 있어요. 힘내세요!".to_string(),
    }
}

/// The row to persist for an analysis request. Only a real model answer is
/// stored as a remote analysis; otherwise the local verdict is recorded.
pub fn analysis_to_record(
    local: Emotion,
    answer: Option<DiaryAnalysis>,
) -> (DiaryAnalysis, AnalysisKind) {
    match answer {
        Some(analysis) => (analysis, AnalysisKind::Remote),
        None => (
            DiaryAnalysis {
                emotion: local,
                analysis: String::new(),
                advice: String::new(),
                encouragement: String::new(),
            },
            AnalysisKind::Local,
        ),
    }
}

pub struct ChatAnalyzer {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[derive(Deserialize)]
struct RawAnalysis {
    emotion: String,
    #[serde(default)]
    analysis: String,
    #[serde(default)]
    advice: String,
    #[serde(default)]
    encouragement: String,
}

impl ChatAnalyzer {
    pub fn new(client: Client, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        }
    }

    /// `Ok(None)` when no API key is configured.
    pub async fn analyze(&self, diary_text: &str) -> Result<Option<DiaryAnalysis>, RemoteError> {
        let Some(api_key) = self.api_key.as_deref() else {
            info!("OPENAI_API_KEY not set, skipping chat analysis");
            return Ok(None);
        };
        let prompt =
            format!("다음은 사용자가 작성한 일기입니다. 위의 형식에 맞춰 분석해주세요:\n\n{diary_text}");

        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
            "temperature": 0.7,
            "max_tokens": 500,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RemoteError::Status {
                service: "chat completion",
                status: response.status(),
            });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RemoteError::MalformedPayload("no choices returned".to_string()))?;

        parse_analysis(&content, diary_text).map(Some)
    }
}

/// Reads the model's JSON answer. Text around the outermost object is
/// ignored; an emotion outside the six labels is replaced by the local
/// classifier's verdict.
pub fn parse_analysis(content: &str, diary_text: &str) -> Result<DiaryAnalysis, RemoteError> {
    let start = content.find('{');
    let end = content.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(RemoteError::MalformedPayload(
                "no JSON object in model answer".to_string(),
            ))
        }
    };

    let raw: RawAnalysis =
        serde_json::from_str(json).map_err(|e| RemoteError::MalformedPayload(e.to_string()))?;

    let emotion = raw.emotion.parse::<Emotion>().unwrap_or_else(|e| {
        warn!("{e}, using local classification");
        classifier::classify(diary_text)
    });

    Ok(DiaryAnalysis {
        emotion,
        analysis: raw.analysis,
        advice: raw.advice,
        encouragement: raw.encouragement,
    })
}
