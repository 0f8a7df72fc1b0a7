//! services/enhancer_service.rs
//! Reescritura opcional del cuerpo del correo con Gemini.
//! Ante cualquier fallo se devuelve el texto original, nunca un error.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

#[derive(Debug, Clone)]
pub struct EnhanceContext {
    pub company: String,
    pub role: String,
}

#[async_trait]
pub trait TextEnhancer: Send + Sync {
    async fn enhance(&self, text: &str, ctx: &EnhanceContext, api_key: &str) -> String;
}

#[derive(Clone)]
pub struct GeminiEnhancer {
    http_client: Client,
    base_url: String,
    /// Tope para toda la llamada (conexión + respuesta)
    request_timeout: Duration,
}

impl GeminiEnhancer {
    pub fn new(base_url: String, request_timeout: Duration) -> Self {
        Self {
            http_client: Client::new(),
            base_url,
            request_timeout,
        }
    }

    async fn request_rewrite(&self, text: &str, ctx: &EnhanceContext, api_key: &str) -> Result<String> {
        let prompt = format!(
            "Rewrite this job application email to sound more natural and professional for {} ({} position). \
             Keep it concise under 200 words.\n\n{}",
            ctx.company, ctx.role, text
        );
        let url = format!("{}?key={}", self.base_url, urlencoding::encode(api_key));
        let payload = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": 0.7, "maxOutputTokens": 500 }
        });

        let resp = self
            .http_client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("Fallo al llamar a Gemini")?;

        if !resp.status().is_success() {
            return Err(anyhow!("Gemini respondió {}", resp.status()));
        }

        let body = resp.json::<Value>().await.context("Respuesta de Gemini no es JSON")?;
        extract_candidate_text(&body).ok_or_else(|| anyhow!("Respuesta de Gemini sin texto"))
    }
}

#[async_trait]
impl TextEnhancer for GeminiEnhancer {
    async fn enhance(&self, text: &str, ctx: &EnhanceContext, api_key: &str) -> String {
        if api_key.is_empty() {
            return text.to_string();
        }
        let result = tokio::time::timeout(
            self.request_timeout,
            self.request_rewrite(text, ctx, api_key),
        )
        .await
        .unwrap_or_else(|_| Err(anyhow!("Gemini no respondió en {:?}", self.request_timeout)));

        match result {
            Ok(rewritten) => rewritten,
            Err(e) => {
                log::warn!("AI enhancement failed, using original text: {:#}", e);
                text.to_string()
            }
        }
    }
}

/// candidates[0].content.parts[0].text
pub fn extract_candidate_text(body: &Value) -> Option<String> {
    body.get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
