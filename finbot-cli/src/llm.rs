//! Language-model intent oracle.
//!
//! Only reached when the regex cascade found nothing. Every failure
//! (missing key, timeout, HTTP error, unparsable JSON) is logged and
//! becomes `None`, so the interpreter falls through to its own rules.

use anyhow::{Context, Result, anyhow, bail};
use finbot_assistant::oracle::{CLASSIFIER_PROMPT, parse_signal};
use finbot_assistant::{IntentOracle, IntentSignal};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::auth::Credentials;
use crate::config::LlmSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Anthropic,
    OpenAI,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "anthropic" => Ok(Provider::Anthropic),
            other => bail!("unknown llm provider: {other} (expected openai or anthropic)"),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Provider::OpenAI => "OPENAI_API_KEY",
            Provider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }

    pub fn key_prefix(&self) -> &'static str {
        match self {
            Provider::OpenAI => "sk-",
            Provider::Anthropic => "sk-ant-",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LlmOracle {
    provider: Provider,
    model: String,
    base_url: String,
    temperature: f32,
    timeout: Duration,
    api_key: String,
}

impl LlmOracle {
    /// `Ok(None)` when the model is disabled or no credential is available.
    pub fn from_config(cfg: &LlmSection) -> Result<Option<Self>> {
        if !cfg.enabled {
            return Ok(None);
        }
        let provider = Provider::parse(&cfg.provider)?;
        let Some(api_key) = Credentials::load()?.key_for(provider) else {
            tracing::warn!(provider = %cfg.provider, "llm enabled but no API key; running without it");
            return Ok(None);
        };
        Ok(Some(Self {
            provider,
            model: cfg.model.clone(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            temperature: cfg.temperature,
            timeout: Duration::from_secs(cfg.timeout_secs.max(1)),
            api_key,
        }))
    }

    fn complete(&self, text: &str) -> Result<String> {
        // The CLI runs under #[tokio::main]; a nested block_on would panic,
        // so hop out with block_in_place when a runtime is already present.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            tokio::task::block_in_place(|| handle.block_on(self.complete_async(text)))
        } else {
            let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
            rt.block_on(self.complete_async(text))
        }
    }

    async fn complete_async(&self, text: &str) -> Result<String> {
        let call = async {
            match self.provider {
                Provider::OpenAI => self.openai_complete(text).await,
                Provider::Anthropic => self.anthropic_complete(text).await,
            }
        };
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| anyhow!("llm request timed out after {:?}", self.timeout))?
    }

    async fn openai_complete(&self, text: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct ResponseFormat {
            #[serde(rename = "type")]
            t: &'static str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            response_format: ResponseFormat,
        }

        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MsgOut,
        }

        #[derive(Deserialize)]
        struct MsgOut {
            content: Option<String>,
        }

        let body = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: CLASSIFIER_PROMPT,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: self.temperature,
            response_format: ResponseFormat { t: "json_object" },
        };

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("openai error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse openai response")?;
        let s = out
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        Ok(s.trim().to_string())
    }

    async fn anthropic_complete(&self, text: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: i32,
            temperature: f32,
            system: &'a str,
            messages: Vec<Msg<'a>>,
        }

        #[derive(Deserialize)]
        struct Resp {
            content: Vec<ContentBlock>,
        }

        #[derive(Deserialize)]
        struct ContentBlock {
            #[serde(rename = "type")]
            t: String,
            text: Option<String>,
        }

        let body = Req {
            model: &self.model,
            max_tokens: 300,
            temperature: self.temperature,
            system: CLASSIFIER_PROMPT,
            messages: vec![Msg {
                role: "user",
                content: text,
            }],
        };

        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let resp = reqwest::Client::new()
            .post(format!("{}/v1/messages", self.base_url))
            .headers(headers)
            .json(&body)
            .send()
            .await
            .context("anthropic request")?;

        let status = resp.status();
        if !status.is_success() {
            let txt = resp.text().await.unwrap_or_default();
            bail!("anthropic error: {status} {txt}");
        }

        let out: Resp = resp.json().await.context("parse anthropic response")?;
        let mut s = String::new();
        for b in out.content {
            if b.t == "text" {
                if let Some(t) = b.text {
                    s.push_str(&t);
                }
            }
        }
        Ok(s.trim().to_string())
    }
}

impl IntentOracle for LlmOracle {
    fn classify_intent(&self, text: &str) -> Option<IntentSignal> {
        let raw = match self.complete(text) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "llm oracle unavailable");
                return None;
            }
        };
        let signal = parse_signal(&raw);
        if signal.is_none() {
            tracing::warn!(raw = %raw, "llm oracle returned unparsable output");
        }
        signal
    }
}
