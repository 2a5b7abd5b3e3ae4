use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
        ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContentPart,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs, ImageUrlArgs, ResponseFormat,
        ResponseFormatJsonSchema,
    },
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::{Duration, timeout};

use crate::error::AIError;
use crate::settings::Settings;

const AI_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_COMPLETION_TOKENS: u32 = 1000;

/// One structured generation call: a system prompt, an optional user prompt,
/// an optional image, and the JSON schema the reply must satisfy.
pub struct StructuredRequest<'a> {
    pub system: &'a str,
    pub user: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub schema_name: &'a str,
    pub schema: Value,
}

/// The generative capability the game consumes. Kept behind a trait so the
/// world logic can be exercised with a scripted stand-in.
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    async fn generate_structured(&self, request: StructuredRequest<'_>) -> Result<Value, AIError>;
    async fn embed(&self, text: &str) -> Result<Vec<f32>, AIError>;
}

/// Deserialize a structured reply into the call site's expected shape.
pub fn parse_reply<T: DeserializeOwned>(value: Value) -> Result<T, AIError> {
    serde_json::from_value(value).map_err(|e| AIError::SchemaMismatch(e.to_string()))
}

pub struct AiClient {
    client: Client<OpenAIConfig>,
    model: String,
    vision_model: Option<String>,
    embedding_model: String,
}

impl AiClient {
    pub fn new(settings: &Settings) -> Result<Self, AIError> {
        let api_key = settings
            .openai_api_key
            .clone()
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
            .ok_or(AIError::MissingApiKey)?;
        let openai_config = OpenAIConfig::new().with_api_key(api_key);

        Ok(Self {
            client: Client::with_config(openai_config),
            model: settings.model.clone(),
            vision_model: settings.vision_model.clone(),
            embedding_model: settings.embedding_model.clone(),
        })
    }

    fn response_format(request: &StructuredRequest<'_>) -> ResponseFormat {
        ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                description: None,
                name: request.schema_name.into(),
                schema: Some(request.schema.clone()),
                strict: Some(true),
            },
        }
    }
}

#[async_trait::async_trait]
impl Capability for AiClient {
    async fn generate_structured(&self, request: StructuredRequest<'_>) -> Result<Value, AIError> {
        // Image prompts go to the vision model; everything else to the text model.
        let model = match request.image_url {
            None => self.model.clone(),
            Some(_) => self
                .vision_model
                .clone()
                .ok_or(AIError::ImageNotSupported)?,
        };

        let mut messages: Vec<ChatCompletionRequestMessage> =
            vec![ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system)
                .build()?
                .into()];

        if let Some(user) = request.user {
            let message = match request.image_url {
                None => ChatCompletionRequestUserMessageArgs::default()
                    .content(user)
                    .build()?
                    .into(),
                Some(url) => {
                    let parts: Vec<ChatCompletionRequestUserMessageContentPart> = vec![
                        ChatCompletionRequestMessageContentPartTextArgs::default()
                            .text(user)
                            .build()?
                            .into(),
                        ChatCompletionRequestMessageContentPartImageArgs::default()
                            .image_url(ImageUrlArgs::default().url(url).build()?)
                            .build()?
                            .into(),
                    ];
                    ChatCompletionRequestUserMessageArgs::default()
                        .content(parts)
                        .build()?
                        .into()
                }
            };
            messages.push(message);
        }

        let chat_request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .response_format(Self::response_format(&request))
            .max_tokens(MAX_COMPLETION_TOKENS)
            .build()?;

        let response = match timeout(AI_TIMEOUT, self.client.chat().create(chat_request)).await {
            Ok(response) => response?,
            Err(_) => return Err(AIError::Timeout),
        };

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or(AIError::EmptyResponse)?;
        if content.is_empty() {
            return Err(AIError::EmptyResponse);
        }

        serde_json::from_str(&content).map_err(|e| AIError::SchemaMismatch(e.to_string()))
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, AIError> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(&self.embedding_model)
            .input(text.to_string())
            .build()?;

        let response = match timeout(AI_TIMEOUT, self.client.embeddings().create(request)).await {
            Ok(response) => response?,
            Err(_) => return Err(AIError::Timeout),
        };

        let embedding = response
            .data
            .into_iter()
            .next()
            .ok_or(AIError::EmptyResponse)?
            .embedding;
        Ok(embedding)
    }
}
