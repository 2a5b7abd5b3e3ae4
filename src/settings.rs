// Import necessary libraries and modules for API interaction, file I/O, and serialization.
use async_openai::{Client, config::OpenAIConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

// Define a structure to hold application settings with serialization and deserialization capabilities.
#[derive(Serialize, Deserialize, Clone)]
pub struct Settings {
    pub openai_api_key: Option<String>, // Optional API key; OPENAI_API_KEY is the fallback.
    pub model: String,                  // Model for text generation.
    pub vision_model: Option<String>,   // Model for image-conditioned calls, if any.
    pub embedding_model: String,        // Model for embeddings.
}

// Implement the Default trait for Settings to provide a method to create default settings.
impl Default for Settings {
    fn default() -> Self {
        Settings {
            openai_api_key: None, // No API key by default.
            model: "gpt-4o-mini".to_string(),
            vision_model: Some("gpt-4o".to_string()),
            embedding_model: "text-embedding-3-small".to_string(),
        }
    }
}

// Additional implementation block for Settings.
impl Settings {
    // Load settings from a default file path.
    pub fn load() -> io::Result<Self> {
        Self::load_settings_from_file("./data/settings.json")
    }

    // Save current settings to a default file path.
    pub fn save(&self) -> io::Result<()> {
        self.save_to_file("./data/settings.json")
    }

    // Load settings from a specified file path.
    pub fn load_settings_from_file(path: &str) -> io::Result<Self> {
        let data = fs::read_to_string(path)?; // Read settings from file.
        let settings = serde_json::from_str(&data)?; // Deserialize JSON data into settings.
        Ok(settings)
    }

    // Save current settings to a specified file path.
    pub fn save_to_file(&self, path: &str) -> io::Result<()> {
        let data = serde_json::to_string_pretty(self)?; // Serialize settings into pretty JSON format.
        if let Some(parent) = std::path::Path::new(path).parent() {
            fs::create_dir_all(parent)?; // Create the directory if it doesn't exist.
        }
        fs::write(path, data)?; // Create or overwrite the file.
        Ok(())
    }

    // Asynchronously validate an API key with OpenAI's services.
    pub async fn validate_api_key(api_key: &str) -> bool {
        let client = Client::with_config(OpenAIConfig::new().with_api_key(api_key)); // Configure the OpenAI client with the API key.
        client.models().list().await.is_ok()
    }
}
