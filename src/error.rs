use serde_json;
use thiserror::Error;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("AI error: {0:#}")]
    AI(#[from] AIError), // Errors related to AI operations.

    #[error("Game error: {0:#}")]
    Game(#[from] GameError), // Errors specific to game logic or state.

    #[error("Serialization error: {0:#}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0:#}")]
    IO(#[from] std::io::Error), // Input/output errors.
}

// Enum for game-specific errors.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("Unknown substance symbol: {0}")]
    UnknownSymbol(String), // A command referenced a symbol that is not in the world.

    #[error("Could not find a free symbol for {0}")]
    SymbolResolutionExhausted(String), // The symbol generator kept proposing taken symbols.
}

// Errors related to AI operations are separated into their own enum for clarity.
#[derive(Debug, Error)]
pub enum AIError {
    #[error("OpenAI API error: {0:#}")]
    OpenAI(#[from] async_openai::error::OpenAIError), // Errors from the OpenAI API.

    #[error("Timeout occurred")]
    Timeout, // Error when an AI operation exceeds its time limit.

    #[error("Empty assistant message")]
    EmptyResponse, // The model returned no usable content.

    #[error("Response did not match the expected schema: {0}")]
    SchemaMismatch(String), // Structured output could not be parsed.

    #[error("An image was provided but no vision model is configured")]
    ImageNotSupported,

    #[error("No OpenAI API key configured")]
    MissingApiKey,
}
