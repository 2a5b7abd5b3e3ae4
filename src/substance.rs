use futures::try_join;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ai::{Capability, StructuredRequest, parse_reply};
use crate::error::AIError;
use crate::prompts;

/// A discovered substance. The symbol is only a proposal until the world
/// state admits the substance and re-resolves collisions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substance {
    pub name: String,
    pub description: String,
    pub symbol: String,
    pub pictogram: String,
    pub embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct DescriptionReply {
    description: String,
}

#[derive(Deserialize)]
struct SymbolReply {
    symbol: String,
}

#[derive(Deserialize)]
struct PictogramReply {
    pictogram: String,
}

#[derive(Deserialize)]
struct CopyReply {
    is_copy: bool,
}

/// Returns a description of the substance.
pub async fn describe_substance<C: Capability>(ai: &C, name: &str) -> Result<String, AIError> {
    let user = format!("Substance name: {name}");
    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::DESCRIBE_SUBSTANCE,
            user: Some(&user),
            image_url: None,
            schema_name: "substance_description",
            schema: json!({
                "type": "object",
                "properties": {
                    "description": { "type": "string" }
                },
                "required": ["description"],
                "additionalProperties": false
            }),
        })
        .await?;
    let reply: DescriptionReply = parse_reply(value)?;
    Ok(reply.description)
}

/// Returns a possible symbol for the substance. `used` lists symbols the
/// model must avoid; pass an empty slice for an unconstrained proposal.
pub async fn create_symbol<C: Capability>(
    ai: &C,
    name: &str,
    description: &str,
    used: &[String],
) -> Result<String, AIError> {
    let mut user = String::new();
    if !used.is_empty() {
        user.push_str(&format!(
            "The following symbols already exist and CANNOT be used: {}",
            used.join(", ")
        ));
    }
    user.push_str(&format!(
        "\nSubstance name: {name}\nDescription: {description}"
    ));

    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::CREATE_SYMBOL,
            user: Some(&user),
            image_url: None,
            schema_name: "substance_symbol",
            schema: json!({
                "type": "object",
                "properties": {
                    "symbol": { "type": "string" }
                },
                "required": ["symbol"],
                "additionalProperties": false
            }),
        })
        .await?;
    let reply: SymbolReply = parse_reply(value)?;
    Ok(reply.symbol)
}

/// Returns the description of a pictogram for the substance.
pub async fn create_pictogram<C: Capability>(
    ai: &C,
    name: &str,
    description: &str,
) -> Result<String, AIError> {
    let user = format!("Substance name: {name}\nDescription: {description}");
    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::CREATE_PICTOGRAM,
            user: Some(&user),
            image_url: None,
            schema_name: "substance_pictogram",
            schema: json!({
                "type": "object",
                "properties": {
                    "pictogram": { "type": "string" }
                },
                "required": ["pictogram"],
                "additionalProperties": false
            }),
        })
        .await?;
    let reply: PictogramReply = parse_reply(value)?;
    Ok(reply.pictogram)
}

/// Builds a full substance from a bare name: description first, then symbol
/// proposal and pictogram (which only depend on the description and not on
/// each other), then the embedding.
pub async fn full_substance<C: Capability>(ai: &C, name: &str) -> Result<Substance, AIError> {
    let description = describe_substance(ai, name).await?;

    let (symbol, pictogram) = try_join!(
        create_symbol(ai, name, &description, &[]),
        create_pictogram(ai, name, &description),
    )?;

    let embedding = ai
        .embed(&format!("The substance named {name}: {description}"))
        .await?;

    Ok(Substance {
        name: name.to_string(),
        description,
        symbol,
        pictogram,
        embedding,
    })
}

/// Returns true if the substance duplicates one of its closest neighbors.
pub async fn identify_copy<C: Capability>(
    ai: &C,
    candidate: &Substance,
    neighbors: &[&Substance],
) -> Result<bool, AIError> {
    let mut user = String::from("Closest substances: ");
    for other in neighbors {
        user.push_str(&format!("\n{}: {}", other.name, other.description));
    }
    user.push_str(&format!(
        "\nSubstance to check: {}: {}",
        candidate.name, candidate.description
    ));

    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::IDENTIFY_COPY,
            user: Some(&user),
            image_url: None,
            schema_name: "copy_verdict",
            schema: json!({
                "type": "object",
                "properties": {
                    "is_copy": { "type": "boolean" }
                },
                "required": ["is_copy"],
                "additionalProperties": false
            }),
        })
        .await?;
    let reply: CopyReply = parse_reply(value)?;
    Ok(reply.is_copy)
}
