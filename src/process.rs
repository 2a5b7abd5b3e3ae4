use serde::Deserialize;
use serde_json::json;

use crate::ai::{Capability, StructuredRequest, parse_reply};
use crate::error::AIError;
use crate::prompts;
use crate::substance::Substance;

/// What the AI saw in the image: the transformation it depicts, and any
/// problems that would keep it from working on the chosen substances.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessReport {
    pub process: String,
    pub problems: Option<String>,
}

/// Returns a description of the alchemical process shown in the image, as
/// applied to the given substances.
pub async fn describe_process<C: Capability>(
    ai: &C,
    image_url: &str,
    substances: &[&Substance],
) -> Result<ProcessReport, AIError> {
    let mut user = String::from("PICTOGRAMS: ");
    for substance in substances {
        user.push_str(&format!("\n{}: {}", substance.name, substance.pictogram));
    }
    user.push('\n');

    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::DESCRIBE_PROCESS,
            user: Some(&user),
            image_url: Some(image_url),
            schema_name: "alchemical_process",
            schema: json!({
                "type": "object",
                "properties": {
                    "process": { "type": "string" },
                    "problems": { "type": ["string", "null"] }
                },
                "required": ["process", "problems"],
                "additionalProperties": false
            }),
        })
        .await?;
    parse_reply(value)
}

/// Returns the names of the substances created by the process. An empty list
/// means the process yields nothing.
pub async fn perform_process<C: Capability>(
    ai: &C,
    substances: &[&Substance],
    process: &str,
    problems: Option<&str>,
) -> Result<Vec<String>, AIError> {
    #[derive(Deserialize)]
    struct ResultsReply {
        results: Vec<String>,
    }

    let descriptions: Vec<String> = substances
        .iter()
        .map(|substance| format!("{}: {}", substance.name, substance.description))
        .collect();

    let mut user = format!("DESCRIPTIONS: {}", descriptions.join("\n"));
    user.push_str(&format!("\nProcess to follow: {process}"));
    match problems {
        Some(problems) => user.push_str(&format!("\nProblems with this process: {problems}")),
        None => user.push_str("\nNo problems were found with this process."),
    }

    let value = ai
        .generate_structured(StructuredRequest {
            system: prompts::PERFORM_PROCESS,
            user: Some(&user),
            image_url: None,
            schema_name: "process_results",
            schema: json!({
                "type": "object",
                "properties": {
                    "results": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["results"],
                "additionalProperties": false
            }),
        })
        .await?;
    let reply: ResultsReply = parse_reply(value)?;
    Ok(reply.results)
}
