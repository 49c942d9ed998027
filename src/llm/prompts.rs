/// Build the deterministic extraction prompt for a call transcript.
///
/// The transcript is embedded verbatim: no escaping, no truncation.
pub fn build_summarization_prompt(transcript: &str) -> String {
    format!(
        r#"You are an expert call center analyst. Analyze this call transcript and provide a structured summary.

Call Transcript:
{transcript}

Please provide a JSON response with the following structure:
{{
    "issue": "Main issue or reason for the call",
    "resolution": "How the issue was resolved or handled",
    "sentiment": "positive, neutral, or negative",
    "category": "billing, technical, account, or other category",
    "nextSteps": "Any follow-up actions required (optional)"
}}

Only respond with the JSON object, no additional text."#
    )
}
