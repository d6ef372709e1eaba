use crate::error::ApiError;

/// Validate a prompt before it is forwarded to the engine.
///
/// An absent or blank prompt never reaches this point; the handler
/// substitutes the fallback text first.
pub fn validate_prompt(prompt: &str, max_chars: usize) -> Result<(), ApiError> {
    let chars = prompt.chars().count();
    if chars > max_chars {
        return Err(ApiError::InvalidInput(format!(
            "Prompt too long (max {} characters)",
            max_chars
        )));
    }
    Ok(())
}
