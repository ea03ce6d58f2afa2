#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("message must not be empty")]
    EmptyMessage,
    #[error("workspace name must not be empty")]
    EmptyWorkspace,
    #[error("workspace name must be a single path segment")]
    InvalidWorkspace,
    #[error("no workspace is selected")]
    NoActiveWorkspace,
    #[error("file name must not be empty")]
    EmptyFilename,
    #[error("file name must be a single path segment")]
    InvalidFilename,
    #[error("azure devops target must not be empty")]
    EmptyAzdoTarget,
}

pub fn normalize_message_text(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyMessage);
    }
    Ok(trimmed.to_string())
}

/// Workspace names become one route segment.
pub fn normalize_workspace_name(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyWorkspace);
    }
    if !is_single_segment(trimmed) {
        return Err(InputError::InvalidWorkspace);
    }
    Ok(trimmed.to_string())
}

/// File names are keys within one workspace directory, never paths.
pub fn normalize_filename(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyFilename);
    }
    if !is_single_segment(trimmed) {
        return Err(InputError::InvalidFilename);
    }
    Ok(trimmed.to_string())
}

fn is_single_segment(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

pub fn normalize_azdo_target(raw: &str) -> Result<String, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InputError::EmptyAzdoTarget);
    }
    Ok(trimmed.to_string())
}
