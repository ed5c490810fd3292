//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and credentials are available before
//! starting operations that would otherwise fail midway.

use crate::config::Settings;
use crate::error::{Result, VidaskError};
use crate::transcript::YoutubeSource;
use std::process::Command;

/// Requirements for different operations.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Fetching a transcript needs yt-dlp for YouTube inputs.
    Fetch,
    /// Answering needs both service credentials and the transcript.
    Answer,
}

/// Run pre-flight checks for the given operation on `input`.
pub fn check(operation: Operation, input: &str, settings: &Settings) -> Result<()> {
    if matches!(operation, Operation::Answer) {
        check_api_key(&settings.embedding.api_key_env)?;
        check_api_key(&settings.completion.api_key_env)?;
    }
    if YoutubeSource::parse(input, &settings.source.language).is_some() {
        check_tool("yt-dlp")?;
    }
    Ok(())
}

/// Check that an API key environment variable is set and non-empty.
pub fn check_api_key(var: &str) -> Result<()> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(VidaskError::Config(format!(
            "{} is empty. Set it with: export {}='...'",
            var, var
        ))),
        Err(_) => Err(VidaskError::Config(format!(
            "{} not set. Set it with: export {}='...'",
            var, var
        ))),
    }
}

/// Check if an external tool is available.
pub fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(VidaskError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VidaskError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(VidaskError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_fetch_has_no_requirements() {
        assert!(check(Operation::Fetch, "./talk.txt", &Settings::default()).is_ok());
    }

    #[test]
    fn test_missing_key() {
        let err = check_api_key("VIDASK_TEST_KEY_THAT_IS_NEVER_SET").unwrap_err();
        assert!(matches!(err, VidaskError::Config(msg) if msg.contains("not set")));
    }

    #[test]
    fn test_missing_tool() {
        let err = check_tool("vidask-no-such-tool").unwrap_err();
        assert!(matches!(err, VidaskError::ToolNotFound(_)));
    }
}
