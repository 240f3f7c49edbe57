//! Structured error types for the pagemark engine.
//!
//! Errors fall into two groups. Invalid input (bad widths, unusable fonts,
//! malformed JSON, I/O) is the caller's to report. `UnsupportedBullet` is an
//! internal invariant failure and means the dispatcher handed the list
//! renderer a style it does not draw.

use std::path::PathBuf;
use std::process::ExitCode;

/// The unified error type returned by all public pagemark functions.
#[derive(thiserror::Error, Debug)]
pub enum PagemarkError {
    /// A height estimate was requested for a non-positive wrap width.
    #[error("Invalid wrap width {width}: available width must be positive")]
    InvalidWidth { width: f64 },

    /// A configuration value is out of range.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A draw referenced a font that the font context cannot provide.
    #[error("Font not available: {variant}")]
    MissingFont { variant: String },

    /// Font bytes could not be decoded or parsed.
    #[error("Font error: {0}")]
    FontError(String),

    /// The list renderer was asked for a bullet style it does not draw.
    #[error("Unsupported bullet style {style:?} reached the list renderer")]
    UnsupportedBullet { style: crate::model::BulletStyle },

    /// JSON input (document tree or config) failed to parse.
    #[error("Failed to parse JSON input: {source}{}", hint_suffix(.hint))]
    ParseError {
        source: serde_json::Error,
        hint: String,
    },

    /// PDF generation failed.
    #[error("Render error: {0}")]
    RenderError(String),

    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Input file is not of type markdown: {path}")]
    NotMarkdown { path: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for PagemarkError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the expected schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        PagemarkError::ParseError { source: e, hint }
    }
}

impl PagemarkError {
    /// Process exit code for the CLI: 1 for bad input, 2 for failures while
    /// rendering or writing.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::InvalidWidth { .. }
            | Self::InvalidConfig(_)
            | Self::FontError(_)
            | Self::ParseError { .. }
            | Self::FileNotFound { .. }
            | Self::NotMarkdown { .. } => ExitCode::from(1),

            Self::MissingFont { .. }
            | Self::UnsupportedBullet { .. }
            | Self::RenderError(_)
            | Self::Io(_) => ExitCode::from(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_syntax_error_carries_hint() {
        let err: PagemarkError = serde_json::from_str::<serde_json::Value>("{ \"a\": 1, }")
            .unwrap_err()
            .into();
        let msg = err.to_string();
        assert!(msg.contains("Failed to parse JSON input"));
        assert!(msg.contains("trailing commas"));
    }

    #[test]
    fn test_invalid_width_message() {
        let err = PagemarkError::InvalidWidth { width: -3.0 };
        assert!(err.to_string().contains("-3"));
    }

    #[test]
    fn test_exit_codes_split_input_from_render_failures() {
        let input = PagemarkError::FileNotFound {
            path: PathBuf::from("missing.md"),
        };
        assert_eq!(input.exit_code(), ExitCode::from(1));
        let config = PagemarkError::InvalidConfig("negative spacing".to_string());
        assert_eq!(config.exit_code(), ExitCode::from(1));
        let render = PagemarkError::RenderError("no output".to_string());
        assert_eq!(render.exit_code(), ExitCode::from(2));
    }
}
