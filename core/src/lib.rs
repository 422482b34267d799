pub mod ast;
pub mod error;
pub mod ir;
pub mod location;
pub mod stage;
pub mod types;

pub use ast::SourceShader;
pub use error::{GlintErrorExt, Level, LowerError, LowerErrorKind};
pub use ir::{Capabilities, Shader, lower_shader};
pub use location::Location;
pub use stage::{Stage, StageLayout};
pub use types::{BaseType, Type};

/// Format an error as a single report line.
pub fn generate_error_report<E: GlintErrorExt>(error: &E) -> String {
    let level = error.level();
    let location = location::describe(error.location().as_ref());
    let message = error.message();

    format!("GLINT | {} | {} | {}", level, location, message)
}

/// Parse a JSON-encoded source shader and lower it.
pub fn lower_json(text: &str, caps: &Capabilities) -> Result<Shader, Box<dyn GlintErrorExt>> {
    let source = SourceShader::from_json(text).map_err(|e| Box::new(ParseError::from(e)) as Box<dyn GlintErrorExt>)?;
    lower_shader(&source, caps).map_err(|e| Box::new(e) as Box<dyn GlintErrorExt>)
}

/// A source shader that could not be decoded.
#[derive(Debug)]
pub struct ParseError {
    message: String,
    location: Option<Location>,
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError {
            message: e.to_string(),
            location: Some(Location::new("<input>", e.line(), e.column())),
        }
    }
}

impl GlintErrorExt for ParseError {
    fn level(&self) -> Level {
        Level::Error
    }

    fn message(&self) -> String {
        format!("malformed source shader: {}", self.message)
    }

    fn issuer(&self) -> String {
        "glint::parse".to_string()
    }

    fn location(&self) -> Option<Location> {
        self.location.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_includes_level_and_message() {
        let err = LowerError::out_of_memory("instructions");
        let report = generate_error_report(&err);
        assert!(report.starts_with("GLINT | CRITICAL |"), "got {}", report);
        assert!(report.contains("instructions"));
    }

    #[test]
    fn malformed_json_is_reported_with_position() {
        let err = lower_json("{ \"name\": ", &Capabilities::default()).unwrap_err();
        assert_eq!(err.level(), Level::Error);
        assert!(err.location().is_some());
        assert!(err.message().contains("malformed source shader"));
    }
}
