use crate::model::ErrorInfo;
use miette::Diagnostic;
use serde_json::Value;
use std::fmt;

pub type HarnessResult<T> = Result<T, HarnessError>;

/// Machine-readable classification of harness errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Temporary storage could not be created or opened.
    Setup,
    /// The driver call itself returned an error.
    Transport,
    /// Exit code, stdout or stderr differed from the scenario.
    ExpectationMismatch,
    /// The scenario asked for a capability the harness does not implement.
    UnsupportedCapability,
    /// Reading captured output or writing artifacts failed.
    Io,
    /// A fixture was used outside its lifecycle.
    FixtureState,
    /// The driver panicked during the call.
    DriverPanic,
    /// Invalid command-line argument or option value.
    CliInvalidArg,
}

impl ErrorCode {
    pub const ALL: [Self; 8] = [
        Self::Setup,
        Self::Transport,
        Self::ExpectationMismatch,
        Self::UnsupportedCapability,
        Self::Io,
        Self::FixtureState,
        Self::DriverPanic,
        Self::CliInvalidArg,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "E_SETUP",
            Self::Transport => "E_TRANSPORT",
            Self::ExpectationMismatch => "E_EXPECTATION_MISMATCH",
            Self::UnsupportedCapability => "E_UNSUPPORTED_CAPABILITY",
            Self::Io => "E_IO",
            Self::FixtureState => "E_FIXTURE_STATE",
            Self::DriverPanic => "E_DRIVER_PANIC",
            Self::CliInvalidArg => "E_CLI_INVALID_ARG",
        }
    }

    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Process exit status the CLI uses for this error.
    #[must_use]
    pub fn exit_code(self) -> i32 {
        match self {
            Self::ExpectationMismatch => 1,
            Self::CliInvalidArg => 2,
            Self::Setup | Self::Io => 3,
            Self::Transport | Self::DriverPanic => 4,
            Self::UnsupportedCapability => 5,
            Self::FixtureState => 6,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{code}: {message}")]
pub struct HarnessError {
    pub code: ErrorCode,
    pub message: String,
    pub context: Option<Value>,
}

impl HarnessError {
    pub fn new(code: ErrorCode, message: impl Into<String>, context: Option<Value>) -> Self {
        Self {
            code,
            message: message.into(),
            context,
        }
    }

    pub fn setup(message: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Setup,
            message,
            Some(serde_json::json!({ "source": err.to_string() })),
        )
    }

    pub fn io(message: impl Into<String>, err: impl fmt::Display) -> Self {
        Self::new(
            ErrorCode::Io,
            message,
            Some(serde_json::json!({ "source": err.to_string() })),
        )
    }

    pub fn transport(message: impl Into<String>, context: Option<Value>) -> Self {
        Self::new(ErrorCode::Transport, message, context)
    }

    pub fn mismatch(message: impl Into<String>, context: Value) -> Self {
        Self::new(ErrorCode::ExpectationMismatch, message, Some(context))
    }

    pub fn unsupported(capability: &str) -> Self {
        Self::new(
            ErrorCode::UnsupportedCapability,
            format!("{capability} mode is not supported yet"),
            Some(serde_json::json!({ "capability": capability })),
        )
    }

    pub fn fixture_state(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::FixtureState, message, None)
    }

    pub fn driver_panic(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DriverPanic, message, None)
    }

    pub fn cli_invalid_arg(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::CliInvalidArg, message, None)
    }

    #[must_use]
    pub fn exit_code(&self) -> i32 {
        self.code.exit_code()
    }

    #[must_use]
    pub fn to_error_info(&self) -> ErrorInfo {
        ErrorInfo {
            code: self.code.as_str().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
        }
    }
}

impl Diagnostic for HarnessError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(self.code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let diff = self.context.as_ref()?.get("diff")?.as_str()?;
        Some(Box::new(diff))
    }
}
