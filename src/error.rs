/// Broad failure categories.
///
/// Structural problems (bad arity, degenerate grids) are fatal to a call.
/// Solver non-convergence is deliberately *not* here: it is reported through
/// `SolverStatus` alongside a usable best-effort result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Parameter vector length/packing does not match the model's arity rule.
    InvalidParameterVector,
    /// A legacy model code outside `0..=6`.
    UnsupportedVariant,
    /// Empty depth grid, non-positive thickness, mismatched data lengths.
    DegenerateInput,
    /// Export file could not be created or written.
    Io,
    /// Invalid command-line or solver option.
    Usage,
}

impl ErrorKind {
    fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Io | ErrorKind::Usage => 2,
            ErrorKind::InvalidParameterVector | ErrorKind::UnsupportedVariant => 3,
            ErrorKind::DegenerateInput => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_parameters(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParameterVector, message)
    }

    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DegenerateInput, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
