use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, MlErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum MlErr {
    /// Invalid topology construction, structural mutation after the network was frozen or an
    /// invalid training configuration.
    Config(String),
    /// A vector or matrix crossed a boundary with the wrong size.
    ShapeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    /// A backward pass was requested with a trace that doesn't belong to the current parameters.
    State(&'static str),
    /// A serialized network could not be decoded.
    CorruptFormat(String),
    /// The underlying reader or writer failed.
    Io(io::Error),
}

impl MlErr {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    pub(crate) fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::CorruptFormat(msg.into())
    }

    /// Returns `Ok(())` if `got` equals `expected`, a `ShapeMismatch` otherwise.
    pub(crate) fn check_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
        if got != expected {
            return Err(Self::ShapeMismatch {
                what,
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Display for MlErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlErr::Config(msg) => write!(f, "invalid configuration: {msg}"),
            MlErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(f, "shape mismatch for {what}: got {got}, expected {expected}"),
            MlErr::State(msg) => write!(f, "invalid state: {msg}"),
            MlErr::CorruptFormat(msg) => write!(f, "corrupt network encoding: {msg}"),
            MlErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for MlErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            MlErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}
