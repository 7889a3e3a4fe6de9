// SPDX-License-Identifier: Apache-2.0

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidArgument,
    InvalidDhcpMessage,
    NotSupported,
    NoLease,
    Bug,
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct DhcpError {
    kind: ErrorKind,
    msg: String,
}

impl DhcpError {
    pub fn new(kind: ErrorKind, msg: String) -> Self {
        Self { kind, msg }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn msg(&self) -> &str {
        self.msg.as_str()
    }
}

impl std::fmt::Display for DhcpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.msg)
    }
}

impl std::error::Error for DhcpError {}

pub(crate) trait ErrorContext<T> {
    /// Prefix the error message, keeping the error kind.
    fn context(self, message: &str) -> Result<T, DhcpError>;
}

impl<T> ErrorContext<T> for Result<T, DhcpError> {
    fn context(self, message: &str) -> Result<T, DhcpError> {
        self.map_err(|e| {
            DhcpError::new(e.kind, format!("{message}: {}", e.msg))
        })
    }
}
