// Copyright 2023 Ant Group Co., Ltd.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt;
use thiserror::Error;

use crate::retcode::*;

// define error type of cipher facade
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CryptoStatus {
    #[error("success")]
    Success,

    #[error("invalid key length")]
    InvalidKeyLength,

    #[error("invalid mode/padding combination")]
    InvalidModePaddingCombination,

    #[error("missing or unexpected iv")]
    MissingOrUnexpectedIv,

    #[error("unsupported algorithm")]
    UnsupportedAlgorithm,

    #[error("malformed der structure")]
    MalformedDerStructure,

    #[error("underlying cipher failure")]
    UnderlyingCipherFailure,

    #[error("invalid key format")]
    InvalidKeyFormat,

    #[error("Invalid Argument")]
    InvalidArgument,

    #[error("internal error")]
    InternalErr,

    #[error("assert err")]
    AssertErr,
}

impl CryptoStatus {
    /// Validation failures are the caller's fault and are reported before any
    /// primitive is invoked.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CryptoStatus::InvalidKeyLength
                | CryptoStatus::InvalidModePaddingCombination
                | CryptoStatus::MissingOrUnexpectedIv
                | CryptoStatus::UnsupportedAlgorithm
        )
    }
}

pub fn map_status_to_i32(err: CryptoStatus) -> i32 {
    match err {
        CryptoStatus::Success => CryptoStatusT::Success as i32,
        CryptoStatus::InvalidKeyLength => CryptoStatusT::InvalidKeyLength as i32,
        CryptoStatus::InvalidModePaddingCombination => {
            CryptoStatusT::InvalidModePaddingCombination as i32
        }
        CryptoStatus::MissingOrUnexpectedIv => CryptoStatusT::MissingOrUnexpectedIv as i32,
        CryptoStatus::UnsupportedAlgorithm => CryptoStatusT::UnsupportedAlgorithm as i32,
        CryptoStatus::MalformedDerStructure => CryptoStatusT::MalformedDerStructure as i32,
        CryptoStatus::UnderlyingCipherFailure => CryptoStatusT::UnderlyingCipherFailure as i32,
        CryptoStatus::InvalidKeyFormat => CryptoStatusT::InvalidKeyFormat as i32,
        CryptoStatus::InvalidArgument => CryptoStatusT::InvalidArgument as i32,
        CryptoStatus::InternalErr => CryptoStatusT::Internal as i32,
        CryptoStatus::AssertErr => CryptoStatusT::Unknown as i32,
    }
}

pub type CryptoResult<T> = core::result::Result<T, Error>;

pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

#[macro_export]
macro_rules! crypto_assert {
    ($cond: expr, $($arg:tt)*) => {{
        if !$cond {
            $crate::return_errno!($crate::CryptoStatus::AssertErr, $($arg)*)
        }
    }}
}

#[macro_export]
macro_rules! crypto_assert_eq {
    ($left:expr, $right:expr) => {{
        $crate::crypto_assert!(
            $left == $right,
            "{} not equal to {}",
            stringify!($left),
            stringify!($right)
        );
    }};
}

#[macro_export]
macro_rules! errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        let inner_error = {
            let errno: $crate::CryptoStatus = $errno_expr;
            let msg: String = format!($($arg)*);
            (errno, msg)
        };
        $crate::Error::embedded(
            inner_error,
            Some($crate::ErrorLocation::new(file!(), line!())),
        )
    }};
}

#[macro_export]
macro_rules! return_errno {
    ($errno_expr: expr, $($arg:tt)*) => {{
        return Err($crate::errno!($errno_expr, $($arg)*));
    }};
}

#[derive(Debug)]
pub struct Error {
    inner: Error__,
    location: Option<ErrorLocation>,
    cause: Option<BoxedCause>,
}

#[derive(Debug)]
enum Error__ {
    Embedded((CryptoStatus, String)),
}

#[derive(Debug, Clone, Copy)]
pub struct ErrorLocation {
    line: u32,
    file: &'static str,
}

impl Error {
    pub fn embedded(inner: (CryptoStatus, String), location_para: Option<ErrorLocation>) -> Error {
        Error {
            inner: Error__::Embedded(inner),
            location: location_para,
            cause: None,
        }
    }

    /// Attach the error reported by the underlying primitive.
    pub fn with_cause<E>(mut self, cause: E) -> Error
    where
        E: Into<BoxedCause>,
    {
        self.cause = Some(cause.into());
        self
    }

    pub fn errno(&self) -> CryptoStatus {
        match &self.inner {
            Error__::Embedded((errno, _)) => *errno,
        }
    }

    pub fn message(&self) -> &str {
        match &self.inner {
            Error__::Embedded((_, msg)) => msg,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.errno().is_validation()
    }

    pub fn get_cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl ErrorLocation {
    pub fn new(file_para: &'static str, line_para: u32) -> ErrorLocation {
        ErrorLocation {
            file: file_para,
            line: line_para,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "inner: {}; ", self.inner)?;
        if let Some(location) = self.location {
            write!(f, "location: {}", location)?;
        }
        Ok(())
    }
}

impl fmt::Display for Error__ {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error__::Embedded((errno, msg)) => write!(f, "errno: {}, {}", errno, msg),
        }
    }
}

impl fmt::Display for ErrorLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[line = {}, file = {}]", self.line, self.file)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn failing() -> CryptoResult<()> {
        return_errno!(CryptoStatus::InvalidKeyLength, "key length {} is illegal", 15)
    }

    #[test]
    fn errno_keeps_status_and_message() {
        let err = failing().unwrap_err();
        assert_eq!(err.errno(), CryptoStatus::InvalidKeyLength);
        assert_eq!(err.message(), "key length 15 is illegal");
        assert!(err.is_validation());
        assert!(err.to_string().contains("location"));
    }

    #[test]
    fn cause_is_exposed_as_source() {
        use std::error::Error as _;
        let io = std::io::Error::new(std::io::ErrorKind::Other, "bad padding");
        let err = errno!(CryptoStatus::UnderlyingCipherFailure, "decrypt failed").with_cause(io);
        assert!(!err.is_validation());
        assert_eq!(err.source().unwrap().to_string(), "bad padding");
    }

    #[test]
    fn assert_macro_maps_to_assert_err() {
        fn check(v: usize) -> CryptoResult<usize> {
            crypto_assert_eq!(v, 4);
            Ok(v)
        }
        assert_eq!(check(4).unwrap(), 4);
        assert_eq!(check(5).unwrap_err().errno(), CryptoStatus::AssertErr);
    }
}
