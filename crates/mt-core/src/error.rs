use derive_more::From;
use orion_error::{ErrorCode, StructError, UvsReason};

#[derive(Debug, Clone, PartialEq, thiserror::Error, From)]
pub enum TunerReason {
    #[error("rule file error")]
    RuleFile,
    #[error("variable source error")]
    VarSource,
    #[error("{0}")]
    Uvs(UvsReason),
}

impl ErrorCode for TunerReason {
    fn error_code(&self) -> i32 {
        match self {
            Self::RuleFile => 1001,
            Self::VarSource => 1002,
            Self::Uvs(u) => u.error_code(),
        }
    }
}

pub type CoreError = StructError<TunerReason>;
pub type CoreResult<T> = Result<T, CoreError>;
