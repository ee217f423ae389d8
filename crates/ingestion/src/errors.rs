//! Import pipeline error types

use colloquia_common::errors::AppError;
use quick_xml::events::attributes::AttrError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Multi-work container documents must be flattened before import")]
    MultiWorkContainer,

    #[error("Document structure error: {0}")]
    DocumentStructure(String),

    #[error("Missing required node: {0}")]
    MissingNode(&'static str),

    #[error("Unregistered language code: {0}")]
    UnknownLanguage(String),

    #[error("Conference not found: {0}")]
    ConferenceNotFound(Uuid),

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] AttrError),

    #[error("Store error: {0}")]
    Store(#[from] AppError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImportError {
    /// Structural errors mean the document itself is malformed and the
    /// same file will fail again until it is fixed.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ImportError::MultiWorkContainer
                | ImportError::DocumentStructure(_)
                | ImportError::MissingNode(_)
                | ImportError::Xml(_)
                | ImportError::XmlAttr(_)
        )
    }
}

impl From<sea_orm::TransactionError<ImportError>> for ImportError {
    fn from(err: sea_orm::TransactionError<ImportError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(e) => ImportError::Store(AppError::Database(e)),
            sea_orm::TransactionError::Transaction(e) => e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_classification() {
        assert!(ImportError::MultiWorkContainer.is_structural());
        assert!(ImportError::MissingNode("titleStmt/title").is_structural());
        assert!(!ImportError::UnknownLanguage("xx".into()).is_structural());
    }
}
