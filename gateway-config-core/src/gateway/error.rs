use std::borrow::Cow;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DerivationError {
    #[error("{} is missing its {}!", .0, .1)]
    MissingObjectMetadata(&'static str, &'static str),
    #[error("{} '{}' is missing required data ({})!", .kind, .name, .field)]
    MissingObjectData {
        kind: &'static str,
        name: String,
        field: Cow<'static, str>,
    },
    #[error("{} '{}' contains invalid data ({})!", .kind, .name, .reason)]
    InvalidObjectData {
        kind: &'static str,
        name: String,
        reason: Cow<'static, str>,
    },
    #[error("Node '{}' is missing the '{}' label!", .node, crate::MASTER_ROLE_LABEL)]
    MissingMasterLabel { node: String },
}

impl DerivationError {
    pub fn missing(kind: &'static str, name: &str, field: impl Into<Cow<'static, str>>) -> Self {
        Self::MissingObjectData {
            kind,
            name: name.to_owned(),
            field: field.into(),
        }
    }

    pub fn invalid(kind: &'static str, name: &str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::InvalidObjectData {
            kind,
            name: name.to_owned(),
            reason: reason.into(),
        }
    }
}
