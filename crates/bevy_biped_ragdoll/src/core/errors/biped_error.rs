use thiserror::Error;

use crate::core::{part::PartId, roles::Role, skeleton::NodeId};

/// Everything that can go wrong while setting up or driving a biped.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum BipedError {
    #[error("Biped is missing required parts: {}", format_roles(.0))]
    MissingRequiredParts(Vec<Role>),
    #[error("Part {0} must have a parent part before this operation")]
    MissingParentPart(String),
    #[error("Part {0} has no opposite part, map symmetry first")]
    MissingOppositePart(String),
    #[error("Part {0:?} is not registered on this biped")]
    UnknownPart(PartId),
    #[error("Skeleton node {0:?} does not exist")]
    UnknownNode(NodeId),
    /// A [RON](ron) parsing error
    #[error("Could not parse biped config: {0}")]
    InvalidConfig(#[from] ron::error::SpannedError),
    #[error("Could not serialize biped config: {0}")]
    Serialize(#[from] ron::Error),
}

fn format_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|role| role.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type BipedResult<T> = Result<T, BipedError>;
