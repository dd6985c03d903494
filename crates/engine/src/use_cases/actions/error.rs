//! Errors for direct-manipulation actions. Every variant is raised before the
//! tree is touched.

use thiserror::Error;
use tianji_domain::{DomainError, PathError};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActionError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("{0} is not equipment")]
    NotEquipment(String),

    #[error("{0} is not equipped")]
    NotEquipped(String),

    #[error("{0} is equipped; unequip it first")]
    ItemEquipped(String),

    #[error("No free equipment slot for {0}")]
    NoFreeSlot(String),

    #[error("{0} is not a cultivation technique")]
    NotATechnique(String),

    #[error("{0} is not the technique being cultivated")]
    NoActiveTechnique(String),

    #[error("Not enough {item}: requested {requested}, have {available}")]
    InsufficientResource {
        item: String,
        requested: u32,
        available: u32,
    },

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error(transparent)]
    Malformed(#[from] DomainError),

    #[error(transparent)]
    Path(#[from] PathError),
}
