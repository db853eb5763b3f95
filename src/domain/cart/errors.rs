//! Cart errors.

use thiserror::Error;

use super::ProductId;

#[derive(Debug, Error)]
pub enum CartError {
    #[error("Product {0} has a negative price")]
    NegativePrice(ProductId),

    #[error("Amount {0} cannot be represented in minor currency units")]
    AmountOutOfRange(String),

    #[error("Cart storage is not valid JSON: {0}")]
    InvalidStorage(#[from] serde_json::Error),
}
