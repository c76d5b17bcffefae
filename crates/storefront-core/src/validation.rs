//! # Validation Module
//!
//! Input validation for incoming order requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (whatever wraps the engine)                        │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── Immediate caller feedback                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Non-empty item list                                               │
//! │  ├── Positive quantities                                               │
//! │  └── SKU shape                                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK (stock >= 0), CHECK (quantity > 0)                          │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::OrderRequest;
use crate::{MAX_ORDER_LINES, MAX_SKU_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - Must not have leading or trailing whitespace (the store looks SKUs
///   up verbatim, so a padded SKU would never match a product row)
/// - Must be at most [`MAX_SKU_LENGTH`] characters
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_sku;
///
/// assert!(validate_sku("A1").is_ok());
/// assert!(validate_sku("  ").is_err());
/// assert!(validate_sku("A1 ").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    if sku.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.trim().len() != sku.len() {
        return Err(ValidationError::Padded {
            field: "sku".to_string(),
        });
    }

    if sku.len() > MAX_SKU_LENGTH {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LENGTH,
        });
    }

    Ok(())
}

/// Validates a requested quantity.
///
/// Zero and negative quantities are rejected; the database additionally
/// enforces `quantity > 0` as a CHECK constraint.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Request Validator
// =============================================================================

/// Validates a whole [`OrderRequest`] before it touches storage.
///
/// ## Rules
/// - At least one line item
/// - At most [`MAX_ORDER_LINES`] line items
/// - Every line passes [`validate_sku`] and [`validate_quantity`]
pub fn validate_order_request(request: &OrderRequest) -> ValidationResult<()> {
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if request.items.len() > MAX_ORDER_LINES {
        return Err(ValidationError::TooMany {
            field: "items".to_string(),
            max: MAX_ORDER_LINES,
        });
    }

    for line in &request.items {
        validate_sku(&line.sku)?;
        validate_quantity(line.quantity)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;

    #[test]
    fn test_valid_request_passes() {
        let req = OrderRequest::new(1, vec![LineItem::new("A1", 3)]);
        assert!(validate_order_request(&req).is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let req = OrderRequest::new(1, vec![]);
        assert!(matches!(
            validate_order_request(&req),
            Err(ValidationError::Required { .. })
        ));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        for qty in [0, -1] {
            let req = OrderRequest::new(1, vec![LineItem::new("A1", qty)]);
            assert!(matches!(
                validate_order_request(&req),
                Err(ValidationError::MustBePositive { .. })
            ));
        }
    }

    #[test]
    fn test_blank_sku_rejected() {
        let req = OrderRequest::new(1, vec![LineItem::new("   ", 1)]);
        assert!(validate_order_request(&req).is_err());
    }

    #[test]
    fn test_padded_sku_rejected() {
        for sku in ["A1 ", " A1", "\tA1"] {
            assert!(matches!(
                validate_sku(sku),
                Err(ValidationError::Padded { .. })
            ));
        }
    }

    #[test]
    fn test_overlong_sku_rejected() {
        let sku = "X".repeat(MAX_SKU_LENGTH + 1);
        assert!(matches!(
            validate_sku(&sku),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let items = (0..=MAX_ORDER_LINES)
            .map(|i| LineItem::new(format!("SKU-{i}"), 1))
            .collect();
        let req = OrderRequest::new(1, items);
        assert!(matches!(
            validate_order_request(&req),
            Err(ValidationError::TooMany { .. })
        ));
    }
}
