use rust_decimal::{Decimal, RoundingStrategy};

use crate::domain::{NewSale, SalesDraft};

use super::error::ValidationError;

/// Monetary scale of a stored amount.
pub const AMOUNT_SCALE: u32 = 2;

/// Validate a candidate record.
///
/// Product and region are trimmed and the amount is rounded to two
/// decimal places before the positivity check, so the returned sale
/// is exactly what gets stored.
pub fn validate(candidate: Option<&SalesDraft>) -> Result<NewSale, ValidationError> {
    let Some(draft) = candidate else {
        return Err(ValidationError::new("Sales cannot be null"));
    };

    let Some(sale_date) = draft.sale_date else {
        return Err(ValidationError::new("Sale date cannot be null"));
    };

    let product = non_blank(draft.product.as_deref())
        .ok_or_else(|| ValidationError::new("Product cannot be null or empty"))?;

    let region = non_blank(draft.region.as_deref())
        .ok_or_else(|| ValidationError::new("Region cannot be null or empty"))?;

    let amount = draft
        .amount
        .map(round_amount)
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or_else(|| ValidationError::new("Amount must be greater than zero"))?;

    Ok(NewSale {
        sale_date,
        product: product.to_string(),
        region: region.to_string(),
        amount,
    })
}

/// Validate every draft in order, stopping at the first failure.
pub fn validate_all(drafts: &[SalesDraft]) -> Result<Vec<NewSale>, ValidationError> {
    drafts.iter().map(|draft| validate(Some(draft))).collect()
}

/// Round half away from zero to the stored scale.
pub fn round_amount(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(AMOUNT_SCALE);
    rounded
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_draft() -> SalesDraft {
        SalesDraft::new(
            NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            "A",
            "East",
            Decimal::new(129900, 2),
        )
    }

    fn reason(draft: SalesDraft) -> String {
        validate(Some(&draft)).unwrap_err().reason().to_string()
    }

    #[test]
    fn test_valid_draft() {
        let sale = validate(Some(&valid_draft())).unwrap();

        assert_eq!(sale.product, "A");
        assert_eq!(sale.region, "East");
        assert_eq!(sale.amount, Decimal::new(129900, 2));
    }

    #[test]
    fn test_missing_record() {
        let err = validate(None).unwrap_err();
        assert_eq!(err.reason(), "Sales cannot be null");
    }

    #[test]
    fn test_missing_date() {
        let draft = SalesDraft {
            sale_date: None,
            ..valid_draft()
        };
        assert_eq!(reason(draft), "Sale date cannot be null");
    }

    #[test]
    fn test_blank_product_and_region() {
        let draft = SalesDraft {
            product: Some("   ".to_string()),
            ..valid_draft()
        };
        assert_eq!(reason(draft), "Product cannot be null or empty");

        let draft = SalesDraft {
            region: None,
            ..valid_draft()
        };
        assert_eq!(reason(draft), "Region cannot be null or empty");
    }

    #[test]
    fn test_non_positive_amount() {
        for amount in [None, Some(Decimal::ZERO), Some(Decimal::new(-5, 0))] {
            let draft = SalesDraft {
                amount,
                ..valid_draft()
            };
            assert_eq!(reason(draft), "Amount must be greater than zero");
        }
    }

    #[test]
    fn test_amount_that_rounds_to_zero() {
        let draft = SalesDraft {
            amount: Some(Decimal::new(4, 3)), // 0.004
            ..valid_draft()
        };
        assert!(validate(Some(&draft)).is_err());
    }

    #[test]
    fn test_normalization() {
        let draft = SalesDraft {
            product: Some("  A ".to_string()),
            amount: Some(Decimal::new(100005, 3)), // 100.005
            ..valid_draft()
        };
        let sale = validate(Some(&draft)).unwrap();

        assert_eq!(sale.product, "A");
        assert_eq!(sale.amount, Decimal::new(10001, 2));
        assert_eq!(sale.amount.scale(), 2);
    }

    #[test]
    fn test_integer_amount_gets_scale() {
        assert_eq!(round_amount(Decimal::new(1299, 0)).to_string(), "1299.00");
    }

    #[test]
    fn test_validate_all_stops_at_first_failure() {
        let drafts = vec![
            valid_draft(),
            SalesDraft {
                product: None,
                ..valid_draft()
            },
            SalesDraft {
                region: None,
                ..valid_draft()
            },
        ];

        let err = validate_all(&drafts).unwrap_err();
        assert_eq!(err.reason(), "Product cannot be null or empty");
    }
}
