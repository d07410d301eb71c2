//! Line item type.

use serde::{Deserialize, Serialize};

use crate::error::CommerceError;
use crate::money::Money;

/// Attribute carrying the product name on a buy control.
pub const ATTR_PRODUCT: &str = "data-product";

/// Attribute carrying the decimal price on a buy control.
pub const ATTR_PRICE: &str = "data-price";

/// A single cart entry: one product name and its price.
///
/// Line items carry no quantity. Adding the same product twice yields two
/// entries. Fields are private so an item cannot change once created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawLineItem")]
pub struct LineItem {
    name: String,
    price: Money,
}

/// Wire form of a [`LineItem`], validated on the way in.
#[derive(Deserialize)]
struct RawLineItem {
    name: String,
    price: Money,
}

impl TryFrom<RawLineItem> for LineItem {
    type Error = CommerceError;

    fn try_from(raw: RawLineItem) -> Result<Self, Self::Error> {
        Self::new(raw.name, raw.price)
    }
}

impl LineItem {
    /// Create a line item from a name and an already-validated price.
    pub fn new(name: impl Into<String>, price: Money) -> Result<Self, CommerceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CommerceError::InvalidProductName(name));
        }
        Ok(Self { name, price })
    }

    /// Create a line item from a name and a decimal price string.
    pub fn parse(name: impl Into<String>, price: &str) -> Result<Self, CommerceError> {
        Self::new(name, Money::parse(price)?)
    }

    /// Create a line item from a buy control's product attributes.
    ///
    /// Either attribute may be absent on a malformed control; both are
    /// required.
    pub fn from_attributes(
        product: Option<&str>,
        price: Option<&str>,
    ) -> Result<Self, CommerceError> {
        let name = product.ok_or(CommerceError::MissingAttribute(ATTR_PRODUCT))?;
        let price = price.ok_or(CommerceError::MissingAttribute(ATTR_PRICE))?;
        Self::parse(name, price)
    }

    /// Product name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item price.
    pub fn price(&self) -> Money {
        self.price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_parse() {
        let item = LineItem::parse("Silk Scarf", "45.00").unwrap();
        assert_eq!(item.name(), "Silk Scarf");
        assert_eq!(item.price(), Money::new(4500));
    }

    #[test]
    fn test_line_item_rejects_bad_price() {
        assert!(matches!(
            LineItem::parse("Silk Scarf", "forty"),
            Err(CommerceError::InvalidPrice { .. })
        ));
        assert!(matches!(
            LineItem::parse("Silk Scarf", "-5"),
            Err(CommerceError::InvalidPrice { .. })
        ));
    }

    #[test]
    fn test_line_item_rejects_blank_name() {
        assert_eq!(
            LineItem::parse("  ", "5.00"),
            Err(CommerceError::InvalidProductName("  ".to_string()))
        );
    }

    #[test]
    fn test_deserialize_validates_name() {
        let item: LineItem = serde_json::from_str(r#"{"name":"Tote Bag","price":3000}"#).unwrap();
        assert_eq!(item, LineItem::parse("Tote Bag", "30.00").unwrap());

        assert!(serde_json::from_str::<LineItem>(r#"{"name":" ","price":3000}"#).is_err());
    }

    #[test]
    fn test_from_attributes() {
        let item = LineItem::from_attributes(Some("Tote Bag"), Some("30")).unwrap();
        assert_eq!(item.price().display(), "$30.00");

        assert_eq!(
            LineItem::from_attributes(None, Some("30")),
            Err(CommerceError::MissingAttribute(ATTR_PRODUCT))
        );
        assert_eq!(
            LineItem::from_attributes(Some("Tote Bag"), None),
            Err(CommerceError::MissingAttribute(ATTR_PRICE))
        );
    }
}
