//! Product domain types and form validation.

use chrono::{DateTime, Utc};
use thiserror::Error;

use emporium_core::{Price, PriceError, ProductId};

/// A catalog product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Image path relative to the static directory, e.g. `uploads/tea.png`.
    pub image_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Public URL of the product image.
    #[must_use]
    pub fn image_src(&self) -> String {
        format!("/static/{}", self.image_url)
    }
}

/// Errors in the text fields of the product form.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProductInputError {
    #[error("Product name is required")]
    MissingName,
    #[error("Product name must be at most {max} characters")]
    NameTooLong { max: usize },
    #[error("Product description is required")]
    MissingDescription,
    #[error("Invalid price: {0}")]
    Price(#[from] PriceError),
}

/// Validated text fields of the add/edit product form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: Price,
}

impl ProductInput {
    /// Maximum product name length in characters.
    pub const MAX_NAME_LENGTH: usize = 100;

    /// Validate raw form values.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProductInputError`] found, checking name,
    /// description and price in form order.
    pub fn parse(name: &str, description: &str, price: &str) -> Result<Self, ProductInputError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProductInputError::MissingName);
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(ProductInputError::NameTooLong {
                max: Self::MAX_NAME_LENGTH,
            });
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(ProductInputError::MissingDescription);
        }

        let price = Price::parse(price)?;

        Ok(Self {
            name: name.to_owned(),
            description: description.to_owned(),
            price,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_fields() {
        let input = ProductInput::parse("  Green Tea ", " Loose leaf\n", "12.5").unwrap();
        assert_eq!(input.name, "Green Tea");
        assert_eq!(input.description, "Loose leaf");
        assert_eq!(input.price.to_string(), "¥12.50");
    }

    #[test]
    fn test_parse_requires_name_and_description() {
        assert_eq!(
            ProductInput::parse("  ", "desc", "1"),
            Err(ProductInputError::MissingName)
        );
        assert_eq!(
            ProductInput::parse("Tea", "", "1"),
            Err(ProductInputError::MissingDescription)
        );
    }

    #[test]
    fn test_parse_limits_name_length() {
        let long_name = "x".repeat(101);
        assert_eq!(
            ProductInput::parse(&long_name, "desc", "1"),
            Err(ProductInputError::NameTooLong { max: 100 })
        );
        assert!(ProductInput::parse(&"x".repeat(100), "desc", "1").is_ok());
    }

    #[test]
    fn test_parse_rejects_bad_price() {
        assert_eq!(
            ProductInput::parse("Tea", "desc", "0"),
            Err(ProductInputError::Price(PriceError::TooLow))
        );
        assert_eq!(
            ProductInput::parse("Tea", "desc", "free"),
            Err(ProductInputError::Price(PriceError::NotANumber))
        );
    }

    #[test]
    fn test_image_src_is_under_static() {
        let product = Product {
            id: ProductId::new(1),
            name: "Tea".into(),
            description: "Leaves".into(),
            price: Price::parse("3").unwrap(),
            image_url: "uploads/tea.png".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(product.image_src(), "/static/uploads/tea.png");
    }
}
