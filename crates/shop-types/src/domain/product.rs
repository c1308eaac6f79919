use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub images: Vec<String>,
    pub category: String,
    pub stock: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: String,
    #[serde(default)]
    pub stock: u32,
}

/// Partial update; `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
}

fn check_price(price: f64) -> anyhow::Result<()> {
    if !price.is_finite() || price < 0.0 {
        anyhow::bail!("price must be a non-negative number");
    }
    Ok(())
}

fn check_text(field: &str, value: &str) -> anyhow::Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{field} empty");
    }
    Ok(())
}

impl Product {
    pub fn new(input: NewProduct) -> anyhow::Result<Self> {
        check_text("name", &input.name)?;
        check_text("description", &input.description)?;
        check_text("category", &input.category)?;
        check_price(input.price)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            price: input.price,
            images: input.images,
            category: input.category,
            stock: input.stock,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validates the whole patch before touching any field.
    pub fn apply(&mut self, patch: ProductPatch) -> anyhow::Result<()> {
        if let Some(name) = &patch.name {
            check_text("name", name)?;
        }
        if let Some(description) = &patch.description {
            check_text("description", description)?;
        }
        if let Some(category) = &patch.category {
            check_text("category", category)?;
        }
        if let Some(price) = patch.price {
            check_price(price)?;
        }

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(price) = patch.price {
            self.price = price;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Catalog search criteria. Every populated field must match.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl ProductFilter {
    pub fn keyword_lower(&self) -> Option<String> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_lowercase)
    }

    pub fn category_lower(&self) -> Option<String> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, p: &Product) -> bool {
        if let Some(k) = self.keyword_lower() {
            if !p.name.to_lowercase().contains(&k) && !p.description.to_lowercase().contains(&k) {
                return false;
            }
        }
        if let Some(c) = self.category_lower() {
            if p.category.to_lowercase() != c {
                return false;
            }
        }
        if let Some(min) = self.min_price {
            if p.price < min {
                return false;
            }
        }
        if let Some(max) = self.max_price {
            if p.price > max {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lamp() -> NewProduct {
        NewProduct {
            name: "Desk Lamp".into(),
            description: "Warm LED light".into(),
            price: 24.5,
            images: vec!["/uploads/lamp.png".into()],
            category: "Lighting".into(),
            stock: 3,
        }
    }

    #[test]
    fn new_product_keeps_supplied_fields() {
        let p = Product::new(lamp()).unwrap();
        assert_eq!(p.name, "Desk Lamp");
        assert_eq!(p.price, 24.5);
        assert_eq!(p.images, vec!["/uploads/lamp.png".to_string()]);
        assert_eq!(p.stock, 3);
    }

    #[test]
    fn validation_errors() {
        let mut bad = lamp();
        bad.price = -1.0;
        assert!(Product::new(bad).is_err());

        let mut nan = lamp();
        nan.price = f64::NAN;
        assert!(Product::new(nan).is_err());

        let mut no_name = lamp();
        no_name.name = "  ".into();
        assert!(Product::new(no_name).is_err());
    }

    #[test]
    fn apply_is_all_or_nothing() {
        let mut p = Product::new(lamp()).unwrap();
        let res = p.apply(ProductPatch {
            name: Some("Floor Lamp".into()),
            price: Some(-3.0),
            ..Default::default()
        });
        assert!(res.is_err());
        assert_eq!(p.name, "Desk Lamp");

        p.apply(ProductPatch {
            stock: Some(0),
            price: Some(30.0),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(p.stock, 0);
        assert_eq!(p.price, 30.0);
        assert_eq!(p.name, "Desk Lamp");
    }

    #[test]
    fn filter_matches_keyword_category_and_range() {
        let p = Product::new(lamp()).unwrap();
        let by_keyword = ProductFilter {
            keyword: Some("led".into()),
            ..Default::default()
        };
        assert!(by_keyword.matches(&p));

        let wrong_category = ProductFilter {
            category: Some("kitchen".into()),
            ..Default::default()
        };
        assert!(!wrong_category.matches(&p));

        let in_range = ProductFilter {
            category: Some("lighting".into()),
            min_price: Some(24.5),
            max_price: Some(25.0),
            ..Default::default()
        };
        assert!(in_range.matches(&p));

        let too_cheap = ProductFilter {
            max_price: Some(10.0),
            ..Default::default()
        };
        assert!(!too_cheap.matches(&p));
    }
}
