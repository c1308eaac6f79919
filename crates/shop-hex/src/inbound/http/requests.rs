//! Request bodies accepted by the HTTP surface.
//!
//! Fields are optional at the serde level so that a missing value becomes a
//! field error from [`Validate`] instead of an opaque parse failure.

use serde::Deserialize;
use shop_types::domain::order::{LineItem, PaymentMethod};
use shop_types::domain::product::{NewProduct, ProductPatch};
use shop_types::domain::user::Address;
use uuid::Uuid;

use crate::application::order_service::{OrderDraft, MSG_NO_PRODUCTS};
use crate::application::user_service::ProfileUpdate;
use crate::errors::FieldError;
use crate::inbound::http::extract::{require_text, Validate};

pub const MIN_PASSWORD_LEN: usize = 6;

fn check_email(errors: &mut Vec<FieldError>, email: &Option<String>) {
    match email.as_deref().map(str::trim) {
        None | Some("") => errors.push(FieldError::new("email", "email is required")),
        Some(e) if !e.contains('@') => {
            errors.push(FieldError::new("email", "Please include a valid email"))
        }
        _ => {}
    }
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", &self.name);
        check_email(&mut errors, &self.email);
        if self.password.as_deref().map_or(0, str::len) < MIN_PASSWORD_LEN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_email(&mut errors, &self.email);
        if self.password.as_deref().unwrap_or_default().is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.name.is_some() {
            require_text(&mut errors, "name", &self.name);
        }
        if self.email.is_some() {
            check_email(&mut errors, &self.email);
        }
        if let Some(pw) = &self.password {
            if pw.len() < MIN_PASSWORD_LEN {
                errors.push(FieldError::new(
                    "password",
                    format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
                ));
            }
        }
        errors
    }
}

impl From<UpdateProfileRequest> for ProfileUpdate {
    fn from(r: UpdateProfileRequest) -> Self {
        Self {
            name: r.name,
            email: r.email,
            password: r.password,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Validate for AddressRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "street", &self.street);
        require_text(&mut errors, "city", &self.city);
        require_text(&mut errors, "state", &self.state);
        require_text(&mut errors, "postalCode", &self.postal_code);
        require_text(&mut errors, "country", &self.country);
        errors
    }
}

impl From<AddressRequest> for Address {
    fn from(r: AddressRequest) -> Self {
        let text = |v: Option<String>| v.unwrap_or_default().trim().to_string();
        Self {
            street: text(r.street),
            city: text(r.city),
            state: text(r.state),
            postal_code: text(r.postal_code),
            country: text(r.country),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRequest {
    pub product_id: Option<Uuid>,
    pub quantity: Option<i64>,
}

fn check_items(errors: &mut Vec<FieldError>, items: &Option<Vec<LineItemRequest>>) {
    let Some(items) = items.as_ref().filter(|i| !i.is_empty()) else {
        errors.push(FieldError::new("products", MSG_NO_PRODUCTS));
        return;
    };
    for (i, item) in items.iter().enumerate() {
        if item.product_id.is_none() {
            errors.push(FieldError::new(
                &format!("products[{i}].productId"),
                "productId is required",
            ));
        }
        match item.quantity {
            Some(q) if (1..=i64::from(u32::MAX)).contains(&q) => {}
            _ => errors.push(FieldError::new(
                &format!("products[{i}].quantity"),
                "quantity must be at least 1",
            )),
        }
    }
}

fn check_total(errors: &mut Vec<FieldError>, total: Option<f64>) {
    if let Some(t) = total {
        if !t.is_finite() || t < 0.0 {
            errors.push(FieldError::new("totalPrice", "totalPrice must be a non-negative number"));
        }
    }
}

/// Only call after validation: invalid entries are dropped here.
fn line_items(items: Option<Vec<LineItemRequest>>) -> Vec<LineItem> {
    items
        .unwrap_or_default()
        .into_iter()
        .filter_map(|it| {
            Some(LineItem {
                product_id: it.product_id?,
                quantity: u32::try_from(it.quantity?).ok()?,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(alias = "items")]
    pub products: Option<Vec<LineItemRequest>>,
    pub total_price: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
}

impl Validate for CreateOrderRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_items(&mut errors, &self.products);
        check_total(&mut errors, self.total_price);
        errors
    }
}

impl From<CreateOrderRequest> for OrderDraft {
    fn from(r: CreateOrderRequest) -> Self {
        Self {
            items: line_items(r.products),
            total_price: r.total_price,
            payment_method: r.payment_method,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(alias = "items")]
    pub products: Option<Vec<LineItemRequest>>,
    pub total_price: Option<f64>,
    pub payment_method: Option<PaymentMethod>,
    pub address_index: Option<usize>,
}

impl Validate for CheckoutRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        check_items(&mut errors, &self.products);
        check_total(&mut errors, self.total_price);
        errors
    }
}

impl CheckoutRequest {
    pub fn into_parts(self) -> (OrderDraft, Option<usize>) {
        let draft = OrderDraft {
            items: line_items(self.products),
            total_price: self.total_price,
            payment_method: self.payment_method,
        };
        (draft, self.address_index)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerStatusRequest {
    pub order_id: Option<Uuid>,
    pub status: Option<String>,
}

impl Validate for CustomerStatusRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.order_id.is_none() {
            errors.push(FieldError::new("orderId", "orderId is required"));
        }
        require_text(&mut errors, "status", &self.status);
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct AdminStatusRequest {
    pub status: Option<String>,
}

impl Validate for AdminStatusRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.status.is_some() {
            require_text(&mut errors, "status", &self.status);
        }
        errors
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
    pub stock: Option<u32>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        require_text(&mut errors, "name", &self.name);
        require_text(&mut errors, "description", &self.description);
        require_text(&mut errors, "category", &self.category);
        match self.price {
            Some(p) if p.is_finite() && p >= 0.0 => {}
            Some(_) => errors.push(FieldError::new("price", "price must be a non-negative number")),
            None => errors.push(FieldError::new("price", "price is required")),
        }
        errors
    }
}

impl From<CreateProductRequest> for NewProduct {
    fn from(r: CreateProductRequest) -> Self {
        Self {
            name: r.name.unwrap_or_default(),
            description: r.description.unwrap_or_default(),
            price: r.price.unwrap_or_default(),
            images: r.images.unwrap_or_default(),
            category: r.category.unwrap_or_default(),
            stock: r.stock.unwrap_or_default(),
        }
    }
}

impl Validate for ProductPatch {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("description", &self.description),
            ("category", &self.category),
        ] {
            if value.is_some() {
                require_text(&mut errors, field, value);
            }
        }
        if let Some(p) = self.price {
            if !p.is_finite() || p < 0.0 {
                errors.push(FieldError::new("price", "price must be a non-negative number"));
            }
        }
        errors
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub keyword: Option<String>,
    pub category: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<usize>,
}
