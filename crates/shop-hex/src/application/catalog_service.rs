use crate::errors::AppError;
use shop_types::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_TOP_LIMIT: usize = 5;
pub const MAX_TOP_LIMIT: usize = 50;

pub struct CatalogService<R>
where
    R: ProductRepository + OrderRepository,
{
    repo: Arc<R>,
}

impl<R> CatalogService<R>
where
    R: ProductRepository + OrderRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.repo.list_products().await?)
    }

    pub async fn search_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, AppError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(AppError::BadRequest("minPrice must not exceed maxPrice".into()));
            }
        }
        Ok(self.repo.search_products(filter).await?)
    }

    /// Best sellers by units ordered, newest first among equals.
    pub async fn top_products(&self, limit: Option<usize>) -> Result<Vec<Product>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);

        let mut units: HashMap<Uuid, u64> = HashMap::new();
        for order in self.repo.list_orders().await? {
            for item in order.items {
                *units.entry(item.product_id).or_default() += u64::from(item.quantity);
            }
        }

        let mut products = self.repo.list_products().await?;
        products.sort_by(|a, b| {
            let ua = units.get(&a.id).copied().unwrap_or(0);
            let ub = units.get(&b.id).copied().unwrap_or(0);
            ub.cmp(&ua).then_with(|| b.created_at.cmp(&a.created_at))
        });
        products.truncate(limit);
        Ok(products)
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))
    }

    pub async fn create_product(&self, input: NewProduct) -> Result<Product, AppError> {
        let product = Product::new(input).map_err(|e| AppError::BadRequest(e.to_string()))?;
        let product = self.repo.create_product(product).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    pub async fn update_product(&self, id: Uuid, patch: ProductPatch) -> Result<Product, AppError> {
        let mut product = self.get_product(id).await?;
        product
            .apply(patch)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.repo
            .update_product(product)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".into()))
    }

    /// Orders keep their line items for the removed product.
    pub async fn delete_product(&self, id: Uuid) -> Result<(), AppError> {
        if self.repo.delete_product(id).await? {
            tracing::info!(product_id = %id, "product deleted");
            Ok(())
        } else {
            Err(AppError::NotFound("Product not found".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shop_repo::memory::InMemoryRepo;
    use shop_types::domain::order::{LineItem, Order};

    fn input(name: &str, price: f64) -> NewProduct {
        NewProduct {
            name: name.into(),
            description: format!("{name} description"),
            price,
            images: vec![],
            category: "General".into(),
            stock: 5,
        }
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let created = svc.create_product(input("Kettle", 30.0)).await.unwrap();
        assert_eq!(svc.get_product(created.id).await.unwrap(), created);

        let updated = svc
            .update_product(
                created.id,
                ProductPatch {
                    stock: Some(0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 0);
        assert_eq!(updated.name, "Kettle");

        svc.delete_product(created.id).await.unwrap();
        assert!(matches!(
            svc.get_product(created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.delete_product(created.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.update_product(created.id, ProductPatch::default()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn invalid_product_is_rejected() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let res = svc.create_product(input("Broken", -1.0)).await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
        assert!(svc.list_products().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_rejects_inverted_price_range() {
        let svc = CatalogService::new(Arc::new(InMemoryRepo::new()));
        let res = svc
            .search_products(&ProductFilter {
                min_price: Some(10.0),
                max_price: Some(1.0),
                ..Default::default()
            })
            .await;
        assert!(matches!(res, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn top_products_ranks_by_units_ordered() {
        let repo = Arc::new(InMemoryRepo::new());
        let svc = CatalogService::new(repo.clone());
        let a = svc.create_product(input("A", 1.0)).await.unwrap();
        let b = svc.create_product(input("B", 1.0)).await.unwrap();
        let c = svc.create_product(input("C", 1.0)).await.unwrap();

        let order = Order::new(
            Uuid::new_v4(),
            vec![
                LineItem {
                    product_id: b.id,
                    quantity: 5,
                },
                LineItem {
                    product_id: a.id,
                    quantity: 1,
                },
            ],
            6.0,
        )
        .unwrap();
        repo.create_order(order).await.unwrap();

        let top = svc.top_products(Some(2)).await.unwrap();
        let ids: Vec<Uuid> = top.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![b.id, a.id]);

        let all = svc.top_products(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[2].id, c.id);
    }
}
