#![cfg(feature = "memory")]

use shop_repo::memory::InMemoryRepo;
use shop_types::domain::order::{LineItem, Order};
use shop_types::domain::product::{NewProduct, Product, ProductFilter, ProductPatch};
use shop_types::domain::user::User;
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;
use shop_types::ports::RepoError;

fn widget() -> Product {
    Product::new(NewProduct {
        name: "Widget".into(),
        description: "A small widget".into(),
        price: 5.0,
        images: vec![],
        category: "Gadgets".into(),
        stock: 10,
    })
    .unwrap()
}

#[tokio::test]
async fn memory_repo_user_flow_enforces_unique_email() {
    let repo = InMemoryRepo::new();
    let user = User::new("Test".into(), "test@example.com", "hash".into()).unwrap();
    repo.create_user(user.clone()).await.unwrap();

    let dup = User::new("Other".into(), "test@example.com", "hash".into()).unwrap();
    let res = repo.create_user(dup).await;
    assert!(matches!(res, Err(RepoError::Conflict(_))));

    let found = repo
        .find_user_by_email("test@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, user.id);
    assert_eq!(found.name, "Test");

    let mut renamed = found.clone();
    renamed.email = "new@example.com".into();
    repo.update_user(renamed).await.unwrap().unwrap();
    assert!(repo
        .find_user_by_email("test@example.com")
        .await
        .unwrap()
        .is_none());

    // The old address is free again.
    let reuse = User::new("Reuse".into(), "test@example.com", "hash".into()).unwrap();
    repo.create_user(reuse).await.unwrap();
    assert_eq!(repo.list_users().await.unwrap().len(), 2);

    assert!(repo.delete_user(user.id).await.unwrap());
    assert!(repo.get_user(user.id).await.unwrap().is_none());
    assert!(repo
        .find_user_by_email("new@example.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn memory_repo_update_cannot_steal_an_email() {
    let repo = InMemoryRepo::new();
    let a = User::new("A".into(), "a@example.com", "hash".into()).unwrap();
    let b = User::new("B".into(), "b@example.com", "hash".into()).unwrap();
    repo.create_user(a.clone()).await.unwrap();
    repo.create_user(b.clone()).await.unwrap();

    let mut hijack = b.clone();
    hijack.email = "a@example.com".into();
    let res = repo.update_user(hijack).await;
    assert!(matches!(res, Err(RepoError::Conflict(_))));
    let still_b = repo.get_user(b.id).await.unwrap().unwrap();
    assert_eq!(still_b.email, "b@example.com");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_repo_concurrent_email_changes_leave_one_index_entry() {
    let repo = InMemoryRepo::new();
    let user = User::new("Racer".into(), "racer@example.com", "hash".into()).unwrap();
    repo.create_user(user.clone()).await.unwrap();

    for round in 0..200 {
        let mut handles = Vec::new();
        for n in 0..4 {
            let repo = repo.clone();
            let mut changed = user.clone();
            changed.email = format!("racer-{round}-{n}@example.com");
            handles.push(tokio::spawn(async move { repo.update_user(changed).await }));
        }
        for h in handles {
            h.await.unwrap().unwrap();
        }
    }

    let stored = repo.get_user(user.id).await.unwrap().unwrap();
    let owned: Vec<String> = repo
        .emails
        .iter()
        .filter(|kv| *kv.value() == user.id)
        .map(|kv| kv.key().clone())
        .collect();
    assert_eq!(owned, vec![stored.email]);

    assert!(repo.delete_user(user.id).await.unwrap());
    assert!(repo.emails.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn memory_repo_update_does_not_resurrect_deleted_user() {
    let repo = InMemoryRepo::new();
    for _ in 0..100 {
        let user = User::new("Gone".into(), "gone@example.com", "hash".into()).unwrap();
        repo.create_user(user.clone()).await.unwrap();

        let mut changed = user.clone();
        changed.email = "moved@example.com".into();
        let updater = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.update_user(changed).await })
        };
        let deleter = {
            let repo = repo.clone();
            tokio::spawn(async move { repo.delete_user(user.id).await })
        };
        updater.await.unwrap().unwrap();
        assert!(deleter.await.unwrap().unwrap());

        assert!(repo.get_user(user.id).await.unwrap().is_none());
        assert!(repo.emails.is_empty());
    }
}

#[tokio::test]
async fn memory_repo_product_crud_and_search() {
    let repo = InMemoryRepo::new();
    let product = widget();
    repo.create_product(product.clone()).await.unwrap();

    let mut changed = product.clone();
    changed
        .apply(ProductPatch {
            price: Some(7.5),
            ..Default::default()
        })
        .unwrap();
    let updated = repo.update_product(changed).await.unwrap().unwrap();
    assert_eq!(updated.price, 7.5);

    let hits = repo
        .search_products(&ProductFilter {
            keyword: Some("WIDGET".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let misses = repo
        .search_products(&ProductFilter {
            min_price: Some(100.0),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(misses.is_empty());

    assert!(repo.delete_product(product.id).await.unwrap());
    assert!(!repo.delete_product(product.id).await.unwrap());
    assert!(repo.update_product(product).await.unwrap().is_none());
}

#[tokio::test]
async fn memory_repo_order_flow() {
    let repo = InMemoryRepo::new();
    let owner = uuid::Uuid::new_v4();
    let order = Order::new(
        owner,
        vec![LineItem {
            product_id: uuid::Uuid::new_v4(),
            quantity: 2,
        }],
        10.0,
    )
    .unwrap();
    repo.create_order(order.clone()).await.unwrap();
    let other = Order::new(
        uuid::Uuid::new_v4(),
        vec![LineItem {
            product_id: uuid::Uuid::new_v4(),
            quantity: 1,
        }],
        1.0,
    )
    .unwrap();
    repo.create_order(other).await.unwrap();

    assert_eq!(repo.list_orders().await.unwrap().len(), 2);
    let mine = repo.list_orders_for_user(owner).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, order.id);

    let mut shipped = order.clone();
    shipped.update_status("Shipped".into());
    let updated = repo.update_order(shipped).await.unwrap().unwrap();
    assert_eq!(updated.status, "Shipped");
    assert_eq!(
        repo.get_order(order.id).await.unwrap().unwrap().status,
        "Shipped"
    );
}

#[tokio::test]
async fn memory_repo_handles_missing_rows() {
    let repo = InMemoryRepo::new();
    assert!(repo.get_user(uuid::Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.get_product(uuid::Uuid::new_v4()).await.unwrap().is_none());
    assert!(repo.get_order(uuid::Uuid::new_v4()).await.unwrap().is_none());
    assert!(!repo.delete_user(uuid::Uuid::new_v4()).await.unwrap());

    let ghost = Order::new(
        uuid::Uuid::new_v4(),
        vec![LineItem {
            product_id: uuid::Uuid::new_v4(),
            quantity: 1,
        }],
        1.0,
    )
    .unwrap();
    assert!(repo.update_order(ghost).await.unwrap().is_none());
}
