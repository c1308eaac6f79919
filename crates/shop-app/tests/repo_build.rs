use shop_repo::{build_repo, Repo};
use shop_types::ports::order_repository::OrderRepository;
use shop_types::ports::product_repository::ProductRepository;
use shop_types::ports::user_repository::UserRepository;

#[tokio::test]
async fn builds_sqlite_repo_from_url() {
    // Use a temp DB path for isolation.
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("data").join("shop-test.db");
    let url = format!("sqlite://{}", db_path.display());

    let repo: Repo = build_repo(Some(&url)).await.expect("build repo");
    assert_eq!(repo.backend_name(), "sqlite");
    assert!(db_path.exists());

    // basic sanity: every collection starts empty
    assert!(repo.list_users().await.expect("users").is_empty());
    assert!(repo.list_products().await.expect("products").is_empty());
    assert!(repo.list_orders().await.expect("orders").is_empty());
}
