use std::sync::Arc;

use shop_client::{ApiError, CheckoutRequest, NewOrder, RegisterRequest, ShopClient};
use shop_hex::application::policy::{OrderPolicy, PricePolicy, StatusPolicy};
use shop_hex::application::uploads::UploadStore;
use shop_hex::auth::token::TokenService;
use shop_hex::inbound::http::{AppState, HttpServer, HttpServerConfig};
use shop_repo::memory::InMemoryRepo;
use shop_types::domain::order::{LineItem, PaymentMethod};
use shop_types::domain::product::{NewProduct, ProductPatch};
use shop_types::domain::user::Address;

fn find_free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

// Full customer and admin journey through the typed client, with the
// server computing totals and enforcing the status lifecycle.
#[tokio::test]
async fn client_drives_real_server() {
    let uploads = tempfile::tempdir().unwrap();
    let port = find_free_port();
    let state = AppState::new(
        Arc::new(InMemoryRepo::new()),
        TokenService::new("e2e-secret"),
        OrderPolicy {
            price: PricePolicy::Server,
            status: StatusPolicy::Lifecycle,
        },
        UploadStore::new(uploads.path()),
    );
    state
        .users
        .ensure_admin("Admin", "admin@shop.test", "admin-pass".into())
        .await
        .unwrap();
    let server = HttpServer::new(
        state,
        HttpServerConfig {
            port: port.to_string(),
        },
    );
    let handle = tokio::spawn(async move {
        server.run().await.expect("server run");
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    let anon = ShopClient::new(&format!("http://127.0.0.1:{port}/")).unwrap();
    assert!(anon.health().await.unwrap());

    let admin_auth = anon.login("admin@shop.test", "admin-pass").await.unwrap();
    let admin = anon.with_token(admin_auth.token);

    let image = admin
        .upload_image("chair.jpg", "image/jpeg", b"\xff\xd8\xff fake jpeg".to_vec())
        .await
        .unwrap();
    let chair = admin
        .create_product(&NewProduct {
            name: "Chair".into(),
            description: "Oak chair".into(),
            price: 40.0,
            images: vec![image],
            category: "Furniture".into(),
            stock: 2,
        })
        .await
        .unwrap();
    let chair = admin
        .update_product(
            chair.id,
            &ProductPatch {
                price: Some(45.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(anon.get_product(chair.id).await.unwrap().price, 45.0);

    let auth = anon
        .register(&RegisterRequest {
            name: "Ivy".into(),
            email: "ivy@example.com".into(),
            password: "password1".into(),
        })
        .await
        .unwrap();
    let ivy = anon.with_token(auth.token);
    ivy.add_address(&Address {
        street: "9 Elm".into(),
        city: "Austin".into(),
        state: "TX".into(),
        postal_code: "73301".into(),
        country: "US".into(),
    })
    .await
    .unwrap();

    let order = ivy
        .checkout(&CheckoutRequest {
            order: NewOrder {
                products: vec![LineItem {
                    product_id: chair.id,
                    quantity: 2,
                }],
                // Ignored under the server price policy.
                total_price: Some(1.0),
                payment_method: Some(PaymentMethod::CreditCard),
            },
            address_index: Some(0),
        })
        .await
        .unwrap();
    assert_eq!(order.total_price, 90.0);
    assert_eq!(ivy.order_history().await.unwrap().len(), 1);
    assert_eq!(anon.top_products(Some(1)).await.unwrap()[0].id, chair.id);

    let err = ivy
        .update_order_status(order.id, "Delivered")
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ApiError>().unwrap().status,
        reqwest::StatusCode::BAD_REQUEST
    );
    let processing = admin
        .set_order_status(order.id, Some("Processing"))
        .await
        .unwrap();
    assert_eq!(processing.status, "Processing");

    let err = admin
        .create_order(&NewOrder {
            products: vec![LineItem {
                product_id: chair.id,
                quantity: 1,
            }],
            total_price: None,
            payment_method: None,
        })
        .await
        .unwrap_err();
    assert_eq!(
        err.downcast_ref::<ApiError>().unwrap().status,
        reqwest::StatusCode::FORBIDDEN
    );

    let users = admin.list_users().await.unwrap();
    let ivy_id = users
        .iter()
        .find(|u| u.email == "ivy@example.com")
        .unwrap()
        .id;
    admin.delete_user(ivy_id).await.unwrap();
    let orders = admin.all_orders().await.unwrap();
    assert_eq!(orders.len(), 1);
    assert!(orders[0].user.is_none());

    handle.abort();
}
