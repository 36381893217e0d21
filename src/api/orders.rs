use actix_web::{web, HttpResponse};

use crate::domain::order::{OrderId, OrderQuery, PlaceOrder, UpdateOrderStatus};

use super::{ApiError, ApiResponse, AppState};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(place_order))
            .route("", web::get().to(list_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}", web::patch().to(update_status))
            .route("/{id}", web::delete().to(delete_order)),
    );
}

async fn place_order(
    state: web::Data<AppState>,
    body: web::Json<PlaceOrder>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.create(body.into_inner()).await?;
    Ok(ApiResponse::created(
        order,
        "Your order has been placed successfully. Thank you for choosing our service",
    ))
}

async fn list_orders(
    state: web::Data<AppState>,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse, ApiError> {
    let orders = state.orders.find_all(&query).await?;
    Ok(ApiResponse::ok(orders))
}

async fn get_order(
    state: web::Data<AppState>,
    id: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    let order = state.orders.find_by_id(id.into_inner()).await?;
    Ok(ApiResponse::ok(order))
}

async fn update_status(
    state: web::Data<AppState>,
    id: web::Path<OrderId>,
    body: web::Json<UpdateOrderStatus>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .orders
        .update_status(id.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::with_message(order, "Order status updated successfully"))
}

async fn delete_order(
    state: web::Data<AppState>,
    id: web::Path<OrderId>,
) -> Result<HttpResponse, ApiError> {
    state.orders.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::empty("Order deleted successfully")))
}

#[cfg(test)]
mod tests {
    use crate::api::configure;
    use crate::api::tests::state;
    use crate::domain::product::{Product, ProductCategory, ProductId};
    use crate::storage::{ProductRepository, Stores};
    use actix_web::{http::StatusCode, test, App};
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};

    async fn seed(stores: &Stores, qty: i32) -> ProductId {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(),
            name: "Batik scarf".to_string(),
            description: None,
            qty,
            price: dec!(1000),
            category: ProductCategory::Textiles,
            image: None,
            created_at: now,
            updated_at: now,
        };
        stores.products.insert(&product).await.unwrap();
        product.id
    }

    fn checkout(product: ProductId, qty: i32) -> Value {
        json!({
            "items": [{ "product": product, "qty": qty }],
            "customerName": "Random user",
            "phoneNumber": "+94701234567",
            "email": "randomuser@example.com",
            "billingAddress": {
                "street": "Random street",
                "city": "Random city",
                "state": "Random state",
                "postalCode": "12345"
            }
        })
    }

    #[actix_web::test]
    async fn test_place_order_returns_envelope() {
        let (state, stores) = state();
        let product = seed(&stores, 5).await;
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(checkout(product, 3))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body["message"],
            "Your order has been placed successfully. Thank you for choosing our service"
        );
        assert_eq!(body["data"]["orderNumber"], "0001");
        assert_eq!(body["data"]["status"], "PENDING");
        assert_eq!(body["data"]["amount"], "3000");

        let stock = stores.products.find_by_id(product).await.unwrap().unwrap();
        assert_eq!(stock.qty, 2);
    }

    #[actix_web::test]
    async fn test_place_order_without_stock_is_unprocessable() {
        let (state, stores) = state();
        let product = seed(&stores, 2).await;
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(checkout(product, 3))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], Value::Null);
        assert_eq!(
            body["message"],
            "One or more items in your order are invalid or unavailable."
        );
    }

    #[actix_web::test]
    async fn test_malformed_payload_is_bad_request() {
        let (state, _) = state();
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(json!({ "items": "not a list" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"], Value::Null);
    }

    #[actix_web::test]
    async fn test_cancel_then_delete() {
        let (state, stores) = state();
        let product = seed(&stores, 5).await;
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/orders")
            .set_json(checkout(product, 3))
            .to_request();
        let placed: Value = test::call_and_read_body_json(&app, req).await;
        let id = placed["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{id}"))
            .set_json(json!({ "status": "CANCELLED" }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["message"], "Order status updated successfully");
        assert_eq!(updated["data"]["status"], "CANCELLED");
        assert_eq!(stores.products.find_by_id(product).await.unwrap().unwrap().qty, 5);

        let req = test::TestRequest::patch()
            .uri(&format!("/orders/{id}"))
            .set_json(json!({ "status": "PROCESSING" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let req = test::TestRequest::delete().uri(&format!("/orders/{id}")).to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted["message"], "Order deleted successfully");
        assert_eq!(deleted["data"], Value::Null);

        let req = test::TestRequest::get().uri(&format!("/orders/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_list_orders_with_filters() {
        let (state, stores) = state();
        let product = seed(&stores, 10).await;
        let app = test::init_service(App::new().configure(configure(state))).await;

        for qty in [1, 2] {
            let req = test::TestRequest::post()
                .uri("/orders")
                .set_json(checkout(product, qty))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/orders?orderBy=amount&order=asc&status=PENDING")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let amounts: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|o| o["amount"].as_str().unwrap())
            .collect();
        assert_eq!(amounts, vec!["1000", "2000"]);

        let req = test::TestRequest::get().uri("/orders?status=SHIPPED").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_order_id_is_bad_request() {
        let (state, _) = state();
        let app = test::init_service(App::new().configure(configure(state))).await;

        for req in [
            test::TestRequest::get().uri("/orders/not-a-uuid").to_request(),
            test::TestRequest::delete().uri("/orders/not-a-uuid").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"], Value::Null);
            assert!(!body["message"].as_str().unwrap().is_empty());
        }
    }
}
