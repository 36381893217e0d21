use actix_web::{web, HttpResponse};

use crate::domain::product::{NewProduct, ProductId, ProductQuery, ProductUpdate};

use super::{ApiError, ApiResponse, AppState};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/products")
            .route("", web::post().to(create_product))
            .route("", web::get().to(list_products))
            .route("/{id}", web::get().to(get_product))
            .route("/{id}", web::put().to(update_product))
            .route("/{id}", web::delete().to(delete_product)),
    );
}

async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<NewProduct>,
) -> Result<HttpResponse, ApiError> {
    let product = state.products.create(body.into_inner()).await?;
    Ok(ApiResponse::created(product, "Product created successfully"))
}

async fn list_products(
    state: web::Data<AppState>,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ApiError> {
    let products = state.products.find_all(&query).await?;
    Ok(ApiResponse::ok(products))
}

async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<ProductId>,
) -> Result<HttpResponse, ApiError> {
    let product = state.products.find_by_id(id.into_inner()).await?;
    Ok(ApiResponse::ok(product))
}

async fn update_product(
    state: web::Data<AppState>,
    id: web::Path<ProductId>,
    body: web::Json<ProductUpdate>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .products
        .update(id.into_inner(), body.into_inner())
        .await?;
    Ok(ApiResponse::with_message(product, "Product updated successfully"))
}

async fn delete_product(
    state: web::Data<AppState>,
    id: web::Path<ProductId>,
) -> Result<HttpResponse, ApiError> {
    state.products.delete(id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::empty("Product deleted successfully")))
}

#[cfg(test)]
mod tests {
    use crate::api::configure;
    use crate::api::tests::state;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_product_crud() {
        let (state, _) = state();
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/products")
            .set_json(json!({
                "name": "Jak wood bowl",
                "qty": 4,
                "price": "45.50",
                "category": "WOOD"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        assert_eq!(created["message"], "Product created successfully");
        let id = created["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::put()
            .uri(&format!("/products/{id}"))
            .set_json(json!({
                "name": "Jak wood bowl",
                "qty": 9,
                "price": "40",
                "category": "WOOD"
            }))
            .to_request();
        let updated: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(updated["data"]["qty"], json!(9));

        let req = test::TestRequest::get().uri("/products?category=WOOD&name=bowl").to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete().uri(&format!("/products/{id}")).to_request();
        let deleted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(deleted["message"], "Product deleted successfully");

        let req = test::TestRequest::get().uri(&format!("/products/{id}")).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Product not found");
    }

    #[actix_web::test]
    async fn test_invalid_product_is_bad_request() {
        let (state, _) = state();
        let app = test::init_service(App::new().configure(configure(state))).await;

        let req = test::TestRequest::post()
            .uri("/products")
            .set_json(json!({ "name": "Mat", "qty": -1, "price": "5", "category": "TEXTILES" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/products")
            .set_json(json!({ "name": "Vase", "qty": 1, "price": "5", "category": "GLASS" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_malformed_product_id_is_bad_request() {
        let (state, _) = state();
        let app = test::init_service(App::new().configure(configure(state))).await;

        for req in [
            test::TestRequest::get().uri("/products/42").to_request(),
            test::TestRequest::delete().uri("/products/42").to_request(),
        ] {
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            let body: Value = test::read_body_json(resp).await;
            assert_eq!(body["data"], Value::Null);
            assert!(!body["message"].as_str().unwrap().is_empty());
        }
    }
}
