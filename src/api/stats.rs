use actix_web::{web, HttpResponse};

use super::{ApiError, ApiResponse, AppState};

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/stats", web::get().to(analytics));
}

async fn analytics(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let analytics = state.stats.analytics().await?;
    Ok(ApiResponse::ok(analytics))
}
