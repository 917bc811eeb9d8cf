use actix_web::{HttpResponse, ResponseError, Result, web};
use crate::models::*;
use crate::services::AppTransactionService;

#[utoipa::path(
    post,
    path = "/transactions",
    tag = "transactions",
    request_body = CreateTransactionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "交易创建成功", body = CreateTransactionResponse),
        (status = 400, description = "请求参数错误或活动已过期"),
        (status = 404, description = "活动或兑换规则不存在"),
        (status = 500, description = "服务器内部错误")
    )
)]
pub async fn create_transaction(
    transaction_service: web::Data<AppTransactionService>,
    request: web::Json<CreateTransactionRequest>,
) -> Result<HttpResponse> {
    match transaction_service.create_transaction(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn transaction_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/transactions", web::post().to(create_transaction));
}
