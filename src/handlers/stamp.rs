use actix_web::{HttpResponse, ResponseError, Result, web};
use crate::models::*;
use crate::services::{AppRedemptionService, AppStampService};

#[utoipa::path(
    post,
    path = "/stamps/collect",
    tag = "stamps",
    request_body = CollectStampsRequest,
    responses(
        (status = 200, description = "集章成功", body = CollectStampsResponse),
        (status = 400, description = "交易无效或活动已过期"),
        (status = 404, description = "交易或手机号不存在"),
        (status = 409, description = "交易已被使用")
    )
)]
pub async fn collect_stamps(
    stamp_service: web::Data<AppStampService>,
    request: web::Json<CollectStampsRequest>,
) -> Result<HttpResponse> {
    match stamp_service.collect_stamps(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/stamps/redeem",
    tag = "stamps",
    request_body = RedeemRewardRequest,
    responses(
        (status = 200, description = "兑换成功", body = RedeemRewardResponse),
        (status = 400, description = "交易无效、余额不足或活动已过期"),
        (status = 404, description = "交易、手机号或集章卡不存在"),
        (status = 409, description = "交易已被使用或奖励已兑换")
    )
)]
pub async fn redeem_reward(
    redemption_service: web::Data<AppRedemptionService>,
    request: web::Json<RedeemRewardRequest>,
) -> Result<HttpResponse> {
    match redemption_service.redeem_reward(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/stamps/card",
    tag = "stamps",
    params(
        ("customer_stamp_id" = String, Query, description = "集章卡ID")
    ),
    responses(
        (status = 200, description = "集章卡详情", body = StampCardResponse),
        (status = 404, description = "集章卡不存在")
    )
)]
pub async fn get_stamp_card(
    stamp_service: web::Data<AppStampService>,
    query: web::Query<StampCardQuery>,
) -> Result<HttpResponse> {
    match stamp_service.get_stamp_card(&query.customer_stamp_id).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn stamp_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/stamps")
            .route("/collect", web::post().to(collect_stamps))
            .route("/redeem", web::post().to(redeem_reward))
            .route("/card", web::get().to(get_stamp_card)),
    );
}
