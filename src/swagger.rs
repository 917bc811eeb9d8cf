use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::transaction::create_transaction,
        handlers::otp::send_otp,
        handlers::otp::verify_otp,
        handlers::stamp::collect_stamps,
        handlers::stamp::redeem_reward,
        handlers::stamp::get_stamp_card,
    ),
    components(
        schemas(
            Campaign,
            RedemptionRule,
            StampTransaction,
            Customer,
            CustomerStamp,
            Redemption,
            CreateTransactionRequest,
            CreateTransactionResponse,
            SendOtpRequest,
            VerifyOtpRequest,
            OtpMessageResponse,
            CollectStampsRequest,
            CollectStampsResponse,
            StampCardQuery,
            StampCardReward,
            StampCardResponse,
            RedeemRewardRequest,
            RedeemRewardResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "transactions", description = "员工侧交易创建"),
        (name = "otp", description = "顾客手机验证码"),
        (name = "stamps", description = "集章与兑换")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
