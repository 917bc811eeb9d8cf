use actix_web::{HttpResponse, ResponseError, Result, web};
use crate::models::*;
use crate::services::AppOtpService;

#[utoipa::path(
    post,
    path = "/otp/send",
    tag = "otp",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "验证码发送成功", body = OtpMessageResponse),
        (status = 404, description = "手机号未登记"),
        (status = 429, description = "重发过于频繁"),
        (status = 500, description = "短信网关错误")
    )
)]
pub async fn send_otp(
    otp_service: web::Data<AppOtpService>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse> {
    match otp_service.send_otp(&request.phone_number).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/otp/verify",
    tag = "otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 200, description = "验证成功", body = OtpMessageResponse),
        (status = 400, description = "验证码错误或已过期"),
        (status = 404, description = "手机号未登记或无验证码")
    )
)]
pub async fn verify_otp(
    otp_service: web::Data<AppOtpService>,
    request: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    match otp_service
        .verify_otp(&request.phone_number, &request.otp_code)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn otp_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/otp")
            .route("/send", web::post().to(send_otp))
            .route("/verify", web::post().to(verify_otp)),
    );
}
