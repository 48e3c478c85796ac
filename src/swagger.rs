use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::default::default_route_handler,
        crate::handlers::ping::ping_handler,
        crate::handlers::otp::send::send_otp_handler,
        crate::handlers::otp::verify::verify_otp_handler,
    ),
    components(
        schemas(
            crate::models::SendOtpReq,
            crate::models::VerifyOtpReq,
            crate::models::OtpPurpose,

            crate::models::GenericResponse,
            crate::models::OtpErrorResponse,
        )
    ),
    tags(
        (name = "Health API", description = "API to check if the server is up"),
        (name = "OTP API", description = "API to send and verify email otp")
    )
)]
pub struct ApiDoc;
