use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use super::handlers::{health, me, user_login, user_register};
use crate::types::{AuthResponse, ErrorResponse, LoginRequest, RegisterRequest, TokenType, UserSnapshot};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        user_register::register,
        user_login::login,
        me::get_me,
    ),
    components(schemas(
        AuthResponse,
        ErrorResponse,
        LoginRequest,
        RegisterRequest,
        TokenType,
        UserSnapshot,
        health::Health,
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "Registration, login and the current user"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[must_use]
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}
