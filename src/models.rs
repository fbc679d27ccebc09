use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::role::Role;

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "juan@example.com")]
    pub email: String,
    #[schema(example = "secret1")]
    pub password: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub role: Role,
    /// Dashboard route for the role
    #[schema(example = "/member")]
    pub dashboard: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub user_id: u64,
    pub member_id: u64,
    /// email
    pub sub: String,
    pub role: Role,
    pub exp: usize,
    pub jti: String,
}
