//! Route paths.

pub const GET_HEALTH: &str = "/health";
pub const POST_AUTH_SIGNUP: &str = "/api/auth/signup";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_CHECK_EMAIL: &str = "/api/auth/check-email";
pub const POST_AUTH_LOGOUT: &str = "/api/auth/logout";
pub const GET_PROFILE: &str = "/api/profile";
