//! Route paths.

pub const GET_PING: &str = "/ping";

pub const POST_USER: &str = "/v1/user";
pub const POST_USER_CONNECT: &str = "/v1/user/connect";
pub const POST_USER_LOGIN: &str = "/v1/user/login";
pub const POST_REFRESH_TOKEN: &str = "/v1/refresh/token";

pub const USER_ID: &str = "/v1/user/{id}";
pub const PUT_USER_ID_LOGOUT: &str = "/v1/user/{id}/logout";
pub const PUT_USER_ID_PASSWORD: &str = "/v1/user/{id}/password";
pub const PUT_USER_ID_ARCHIVE: &str = "/v1/user/{id}/archive";
pub const GET_USERS: &str = "/v1/users";
