use serde::{Deserialize, Serialize};

#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct UserRequest {
    pub user: String,
}

#[derive(Serialize, Debug)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Serialize, Debug)]
pub struct WhitelistResponse {
    pub success: bool,
    pub whitelist: Vec<String>,
}
