//! Signed-in user profile (/auth/profile/)

use super::client::ApiClient;
use super::error::ApiError;
use crate::models::Profile;

pub const PROFILE_PATH: &str = "/auth/profile/";

pub async fn fetch_profile(client: &ApiClient) -> Result<Profile, ApiError> {
    client.get(PROFILE_PATH).await
}
