//! Typed endpoint calls built on [`ApiClient::call`].

use super::client::{ApiClient, ApiRequest};
use super::envelope::Envelope;
use super::models::{AppConfigs, LoginData};
use crate::error::ApiError;
use crate::utils::error_helpers::convert_json_error;
use serde_json::{Value, json};

pub const PRODUCTS_PATH: &str = "/product";
pub const CATEGORIES_PATH: &str = "/category";
pub const ORDERS_PATH: &str = "/order";
pub const APP_CONFIG_PATH: &str = "/app-config";

impl ApiClient {
    /// GET a resource collection with filter query pairs.
    pub async fn list_resource(
        &self,
        path: &str,
        query: Vec<(String, String)>,
    ) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::get(path).query_pairs(query)).await
    }

    pub async fn get_resource(&self, path: &str, id: &str) -> Result<Value, ApiError> {
        let envelope = self
            .call(ApiRequest::get(format!("{}/{}", path, id)))
            .await?;
        Ok(envelope.data)
    }

    pub async fn create_resource(&self, path: &str, payload: Value) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::post(path).json(payload)).await
    }

    pub async fn update_resource(
        &self,
        path: &str,
        id: &str,
        payload: Value,
    ) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::put(format!("{}/{}", path, id)).json(payload))
            .await
    }

    pub async fn delete_resource(&self, path: &str, id: &str) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::delete(format!("{}/{}", path, id)))
            .await
    }

    /// Orders placed with a contact e-mail. `data` is either the array itself
    /// or an object holding it under `orders`.
    pub async fn orders_by_contact(&self, email: &str) -> Result<Vec<Value>, ApiError> {
        let endpoint = format!("{}/contact", ORDERS_PATH);
        let envelope = self
            .call(ApiRequest::get(endpoint.as_str()).query("email", email))
            .await?;
        let orders = match envelope.data {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("orders") {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            _ => Vec::new(),
        };
        Ok(orders)
    }

    pub async fn get_app_configs(&self) -> Result<AppConfigs, ApiError> {
        let envelope = self.call(ApiRequest::get(APP_CONFIG_PATH)).await?;
        serde_json::from_value(envelope.data).map_err(|e| convert_json_error(e, APP_CONFIG_PATH))
    }

    pub async fn update_app_configs(&self, configs: &AppConfigs) -> Result<Envelope, ApiError> {
        let body = serde_json::to_value(configs).map_err(|e| convert_json_error(e, APP_CONFIG_PATH))?;
        self.call(ApiRequest::put(APP_CONFIG_PATH).json(body)).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginData, ApiError> {
        const ENDPOINT: &str = "/auth/login";
        let envelope = self
            .call(ApiRequest::post(ENDPOINT).json(json!({"email": email, "password": password})))
            .await?;
        serde_json::from_value(envelope.data).map_err(|e| convert_json_error(e, ENDPOINT))
    }

    pub async fn logout(&self) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::post("/auth/logout")).await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::post("/auth/forgot-password").json(json!({"email": email})))
            .await
    }

    /// Returns the reset token issued for a valid OTP.
    pub async fn verify_otp(&self, email: &str, otp: &str) -> Result<String, ApiError> {
        const ENDPOINT: &str = "/auth/verify-otp";
        let envelope = self
            .call(ApiRequest::post(ENDPOINT).json(json!({"email": email, "otp": otp})))
            .await?;
        envelope
            .data
            .get("token")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Decode {
                endpoint: ENDPOINT.to_string(),
                message: "response is missing data.token".to_string(),
            })
    }

    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Envelope, ApiError> {
        self.call(
            ApiRequest::post("/auth/reset-password")
                .json(json!({"token": token, "newPassword": new_password})),
        )
        .await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Envelope, ApiError> {
        self.call(ApiRequest::post("/auth/change-password").json(json!({
            "currentPassword": current_password,
            "newPassword": new_password
        })))
        .await
    }
}
