use oas_registry::api_dto;

/// Payload for creating a user.
#[api_dto]
pub struct CreateUser {
    pub email: String,
    pub display_name: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[api_dto]
pub struct UpdateUser {
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[api_dto]
pub struct User {
    pub user_id: i64,
    pub email: String,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
}

#[api_dto]
pub struct Order {
    pub order_id: String,
    pub user_id: i64,
    pub items: Vec<OrderItem>,
    pub total_cents: i64,
}

#[api_dto]
pub struct OrderItem {
    pub sku: String,
    pub quantity: u32,
}

/// Error body shared by every endpoint.
#[api_dto(rename_all = "snake_case")]
pub struct ApiError {
    pub error_code: String,
    pub message: String,
}
