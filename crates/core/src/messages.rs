//! User-facing message catalogue.

pub mod error {
    pub const GENERIC: &str = "An unexpected error occurred. Please try again.";
    pub const NETWORK: &str = "Network connection failed. Please check your internet connection.";
    pub const SESSION_EXPIRED: &str = "Your session has expired. Please login again.";
    pub const UNAUTHORIZED: &str = "You do not have permission to access this resource.";
    pub const NOT_FOUND: &str = "The requested resource was not found.";
    pub const SERVER_ERROR: &str = "Server error occurred. Please try again later.";
    pub const VALIDATION: &str = "Please check your input and try again.";
    pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
}

pub mod success {
    pub const LOGIN: &str = "Login successful!";
    pub const LOGOUT: &str = "Logged out successfully.";
}
