mod log_in;
mod middleware;
mod password;
mod sign_up;
mod token;

pub use log_in::{LogInData, TokenResponse, post_log_in};
pub use middleware::{AuthState, auth_guard};
pub use password::PasswordHash;
pub use sign_up::{SignUpRequest, UserResponse, post_sign_up};
pub use token::{DEFAULT_TOKEN_DURATION, TokenKeys};
