pub mod jwt;
pub mod login_tokens;
