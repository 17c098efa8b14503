//! Authenticated identity attached to the request after verification.

/// The verified identity handed to protected handlers. Handlers take
/// everything from here and never re-parse cookies themselves.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Subject identifier from the verified token
    pub iin: String,
    /// Username
    pub username: String,
    /// Account creation marker, for display only
    pub created_at: String,
    /// Elevated-role flag
    pub admin: bool,
    /// The raw verified access token, forwarded to the wallet service
    /// as the bearer credential
    pub access_token: String,
}
