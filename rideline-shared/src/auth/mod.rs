/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
///
/// Login itself is a route concern; this module only owns the hashing
/// primitive, so passwords are never persisted or compared in plaintext.

pub mod password;
