//! Authentication core: user store, password hashing, token issuance and the
//! register/login workflows built on top of them.
//! - Independent of any web framework.
//! - Collaborators are traits so storage and signing can be swapped.

pub mod auth;
#[cfg(test)]
pub mod test_support;
