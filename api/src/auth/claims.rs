use db::models::user::Role;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
