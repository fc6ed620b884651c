/// Identifier of an authenticated user, as issued by the external identity provider
pub type UserId = i32;

/// The already authenticated actor of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Principal {
    user_id: UserId,
    is_admin: bool,
}

impl Principal {
    pub fn new(user_id: UserId, is_admin: bool) -> Self {
        Principal { user_id, is_admin }
    }

    pub fn user(user_id: UserId) -> Self {
        Principal::new(user_id, false)
    }

    pub fn admin(user_id: UserId) -> Self {
        Principal::new(user_id, true)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn is_admin(&self) -> bool {
        self.is_admin
    }
}
