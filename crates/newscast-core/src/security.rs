use crate::domain::UserId;

// ============== Authorization ==============

/// Whether `user_id` may trigger broadcasts.
pub fn is_authorized(user_id: Option<UserId>, admin_ids: &[i64]) -> bool {
    let Some(user_id) = user_id else {
        return false;
    };
    if admin_ids.is_empty() {
        return false;
    }
    admin_ids.contains(&user_id.0)
}
