pub mod delete;
pub mod get;
pub mod list;
pub mod read;
pub mod send;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::models::auth::entities::AuthUser;
use crate::models::messages::{
    entities::Mailbox,
    requests::{MessageListParams, SendMessageRequest},
};
use crate::models::users::entities::{User, UserRole};
use crate::storage::Storage;

pub struct MessageService {
    storage: Option<Arc<dyn Storage>>,
}

impl MessageService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub async fn send_message(
        &self,
        request: &HttpRequest,
        message: SendMessageRequest,
    ) -> ActixResult<HttpResponse> {
        send::send_message(self, request, message).await
    }

    pub async fn list_messages(
        &self,
        request: &HttpRequest,
        mailbox: Mailbox,
        query: MessageListParams,
    ) -> ActixResult<HttpResponse> {
        list::list_messages(self, request, mailbox, query).await
    }

    pub async fn get_message(&self, request: &HttpRequest, message_id: i64) -> ActixResult<HttpResponse> {
        get::get_message(self, request, message_id).await
    }

    pub async fn mark_read(&self, request: &HttpRequest, message_id: i64) -> ActixResult<HttpResponse> {
        read::mark_read(self, request, message_id).await
    }

    pub async fn delete_message(&self, request: &HttpRequest, message_id: i64) -> ActixResult<HttpResponse> {
        delete::delete_message(self, request, message_id).await
    }
}

/// 发信范围：同校有效用户；总管理员可发给任何人，任何人可发给总管理员
pub(crate) fn can_message(sender: &AuthUser, recipient: &User) -> bool {
    if !recipient.is_active || recipient.id == sender.id {
        return false;
    }
    if sender.is_head_admin() || recipient.role == UserRole::HeadAdmin {
        return true;
    }
    sender.school_id.is_some() && sender.school_id == recipient.school_id
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(role: UserRole, school_id: Option<i64>) -> AuthUser {
        AuthUser {
            id: 1,
            school_id,
            email: "s@gvhs.edu".to_string(),
            full_name: "S".to_string(),
            role,
            subdivision: None,
            class_id: None,
            session_token: "t".to_string(),
        }
    }

    fn recipient(id: i64, role: UserRole, school_id: Option<i64>, is_active: bool) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            school_id,
            email: format!("u{id}@gvhs.edu"),
            password_hash: String::new(),
            full_name: "R".to_string(),
            role,
            is_active,
            login_attempts: 0,
            locked_until: None,
            last_login: None,
            avatar_url: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_can_message() {
        let teacher = sender(UserRole::Teacher, Some(1));
        assert!(can_message(&teacher, &recipient(2, UserRole::Student, Some(1), true)));
        assert!(!can_message(&teacher, &recipient(2, UserRole::Student, Some(2), true)));
        assert!(!can_message(&teacher, &recipient(2, UserRole::Student, Some(1), false)));
        assert!(!can_message(&teacher, &recipient(1, UserRole::Teacher, Some(1), true)));
        assert!(can_message(&teacher, &recipient(3, UserRole::HeadAdmin, None, true)));

        let head = sender(UserRole::HeadAdmin, None);
        assert!(can_message(&head, &recipient(2, UserRole::Admin, Some(9), true)));
    }
}
