//! Edit rights over books.

use crate::auth::Claims;
use crate::models::book;

/// A user may edit a book if they are staff or they uploaded it.
/// Checked before every mutating operation on the owner dashboard; a false
/// result must become a 403, never a redirect or a silent no-op.
pub fn can_edit(claims: &Claims, book: &book::Model) -> bool {
    claims.is_staff() || book.uploaded_by == claims.uid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user;

    fn claims(uid: i32, role: &str) -> Claims {
        Claims {
            sub: format!("u{}", uid),
            uid,
            role: role.to_string(),
            exp: 0,
        }
    }

    fn book_of(uploader: i32) -> book::Model {
        book::Model {
            id: 1,
            title: "t".into(),
            slug: "t".into(),
            author_name: None,
            description: None,
            cover_path: None,
            pdf_path: None,
            content: None,
            category_id: None,
            is_published: true,
            uploaded_by: uploader,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn owner_may_edit() {
        assert!(can_edit(&claims(3, user::ROLE_USER), &book_of(3)));
    }

    #[test]
    fn staff_may_edit_anything() {
        assert!(can_edit(&claims(99, user::ROLE_STAFF), &book_of(3)));
    }

    #[test]
    fn other_users_may_not() {
        assert!(!can_edit(&claims(4, user::ROLE_USER), &book_of(3)));
    }
}
