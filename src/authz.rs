//! Centralized authorization rules.
//!
//! Every ownership/role decision in the API goes through [`is_allowed`] so
//! the moderation policy lives in exactly one place. The rules are not
//! orthogonal: post edits have no admin override while every delete does,
//! admins can never author or edit comments, and replies belong to the post
//! author alone ("author responds to commenters").

use crate::auth::Claims;

/// An action an authenticated caller is attempting, together with the
/// ownership facts the decision needs. Authentication itself has already
/// been established by the token extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateComment,
    EditComment { comment_author: i64 },
    DeleteComment { comment_author: i64 },
    CreateReply { post_author: i64 },
    EditReply { post_author: i64, reply_author: i64 },
    DeleteReply { reply_author: i64 },
    EditPost { post_author: i64 },
    DeletePost { post_author: i64 },
}

/// Decide whether `actor` may perform `action`.
#[must_use]
pub fn is_allowed(actor: &Claims, action: Action) -> bool {
    match action {
        Action::CreateComment => !actor.is_admin,
        Action::EditComment { comment_author } => !actor.is_admin && actor.id == comment_author,
        Action::DeleteComment { comment_author } => actor.id == comment_author || actor.is_admin,
        Action::CreateReply { post_author } => actor.id == post_author,
        Action::EditReply {
            post_author,
            reply_author,
        } => actor.id == post_author && actor.id == reply_author,
        Action::DeleteReply { reply_author } => actor.id == reply_author || actor.is_admin,
        Action::EditPost { post_author } => actor.id == post_author,
        Action::DeletePost { post_author } => actor.id == post_author || actor.is_admin,
    }
}
