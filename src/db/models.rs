use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current time as an RFC 3339 string, the format used for every stored
/// timestamp (table columns and aggregate fields alike).
#[must_use]
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339()
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

/// A reply embedded in a comment. Only the post author writes replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Uuid,
    pub user_id: i64,
    pub text: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Reply {
    fn new(user_id: i64, text: String) -> Self {
        let now = now_rfc3339();
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Replace the text in place, keeping id and creation time.
    pub fn edit(&mut self, text: String) {
        self.text = text;
        self.updated_at = now_rfc3339();
    }
}

/// A comment embedded in a post, owning its replies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: i64,
    pub text: String,
    #[serde(default)]
    pub replies: Vec<Reply>,
    pub created_at: String,
    pub updated_at: String,
}

impl Comment {
    fn new(user_id: i64, text: String) -> Self {
        let now = now_rfc3339();
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            replies: Vec::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Replace the text in place, keeping id and creation time.
    pub fn edit(&mut self, text: String) {
        self.text = text;
        self.updated_at = now_rfc3339();
    }

    /// Append a new reply and return a copy of it.
    pub fn add_reply(&mut self, user_id: i64, text: String) -> Reply {
        let reply = Reply::new(user_id, text);
        self.replies.push(reply.clone());
        reply
    }

    #[must_use]
    pub fn reply(&self, id: Uuid) -> Option<&Reply> {
        self.replies.iter().find(|r| r.id == id)
    }

    pub fn reply_mut(&mut self, id: Uuid) -> Option<&mut Reply> {
        self.replies.iter_mut().find(|r| r.id == id)
    }

    /// Remove a reply by id. Returns false if no reply matched.
    pub fn remove_reply(&mut self, id: Uuid) -> bool {
        let before = self.replies.len();
        self.replies.retain(|r| r.id != id);
        self.replies.len() < before
    }
}

/// A post together with its embedded comment/reply tree. Loaded whole,
/// mutated in memory, and persisted back in a single write.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub comments: Vec<Comment>,
    pub created_at: String,
    pub updated_at: String,
}

impl Post {
    /// Refresh the aggregate's update timestamp. Called once per mutation,
    /// before the aggregate is written back.
    pub fn touch(&mut self) {
        self.updated_at = now_rfc3339();
    }

    /// Append a new comment and return a copy of it.
    pub fn add_comment(&mut self, user_id: i64, text: String) -> Comment {
        let comment = Comment::new(user_id, text);
        self.comments.push(comment.clone());
        comment
    }

    #[must_use]
    pub fn comment(&self, id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == id)
    }

    pub fn comment_mut(&mut self, id: Uuid) -> Option<&mut Comment> {
        self.comments.iter_mut().find(|c| c.id == id)
    }

    /// Remove a comment (and its replies) by id. Returns false if no
    /// comment matched.
    pub fn remove_comment(&mut self, id: Uuid) -> bool {
        let before = self.comments.len();
        self.comments.retain(|c| c.id != id);
        self.comments.len() < before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_comment() {
        let mut post = Post {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: 1,
            comments: Vec::new(),
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };

        let first = post.add_comment(2, "first".to_string()).id;
        let second = post.add_comment(3, "second".to_string()).id;
        assert_eq!(post.comments.len(), 2);

        assert!(post.remove_comment(first));
        assert_eq!(post.comments.len(), 1);
        assert!(post.comment(first).is_none());
        // Sibling untouched
        assert_eq!(post.comment(second).map(|c| c.user_id), Some(3));

        // Removing again is a no-op
        assert!(!post.remove_comment(first));
    }

    #[test]
    fn test_edit_preserves_id_and_created_at() {
        let mut comment = Comment::new(7, "before".to_string());
        let id = comment.id;
        let created = comment.created_at.clone();

        comment.edit("after".to_string());
        assert_eq!(comment.id, id);
        assert_eq!(comment.created_at, created);
        assert_eq!(comment.text, "after");
    }

    #[test]
    fn test_removing_comment_drops_replies() {
        let mut post = Post {
            id: 1,
            title: "t".to_string(),
            content: "c".to_string(),
            author_id: 1,
            comments: Vec::new(),
            created_at: now_rfc3339(),
            updated_at: now_rfc3339(),
        };
        let comment_id = post.add_comment(2, "hello".to_string()).id;
        let reply_id = post
            .comment_mut(comment_id)
            .map(|c| c.add_reply(1, "hi back".to_string()).id)
            .unwrap();

        assert!(post.comment(comment_id).and_then(|c| c.reply(reply_id)).is_some());
        assert!(post.remove_comment(comment_id));
        assert!(post.comment(comment_id).is_none());
    }

    #[test]
    fn test_comment_json_round_trip() {
        let mut comment = Comment::new(5, "text".to_string());
        comment.add_reply(1, "reply".to_string());

        let json = serde_json::to_string(&vec![comment.clone()]).unwrap();
        let parsed: Vec<Comment> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, comment.id);
        assert_eq!(parsed[0].replies.len(), 1);
    }
}
