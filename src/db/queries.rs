use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{now_rfc3339, Comment, Post, User};

// ========== Users ==========

/// Create a non-admin user, returning the new id.
pub async fn create_user(
    pool: &SqlitePool,
    email: &str,
    username: &str,
    password_hash: &str,
) -> Result<i64> {
    let result = sqlx::query(
        r"
        INSERT INTO users (email, username, password_hash, is_admin)
        VALUES (?, ?, ?, 0)
        ",
    )
    .bind(email)
    .bind(username)
    .bind(password_hash)
    .execute(pool)
    .await
    .context("Failed to create user")?;

    Ok(result.last_insert_rowid())
}

/// Get a user by id.
pub async fn get_user_by_id(pool: &SqlitePool, id: i64) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by id")
}

/// Get a user by email.
pub async fn get_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch user by email")
}

/// Check if an email is already registered.
pub async fn email_exists(pool: &SqlitePool, email: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = ?")
        .bind(email)
        .fetch_one(pool)
        .await
        .context("Failed to check email existence")?;
    Ok(row.0 > 0)
}

/// Check if a username is already taken.
pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE username = ?")
        .bind(username)
        .fetch_one(pool)
        .await
        .context("Failed to check username existence")?;
    Ok(row.0 > 0)
}

/// Fetch the users matching a set of ids. Used to resolve author references
/// when shaping post detail responses.
pub async fn get_users_by_ids(pool: &SqlitePool, ids: &[i64]) -> Result<Vec<User>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: sqlx::QueryBuilder<sqlx::Sqlite> =
        sqlx::QueryBuilder::new("SELECT * FROM users WHERE id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    builder
        .build_query_as::<User>()
        .fetch_all(pool)
        .await
        .context("Failed to fetch users by ids")
}

// ========== Posts ==========

/// Raw row shape for the posts table; `comments` holds the serialized tree.
#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    title: String,
    content: String,
    author_id: i64,
    comments: String,
    created_at: String,
    updated_at: String,
}

impl PostRow {
    fn into_post(self) -> Result<Post> {
        let comments: Vec<Comment> = serde_json::from_str(&self.comments)
            .context("Failed to parse comments for post")?;
        Ok(Post {
            id: self.id,
            title: self.title,
            content: self.content,
            author_id: self.author_id,
            comments,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Insert a new post with no comments, returning the full aggregate.
pub async fn insert_post(
    pool: &SqlitePool,
    title: &str,
    content: &str,
    author_id: i64,
) -> Result<Post> {
    let now = now_rfc3339();
    let result = sqlx::query(
        r"
        INSERT INTO posts (title, content, author_id, comments, created_at, updated_at)
        VALUES (?, ?, ?, '[]', ?, ?)
        ",
    )
    .bind(title)
    .bind(content)
    .bind(author_id)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .context("Failed to create post")?;

    Ok(Post {
        id: result.last_insert_rowid(),
        title: title.to_string(),
        content: content.to_string(),
        author_id,
        comments: Vec::new(),
        created_at: now.clone(),
        updated_at: now,
    })
}

/// Load a post aggregate by id.
pub async fn get_post(pool: &SqlitePool, id: i64) -> Result<Option<Post>> {
    let row: Option<PostRow> = sqlx::query_as("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch post")?;

    row.map(PostRow::into_post).transpose()
}

/// All posts, newest first.
pub async fn list_posts(pool: &SqlitePool) -> Result<Vec<Post>> {
    let rows: Vec<PostRow> =
        sqlx::query_as("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
            .fetch_all(pool)
            .await
            .context("Failed to list posts")?;

    rows.into_iter().map(PostRow::into_post).collect()
}

/// One author's posts, newest first.
pub async fn list_posts_by_author(pool: &SqlitePool, author_id: i64) -> Result<Vec<Post>> {
    let rows: Vec<PostRow> = sqlx::query_as(
        "SELECT * FROM posts WHERE author_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(author_id)
    .fetch_all(pool)
    .await
    .context("Failed to list posts by author")?;

    rows.into_iter().map(PostRow::into_post).collect()
}

/// Persist a mutated aggregate in a single write: title, content, and the
/// whole comment tree go back together (last write wins on races).
pub async fn save_post(pool: &SqlitePool, post: &Post) -> Result<()> {
    let comments =
        serde_json::to_string(&post.comments).context("Failed to serialize comments")?;

    sqlx::query(
        r"
        UPDATE posts
        SET title = ?, content = ?, comments = ?, updated_at = ?
        WHERE id = ?
        ",
    )
    .bind(&post.title)
    .bind(&post.content)
    .bind(&comments)
    .bind(&post.updated_at)
    .bind(post.id)
    .execute(pool)
    .await
    .context("Failed to save post")?;

    Ok(())
}

/// Delete a post and, implicitly, every embedded comment and reply.
pub async fn delete_post(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete post")?;
    Ok(())
}
