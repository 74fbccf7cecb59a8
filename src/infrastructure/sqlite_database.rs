use async_trait::async_trait;
use chrono::Utc;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow},
    QueryBuilder, Row,
};
use std::str::FromStr;

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use crate::infrastructure::database::{BlogStore, PageWindow};
use crate::models::{
    group::NewGroup, post::PostFields, Comment, CommentId, Follow, Group, GroupId, Post, PostId,
    User, UserId,
};

const POST_SELECT: &str = "SELECT p.id, p.author_id, u.username AS author, p.text, p.pub_date, \
     p.image, p.group_id FROM posts p JOIN users u ON u.id = p.author_id";

const COMMENT_SELECT: &str = "SELECT c.id, c.author_id, u.username AS author, c.post_id, c.text, \
     c.created FROM comments c JOIN users u ON u.id = c.author_id";

const FOLLOW_SELECT: &str = "SELECT f.id, f.user_id, u.username AS user, f.following_id, \
     t.username AS following, f.created FROM follows f \
     JOIN users u ON u.id = f.user_id JOIN users t ON t.id = f.following_id";

/// SQLite implementation of the blog store
pub struct SqliteDatabase {
    pool: SqlitePool,
}

impl SqliteDatabase {
    /// Open (or create) the database named by `config.url` and ensure the
    /// schema exists.
    pub async fn connect(config: &DatabaseConfig) -> AppResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| {
                AppError::ConfigurationError(format!("Invalid database url {}: {}", config.url, e))
            })?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = config.url.contains(":memory:");
        let pool_options = if in_memory {
            // Every connection to `:memory:` would see its own database.
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            let filename = options.clone().get_filename();
            if let Some(parent) = filename.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        AppError::ConfigurationError(format!(
                            "Failed to create database directory {}: {}",
                            parent.display(),
                            e
                        ))
                    })?;
                }
            }
            SqlitePoolOptions::new().max_connections(config.max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", config.url, e))
        })?;

        let db = Self { pool };
        db.initialize().await?;
        tracing::info!(url = %config.url, "Database ready");
        Ok(db)
    }

    pub async fn new_in_memory() -> AppResult<Self> {
        Self::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
        })
        .await
    }

    /// Create blog tables if they do not exist yet
    pub async fn initialize(&self) -> AppResult<()> {
        let statements = [
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                created TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS post_groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                slug TEXT NOT NULL UNIQUE,
                description TEXT
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                pub_date TEXT NOT NULL,
                image TEXT,
                group_id INTEGER REFERENCES post_groups(id) ON DELETE SET NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                text TEXT NOT NULL,
                created TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                following_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                created TEXT NOT NULL,
                UNIQUE (user_id, following_id)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS idx_posts_group ON posts(group_id)",
            "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",
            "CREATE INDEX IF NOT EXISTS idx_comments_created ON comments(created)",
            "CREATE INDEX IF NOT EXISTS idx_follows_created ON follows(user_id, created DESC)",
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to initialize schema: {}", e)))?;
        }
        Ok(())
    }

    async fn fetch_follow(&self, id: i64) -> AppResult<Option<Follow>> {
        let row = sqlx::query(&format!("{} WHERE f.id = ?", FOLLOW_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get follow {}: {}", id, e)))?;
        row.map(|row| follow_from_row(&row)).transpose().map_err(decode_err)
    }
}

fn user_from_row(row: &SqliteRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        created: row.try_get("created")?,
    })
}

fn group_from_row(row: &SqliteRow) -> Result<Group, sqlx::Error> {
    Ok(Group {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        slug: row.try_get("slug")?,
        description: row.try_get("description")?,
    })
}

fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    Ok(Post {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        author: row.try_get("author")?,
        text: row.try_get("text")?,
        pub_date: row.try_get("pub_date")?,
        image: row.try_get("image")?,
        group: row.try_get("group_id")?,
    })
}

fn comment_from_row(row: &SqliteRow) -> Result<Comment, sqlx::Error> {
    Ok(Comment {
        id: row.try_get("id")?,
        author_id: row.try_get("author_id")?,
        author: row.try_get("author")?,
        post: row.try_get("post_id")?,
        text: row.try_get("text")?,
        created: row.try_get("created")?,
    })
}

fn follow_from_row(row: &SqliteRow) -> Result<Follow, sqlx::Error> {
    Ok(Follow {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        user: row.try_get("user")?,
        following_id: row.try_get("following_id")?,
        following: row.try_get("following")?,
        created: row.try_get("created")?,
    })
}

fn decode_err(e: sqlx::Error) -> AppError {
    AppError::DatabaseError(format!("Failed to decode row: {}", e))
}

/// Constraint violations are caller mistakes; anything else is ours.
fn write_err(what: &str, e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::Validation(format!("{} already exists.", what));
        }
        if db_err.is_foreign_key_violation() {
            return AppError::Validation(format!("{} references a missing record.", what));
        }
    }
    AppError::DatabaseError(format!("Failed to write {}: {}", what, e))
}

/// Unicode-aware substring match; SQLite's LOWER() only folds ASCII.
fn matches_search(username: &str, needle: &str) -> bool {
    username.to_lowercase().contains(needle)
}

#[async_trait]
impl BlogStore for SqliteDatabase {
    async fn create_user(&self, username: &str) -> AppResult<User> {
        if username.trim().is_empty() {
            return Err(AppError::Validation("username: This field may not be blank.".to_string()));
        }
        let result = sqlx::query("INSERT INTO users (username, created) VALUES (?, ?)")
            .bind(username)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(|e| write_err("A user with that username", e))?;

        let id = result.last_insert_rowid();
        self.get_user(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("User {} vanished after insert", id)))
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get user {}: {}", id, e)))?;
        row.map(|row| user_from_row(&row)).transpose().map_err(decode_err)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, created FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to get user {}: {}", username, e))
            })?;
        row.map(|row| user_from_row(&row)).transpose().map_err(decode_err)
    }

    async fn create_group(&self, group: NewGroup) -> AppResult<Group> {
        group.validate()?;
        let result =
            sqlx::query("INSERT INTO post_groups (title, slug, description) VALUES (?, ?, ?)")
                .bind(&group.title)
                .bind(&group.slug)
                .bind(&group.description)
                .execute(&self.pool)
                .await
                .map_err(|e| write_err("slug: A group with this slug", e))?;

        let id = result.last_insert_rowid();
        self.get_group(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Group {} vanished after insert", id)))
    }

    async fn get_group(&self, id: GroupId) -> AppResult<Option<Group>> {
        let row = sqlx::query("SELECT id, title, slug, description FROM post_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get group {}: {}", id, e)))?;
        row.map(|row| group_from_row(&row)).transpose().map_err(decode_err)
    }

    async fn list_groups(&self) -> AppResult<Vec<Group>> {
        let rows = sqlx::query("SELECT id, title, slug, description FROM post_groups ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list groups: {}", e)))?;
        rows.iter()
            .map(group_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err)
    }

    async fn delete_group(&self, id: GroupId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM post_groups WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete group {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_post(&self, author: UserId, fields: PostFields) -> AppResult<Post> {
        let result = sqlx::query(
            "INSERT INTO posts (author_id, text, pub_date, image, group_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(author)
        .bind(&fields.text)
        .bind(Utc::now())
        .bind(&fields.image)
        .bind(fields.group)
        .execute(&self.pool)
        .await
        .map_err(|e| write_err("post", e))?;

        let id = result.last_insert_rowid();
        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Post {} vanished after insert", id)))
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        let row = sqlx::query(&format!("{} WHERE p.id = ?", POST_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get post {}: {}", id, e)))?;
        row.map(|row| post_from_row(&row)).transpose().map_err(decode_err)
    }

    async fn list_posts(&self, window: Option<PageWindow>) -> AppResult<Vec<Post>> {
        let mut qb = QueryBuilder::<Sqlite>::new(POST_SELECT);
        qb.push(" ORDER BY p.id");
        if let Some(window) = window {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(window.limit));
            qb.push(" OFFSET ");
            qb.push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));
        }

        let rows = qb
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to list posts: {}", e)))?;
        rows.iter()
            .map(post_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err)
    }

    async fn count_posts(&self) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to count posts: {}", e)))?;
        Ok(count.max(0) as u64)
    }

    async fn update_post(&self, id: PostId, fields: PostFields) -> AppResult<Option<Post>> {
        let result =
            sqlx::query("UPDATE posts SET text = ?, image = ?, group_id = ? WHERE id = ?")
                .bind(&fields.text)
                .bind(&fields.image)
                .bind(fields.group)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| write_err("post", e))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_post(id).await
    }

    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete post {}: {}", id, e)))?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_comment(&self, author: UserId, post: PostId, text: &str) -> AppResult<Comment> {
        let result = sqlx::query(
            "INSERT INTO comments (author_id, post_id, text, created) VALUES (?, ?, ?, ?)",
        )
        .bind(author)
        .bind(post)
        .bind(text)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| write_err("comment", e))?;

        let id = result.last_insert_rowid();
        self.get_comment(post, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Comment {} vanished after insert", id)))
    }

    async fn get_comment(&self, post: PostId, id: CommentId) -> AppResult<Option<Comment>> {
        let row = sqlx::query(&format!("{} WHERE c.post_id = ? AND c.id = ?", COMMENT_SELECT))
            .bind(post)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to get comment {}: {}", id, e)))?;
        row.map(|row| comment_from_row(&row)).transpose().map_err(decode_err)
    }

    async fn list_comments(&self, post: PostId) -> AppResult<Vec<Comment>> {
        let rows = sqlx::query(&format!("{} WHERE c.post_id = ? ORDER BY c.id", COMMENT_SELECT))
            .bind(post)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to list comments of post {}: {}", post, e))
            })?;
        rows.iter()
            .map(comment_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err)
    }

    async fn update_comment(&self, id: CommentId, text: &str) -> AppResult<Option<Comment>> {
        let post: Option<i64> =
            sqlx::query_scalar("UPDATE comments SET text = ? WHERE id = ? RETURNING post_id")
                .bind(text)
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| write_err("comment", e))?;

        match post {
            Some(post) => self.get_comment(post, id).await,
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, id: CommentId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to delete comment {}: {}", id, e))
            })?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_follow(&self, user: UserId, following: UserId) -> AppResult<Option<Follow>> {
        let result = sqlx::query(
            "INSERT INTO follows (user_id, following_id, created) VALUES (?, ?, ?) \
             ON CONFLICT (user_id, following_id) DO NOTHING",
        )
        .bind(user)
        .bind(following)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| write_err("follow", e))?;

        if result.rows_affected() == 0 {
            tracing::debug!(user, following, "Follow already exists");
            return Ok(None);
        }
        self.fetch_follow(result.last_insert_rowid()).await
    }

    async fn follow_exists(&self, user: UserId, following: UserId) -> AppResult<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ? AND following_id = ?)",
        )
        .bind(user)
        .bind(following)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to check follow: {}", e)))?;
        Ok(exists)
    }

    async fn list_follows(&self, user: UserId, search: Option<&str>) -> AppResult<Vec<Follow>> {
        let rows = sqlx::query(&format!(
            "{} WHERE f.user_id = ? ORDER BY f.created DESC, f.id DESC",
            FOLLOW_SELECT
        ))
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to list follows: {}", e)))?;

        let follows: Vec<Follow> = rows
            .iter()
            .map(follow_from_row)
            .collect::<Result<_, _>>()
            .map_err(decode_err)?;

        Ok(match search.filter(|s| !s.is_empty()) {
            Some(search) => {
                let needle = search.to_lowercase();
                follows
                    .into_iter()
                    .filter(|follow| matches_search(&follow.following, &needle))
                    .collect()
            }
            None => follows,
        })
    }
}
