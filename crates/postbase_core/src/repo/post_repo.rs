//! Post repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and per-owner listing over the `post` table.
//! - Load the owning user on request through a join.
//!
//! # Invariants
//! - Writes referencing a missing user fail with
//!   `RepoError::ForeignKeyViolation`; nothing is persisted.
//! - Listing is deterministic: `id ASC`.

use super::{ready_connection, RepoResult};
use crate::data_source::DataSource;
use crate::model::post::{NewPost, Post, PostId, PostPatch};
use crate::model::user::{User, UserId};
use crate::model::EntityKind;
use log::debug;
use rusqlite::{params, Connection, Params, Row};

const POST_SELECT_SQL: &str = "SELECT
    id,
    title,
    content,
    user_id
FROM post";

const POST_WITH_USER_SELECT_SQL: &str = "SELECT
    p.id AS id,
    p.title AS title,
    p.content AS content,
    p.user_id AS user_id,
    u.name AS user_name,
    u.email AS user_email
FROM post p
INNER JOIN user u ON u.id = p.user_id";

/// Repository interface for post operations.
pub trait PostRepository {
    /// Inserts a post for an existing user and returns it with its id.
    fn create(&self, post: &NewPost) -> RepoResult<Post>;
    fn find_all(&self, include_user: bool) -> RepoResult<Vec<Post>>;
    fn find_by_id(&self, id: PostId, include_user: bool) -> RepoResult<Option<Post>>;
    /// Applies a partial update and returns the re-read row.
    fn update(&self, id: PostId, patch: &PostPatch) -> RepoResult<Option<Post>>;
    /// Returns whether a row was removed.
    fn delete(&self, id: PostId) -> RepoResult<bool>;
    /// Lists posts owned by a user; empty for unknown users.
    fn find_by_user_id(&self, user_id: UserId, include_user: bool) -> RepoResult<Vec<Post>>;
}

/// SQLite-backed post repository.
pub struct SqlitePostRepository<'src> {
    source: &'src DataSource,
}

impl<'src> SqlitePostRepository<'src> {
    pub fn new(source: &'src DataSource) -> Self {
        Self { source }
    }

    fn conn(&self) -> RepoResult<&'src Connection> {
        ready_connection(self.source, EntityKind::Post)
    }
}

impl PostRepository for SqlitePostRepository<'_> {
    fn create(&self, post: &NewPost) -> RepoResult<Post> {
        let conn = self.conn()?;
        post.validate()?;

        conn.execute(
            "INSERT INTO post (title, content, user_id) VALUES (?1, ?2, ?3);",
            params![post.title.as_str(), post.content.as_str(), post.user_id],
        )?;
        let id = conn.last_insert_rowid();
        debug!(
            "event=post_create module=repo status=ok post_id={} user_id={}",
            id, post.user_id
        );

        Ok(Post {
            id,
            title: post.title.clone(),
            content: post.content.clone(),
            user_id: post.user_id,
            user: None,
        })
    }

    fn find_all(&self, include_user: bool) -> RepoResult<Vec<Post>> {
        let conn = self.conn()?;
        let sql = if include_user {
            format!("{POST_WITH_USER_SELECT_SQL} ORDER BY p.id ASC;")
        } else {
            format!("{POST_SELECT_SQL} ORDER BY id ASC;")
        };
        query_posts(conn, &sql, [], include_user)
    }

    fn find_by_id(&self, id: PostId, include_user: bool) -> RepoResult<Option<Post>> {
        let conn = self.conn()?;
        let sql = if include_user {
            format!("{POST_WITH_USER_SELECT_SQL} WHERE p.id = ?1;")
        } else {
            format!("{POST_SELECT_SQL} WHERE id = ?1;")
        };
        let posts = query_posts(conn, &sql, [id], include_user)?;
        Ok(posts.into_iter().next())
    }

    fn update(&self, id: PostId, patch: &PostPatch) -> RepoResult<Option<Post>> {
        let conn = self.conn()?;
        patch.validate()?;

        if !patch.is_empty() {
            let changed = conn.execute(
                "UPDATE post
                 SET
                    title = COALESCE(?2, title),
                    content = COALESCE(?3, content),
                    user_id = COALESCE(?4, user_id)
                 WHERE id = ?1;",
                params![
                    id,
                    patch.title.as_deref(),
                    patch.content.as_deref(),
                    patch.user_id,
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            debug!("event=post_update module=repo status=ok post_id={id}");
        }

        self.find_by_id(id, false)
    }

    fn delete(&self, id: PostId) -> RepoResult<bool> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM post WHERE id = ?1;", [id])?;
        debug!(
            "event=post_delete module=repo status=ok post_id={} removed={}",
            id,
            removed > 0
        );
        Ok(removed > 0)
    }

    fn find_by_user_id(&self, user_id: UserId, include_user: bool) -> RepoResult<Vec<Post>> {
        let conn = self.conn()?;
        select_posts_by_user(conn, user_id, include_user)
    }
}

/// Loads every post owned by `user_id`, ordered by id.
pub(crate) fn select_posts_by_user(
    conn: &Connection,
    user_id: UserId,
    include_user: bool,
) -> RepoResult<Vec<Post>> {
    let sql = if include_user {
        format!("{POST_WITH_USER_SELECT_SQL} WHERE p.user_id = ?1 ORDER BY p.id ASC;")
    } else {
        format!("{POST_SELECT_SQL} WHERE user_id = ?1 ORDER BY id ASC;")
    };
    query_posts(conn, &sql, [user_id], include_user)
}

fn query_posts<P: Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    include_user: bool,
) -> RepoResult<Vec<Post>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut posts = Vec::new();
    while let Some(row) = rows.next()? {
        let post = if include_user {
            parse_post_with_user_row(row)?
        } else {
            parse_post_row(row)?
        };
        posts.push(post);
    }
    Ok(posts)
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<Post> {
    Ok(Post {
        id: row.get("id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        user_id: row.get("user_id")?,
        user: None,
    })
}

fn parse_post_with_user_row(row: &Row<'_>) -> RepoResult<Post> {
    let mut post = parse_post_row(row)?;
    post.user = Some(Box::new(User {
        id: post.user_id,
        name: row.get("user_name")?,
        email: row.get("user_email")?,
        posts: None,
    }));
    Ok(post)
}
