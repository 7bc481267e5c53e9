//! User repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD, lookup and pagination APIs over the `user` table.
//! - Load the owned post collection on request.
//!
//! # Invariants
//! - `email` uniqueness is enforced by the store and surfaced as
//!   `RepoError::UniquenessViolation`.
//! - Deleting a user removes its posts and the user in one transaction.
//! - Lookups return `Ok(None)` for missing rows; they never fail on absence.

use super::post_repo::select_posts_by_user;
use super::{count_to_u64, ready_connection, Page, PageRequest, RepoResult};
use crate::data_source::DataSource;
use crate::model::post::Post;
use crate::model::user::{NewUser, User, UserId, UserPatch};
use crate::model::EntityKind;
use log::debug;
use rusqlite::{params, Connection, Params, Row, Transaction, TransactionBehavior};

const USER_SELECT_SQL: &str = "SELECT
    id,
    name,
    email
FROM user";

/// Repository interface for user operations.
pub trait UserRepository {
    /// Inserts a user and returns it with its generated id.
    fn create(&self, user: &NewUser) -> RepoResult<User>;
    /// Lists every user, optionally with posts loaded.
    fn find_all(&self, include_posts: bool) -> RepoResult<Vec<User>>;
    fn find_by_id(&self, id: UserId, include_posts: bool) -> RepoResult<Option<User>>;
    fn find_by_email(&self, email: &str, include_posts: bool) -> RepoResult<Option<User>>;
    /// Applies a partial update and returns the re-read row.
    fn update(&self, id: UserId, patch: &UserPatch) -> RepoResult<Option<User>>;
    /// Deletes a user and its posts. Returns whether the user existed.
    fn delete(&self, id: UserId) -> RepoResult<bool>;
    fn exists_by_email(&self, email: &str) -> RepoResult<bool>;
    /// Returns one page of users plus the total user count.
    fn find_with_pagination(
        &self,
        request: PageRequest,
        include_posts: bool,
    ) -> RepoResult<Page<User>>;
    /// Returns the posts owned by a user; empty for unknown users.
    fn load_posts(&self, user_id: UserId) -> RepoResult<Vec<Post>>;
}

/// SQLite-backed user repository.
pub struct SqliteUserRepository<'src> {
    source: &'src DataSource,
}

impl<'src> SqliteUserRepository<'src> {
    pub fn new(source: &'src DataSource) -> Self {
        Self { source }
    }

    fn conn(&self) -> RepoResult<&'src Connection> {
        ready_connection(self.source, EntityKind::User)
    }

    fn attach_posts(&self, conn: &Connection, users: &mut [User]) -> RepoResult<()> {
        ready_connection(self.source, EntityKind::Post)?;
        for user in users.iter_mut() {
            user.posts = Some(select_posts_by_user(conn, user.id, false)?);
        }
        Ok(())
    }

    fn find_one<P: Params>(
        &self,
        sql: &str,
        params: P,
        include_posts: bool,
    ) -> RepoResult<Option<User>> {
        let conn = self.conn()?;
        let mut users = query_users(conn, sql, params)?;
        if include_posts {
            self.attach_posts(conn, &mut users)?;
        }
        Ok(users.into_iter().next())
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create(&self, user: &NewUser) -> RepoResult<User> {
        let conn = self.conn()?;
        user.validate()?;

        conn.execute(
            "INSERT INTO user (name, email) VALUES (?1, ?2);",
            params![user.name.as_str(), user.email.as_str()],
        )?;
        let id = conn.last_insert_rowid();
        debug!("event=user_create module=repo status=ok user_id={id}");

        Ok(User {
            id,
            name: user.name.clone(),
            email: user.email.clone(),
            posts: None,
        })
    }

    fn find_all(&self, include_posts: bool) -> RepoResult<Vec<User>> {
        let conn = self.conn()?;
        let mut users = query_users(conn, &format!("{USER_SELECT_SQL} ORDER BY id ASC;"), [])?;
        if include_posts {
            self.attach_posts(conn, &mut users)?;
        }
        Ok(users)
    }

    fn find_by_id(&self, id: UserId, include_posts: bool) -> RepoResult<Option<User>> {
        self.find_one(
            &format!("{USER_SELECT_SQL} WHERE id = ?1;"),
            [id],
            include_posts,
        )
    }

    fn find_by_email(&self, email: &str, include_posts: bool) -> RepoResult<Option<User>> {
        self.find_one(
            &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
            [email],
            include_posts,
        )
    }

    fn update(&self, id: UserId, patch: &UserPatch) -> RepoResult<Option<User>> {
        let conn = self.conn()?;
        patch.validate()?;

        if !patch.is_empty() {
            let changed = conn.execute(
                "UPDATE user
                 SET
                    name = COALESCE(?2, name),
                    email = COALESCE(?3, email)
                 WHERE id = ?1;",
                params![id, patch.name.as_deref(), patch.email.as_deref()],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            debug!("event=user_update module=repo status=ok user_id={id}");
        }

        self.find_by_id(id, false)
    }

    fn delete(&self, id: UserId) -> RepoResult<bool> {
        let conn = self.conn()?;

        let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
        let removed_posts = tx.execute("DELETE FROM post WHERE user_id = ?1;", [id])?;
        let removed_users = tx.execute("DELETE FROM user WHERE id = ?1;", [id])?;
        tx.commit()?;

        debug!(
            "event=user_delete module=repo status=ok user_id={} removed={} removed_posts={}",
            id,
            removed_users > 0,
            removed_posts
        );
        Ok(removed_users > 0)
    }

    fn exists_by_email(&self, email: &str) -> RepoResult<bool> {
        let conn = self.conn()?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM user
                WHERE email = ?1
            );",
            [email],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn find_with_pagination(
        &self,
        request: PageRequest,
        include_posts: bool,
    ) -> RepoResult<Page<User>> {
        let request = request.normalized();
        let conn = self.conn()?;

        let total: i64 = conn.query_row("SELECT COUNT(*) FROM user;", [], |row| row.get(0))?;
        let mut users = query_users(
            conn,
            &format!("{USER_SELECT_SQL} ORDER BY id ASC LIMIT ?1 OFFSET ?2;"),
            params![i64::from(request.limit), request.offset()],
        )?;
        if include_posts {
            self.attach_posts(conn, &mut users)?;
        }

        Ok(Page {
            items: users,
            total: count_to_u64(total, "user")?,
            page: request.page,
            limit: request.limit,
        })
    }

    fn load_posts(&self, user_id: UserId) -> RepoResult<Vec<Post>> {
        let conn = self.conn()?;
        ready_connection(self.source, EntityKind::Post)?;
        select_posts_by_user(conn, user_id, false)
    }
}

fn query_users<P: Params>(conn: &Connection, sql: &str, params: P) -> RepoResult<Vec<User>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut users = Vec::new();
    while let Some(row) = rows.next()? {
        users.push(parse_user_row(row)?);
    }
    Ok(users)
}

fn parse_user_row(row: &Row<'_>) -> RepoResult<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        posts: None,
    })
}
