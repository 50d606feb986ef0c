//! Repository pattern for database operations
//!
//! Provides a clean interface for all data access operations
//! with proper error handling and transaction support.

use crate::db::models::*;
use crate::db::DbPool;
use crate::errors::{AppError, Result};
use crate::filter::ArticleQuery;
use crate::pagination::PageRequest;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Select, Set, SqlErr, TransactionTrait,
    sea_query::OnConflict,
};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

/// An article together with its authors and tags (each sorted by name)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub article: Article,
    pub authors: Vec<Author>,
    pub tags: Vec<Tag>,
}

/// Everything needed to insert an article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub identifier: String,
    pub publication_date: NaiveDate,
    pub title: String,
    pub abstract_text: String,
    pub authors: Vec<String>,
    pub tags: Vec<String>,
}

/// A partial article update; `None` leaves the field untouched.
///
/// `authors` / `tags`, when present, replace the whole association set.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub identifier: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub title: Option<String>,
    pub abstract_text: Option<String>,
    pub authors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
    pub article_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Default)]
pub struct CommentChanges {
    pub article_id: Option<Uuid>,
    pub content: Option<String>,
}

/// Repository for data access operations
#[derive(Clone)]
pub struct Repository {
    pool: DbPool,
}

impl Repository {
    /// Create a new repository with the given connection pool
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get the read connection
    fn read_conn(&self) -> &DatabaseConnection {
        self.pool.read()
    }

    /// Get the write connection
    fn write_conn(&self) -> &DatabaseConnection {
        self.pool.write()
    }

    // ========================================================================
    // Health Check
    // ========================================================================

    /// Ping the database
    pub async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    /// Fails until every table the API reads has been created
    pub async fn schema_ready(&self) -> Result<()> {
        let conn = self.read_conn();
        UserEntity::find().one(conn).await?;
        ArticleEntity::find().one(conn).await?;
        CommentEntity::find().one(conn).await?;
        ArticleTagEntity::find().one(conn).await?;
        ArticleAuthorEntity::find().one(conn).await?;
        Ok(())
    }

    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user; usernames are unique
    pub async fn create_user(&self, username: &str, password_hash: String) -> Result<User> {
        if self.find_user_by_username(username).await?.is_some() {
            return Err(username_taken(username));
        }

        let user = UserActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now().into()),
        };

        user.insert(self.write_conn())
            .await
            .map_err(|e| on_unique_violation(e, || username_taken(username)))
    }

    /// Find user by username
    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        UserEntity::find()
            .filter(UserColumn::Username.eq(username))
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    // ========================================================================
    // Article Operations
    // ========================================================================

    /// One page of filtered articles plus the total match count
    pub async fn list_articles(
        &self,
        query: &ArticleQuery,
        page: PageRequest,
    ) -> Result<(Vec<ArticleRecord>, u64)> {
        let paginator = self
            .filtered_articles(query)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        page.ensure_within(total)?;

        let articles = paginator.fetch_page(page.index()).await?;
        let records = attach_relations(self.read_conn(), articles).await?;

        Ok((records, total))
    }

    /// Every filtered article, for export
    pub async fn export_articles(&self, query: &ArticleQuery) -> Result<Vec<ArticleRecord>> {
        let articles = self.filtered_articles(query).all(self.read_conn()).await?;
        attach_relations(self.read_conn(), articles).await
    }

    fn filtered_articles(&self, query: &ArticleQuery) -> Select<ArticleEntity> {
        ArticleEntity::find()
            .filter(query.condition(self.pool.backend()))
            .order_by_desc(ArticleColumn::PublicationDate)
            .order_by_asc(ArticleColumn::Identifier)
    }

    /// Find article by ID (without relations)
    pub async fn find_article_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        ArticleEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Find article by ID with its authors and tags
    pub async fn find_article_record(&self, id: Uuid) -> Result<Option<ArticleRecord>> {
        match self.find_article_by_id(id).await? {
            Some(article) => attach_one(self.read_conn(), article).await.map(Some),
            None => Ok(None),
        }
    }

    /// Create an article owned by `owner_id`, resolving authors and tags by name
    pub async fn create_article(&self, owner_id: Uuid, input: NewArticle) -> Result<ArticleRecord> {
        let txn = self.write_conn().begin().await?;

        ensure_identifier_free(&txn, &input.identifier, None).await?;

        let now = Utc::now();
        let article = ArticleActiveModel {
            id: Set(Uuid::new_v4()),
            identifier: Set(input.identifier.clone()),
            publication_date: Set(input.publication_date),
            title: Set(input.title),
            abstract_text: Set(input.abstract_text),
            owner_id: Set(owner_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await
        .map_err(|e| on_unique_violation(e, || identifier_taken()))?;

        replace_authors(&txn, article.id, &input.authors).await?;
        replace_tags(&txn, article.id, &input.tags).await?;

        let record = attach_one(&txn, article).await?;
        txn.commit().await?;

        Ok(record)
    }

    /// Apply a partial update in one transaction
    pub async fn update_article(
        &self,
        article: Article,
        changes: ArticleChanges,
    ) -> Result<ArticleRecord> {
        let txn = self.write_conn().begin().await?;

        if let Some(ref identifier) = changes.identifier {
            ensure_identifier_free(&txn, identifier, Some(article.id)).await?;
        }

        let mut active: ArticleActiveModel = article.into();
        if let Some(identifier) = changes.identifier {
            active.identifier = Set(identifier);
        }
        if let Some(date) = changes.publication_date {
            active.publication_date = Set(date);
        }
        if let Some(title) = changes.title {
            active.title = Set(title);
        }
        if let Some(abstract_text) = changes.abstract_text {
            active.abstract_text = Set(abstract_text);
        }
        active.updated_at = Set(Utc::now().into());

        let article = active
            .update(&txn)
            .await
            .map_err(|e| on_unique_violation(e, || identifier_taken()))?;

        if let Some(ref names) = changes.authors {
            replace_authors(&txn, article.id, names).await?;
        }
        if let Some(ref names) = changes.tags {
            replace_tags(&txn, article.id, names).await?;
        }

        let record = attach_one(&txn, article).await?;
        txn.commit().await?;

        Ok(record)
    }

    /// Delete an article along with its comments and associations
    pub async fn delete_article(&self, id: Uuid) -> Result<bool> {
        let txn = self.write_conn().begin().await?;

        CommentEntity::delete_many()
            .filter(CommentColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;
        ArticleAuthorEntity::delete_many()
            .filter(ArticleAuthorColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;
        ArticleTagEntity::delete_many()
            .filter(ArticleTagColumn::ArticleId.eq(id))
            .exec(&txn)
            .await?;

        let result = ArticleEntity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;

        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Comment Operations
    // ========================================================================

    /// One page of comments, oldest first, plus the total count
    pub async fn list_comments(&self, page: PageRequest) -> Result<(Vec<Comment>, u64)> {
        let paginator = CommentEntity::find()
            .order_by_asc(CommentColumn::CreatedAt)
            .order_by_asc(CommentColumn::Id)
            .paginate(self.read_conn(), page.page_size);

        let total = paginator.num_items().await?;
        page.ensure_within(total)?;

        let comments = paginator.fetch_page(page.index()).await?;
        Ok((comments, total))
    }

    /// Find comment by ID
    pub async fn find_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        CommentEntity::find_by_id(id)
            .one(self.read_conn())
            .await
            .map_err(Into::into)
    }

    /// Create a comment authored by `user_id`
    pub async fn create_comment(&self, user_id: Uuid, input: NewComment) -> Result<Comment> {
        let txn = self.write_conn().begin().await?;

        ensure_article_exists(&txn, input.article_id).await?;

        let now = Utc::now();
        let comment = CommentActiveModel {
            id: Set(Uuid::new_v4()),
            article_id: Set(input.article_id),
            user_id: Set(user_id),
            content: Set(input.content),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;
        Ok(comment)
    }

    /// Apply a partial comment update; the author never changes
    pub async fn update_comment(&self, comment: Comment, changes: CommentChanges) -> Result<Comment> {
        let txn = self.write_conn().begin().await?;

        let mut active: CommentActiveModel = comment.into();
        if let Some(article_id) = changes.article_id {
            ensure_article_exists(&txn, article_id).await?;
            active.article_id = Set(article_id);
        }
        if let Some(content) = changes.content {
            active.content = Set(content);
        }
        active.updated_at = Set(Utc::now().into());

        let comment = active.update(&txn).await?;
        txn.commit().await?;

        Ok(comment)
    }

    /// Delete comment by ID
    pub async fn delete_comment(&self, id: Uuid) -> Result<bool> {
        let result = CommentEntity::delete_by_id(id)
            .exec(self.write_conn())
            .await?;

        Ok(result.rows_affected > 0)
    }
}

// ============================================================================
// Helpers shared by pooled and transactional paths
// ============================================================================

fn username_taken(username: &str) -> AppError {
    AppError::Duplicate {
        message: format!("A user with username '{}' already exists", username),
    }
}

fn identifier_taken() -> AppError {
    AppError::invalid_field("identifier", "article with this identifier already exists.")
}

/// Map a unique-constraint failure to a domain error, anything else to `Database`
fn on_unique_violation(err: DbErr, conflict: impl FnOnce() -> AppError) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => conflict(),
        _ => err.into(),
    }
}

async fn ensure_identifier_free<C: ConnectionTrait>(
    conn: &C,
    identifier: &str,
    except: Option<Uuid>,
) -> Result<()> {
    let mut select = ArticleEntity::find().filter(ArticleColumn::Identifier.eq(identifier));
    if let Some(id) = except {
        select = select.filter(ArticleColumn::Id.ne(id));
    }

    if select.one(conn).await?.is_some() {
        return Err(identifier_taken());
    }
    Ok(())
}

async fn ensure_article_exists<C: ConnectionTrait>(conn: &C, article_id: Uuid) -> Result<()> {
    if ArticleEntity::find_by_id(article_id).one(conn).await?.is_none() {
        return Err(AppError::invalid_field(
            "article",
            format!("Invalid pk \"{}\" - object does not exist.", article_id),
        ));
    }
    Ok(())
}

async fn find_or_create_author<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Author> {
    if let Some(author) = AuthorEntity::find()
        .filter(AuthorColumn::Name.eq(name))
        .order_by_asc(AuthorColumn::Id)
        .one(conn)
        .await?
    {
        return Ok(author);
    }

    AuthorActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    }
    .insert(conn)
    .await
    .map_err(Into::into)
}

async fn find_or_create_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Tag> {
    if let Some(tag) = find_tag(conn, name).await? {
        return Ok(tag);
    }
    insert_tag_if_absent(conn, name).await
}

/// Insert a tag unless one with this name exists, then return the stored row.
///
/// `ON CONFLICT DO NOTHING` means a concurrent insert of the same name never
/// raises, so an enclosing Postgres transaction stays usable.
async fn insert_tag_if_absent<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Tag> {
    TagEntity::insert(TagActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
    })
    .on_conflict(OnConflict::column(TagColumn::Name).do_nothing().to_owned())
    .exec_without_returning(conn)
    .await?;

    find_tag(conn, name).await?.ok_or_else(|| AppError::Internal {
        message: format!("tag '{}' missing after insert", name),
    })
}

async fn find_tag<C: ConnectionTrait>(conn: &C, name: &str) -> Result<Option<Tag>> {
    TagEntity::find()
        .filter(TagColumn::Name.eq(name))
        .one(conn)
        .await
        .map_err(Into::into)
}

/// Clear the article's authors, then link one author per distinct name
async fn replace_authors<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    names: &[String],
) -> Result<()> {
    ArticleAuthorEntity::delete_many()
        .filter(ArticleAuthorColumn::ArticleId.eq(article_id))
        .exec(conn)
        .await?;

    let mut linked = HashSet::new();
    for name in names {
        let author = find_or_create_author(conn, name).await?;
        if !linked.insert(author.id) {
            continue;
        }

        ArticleAuthorEntity::insert(ArticleAuthorActiveModel {
            article_id: Set(article_id),
            author_id: Set(author.id),
        })
        .exec_without_returning(conn)
        .await?;
    }

    Ok(())
}

/// Clear the article's tags, then link one tag per distinct name
async fn replace_tags<C: ConnectionTrait>(
    conn: &C,
    article_id: Uuid,
    names: &[String],
) -> Result<()> {
    ArticleTagEntity::delete_many()
        .filter(ArticleTagColumn::ArticleId.eq(article_id))
        .exec(conn)
        .await?;

    let mut linked = HashSet::new();
    for name in names {
        let tag = find_or_create_tag(conn, name).await?;
        if !linked.insert(tag.id) {
            continue;
        }

        ArticleTagEntity::insert(ArticleTagActiveModel {
            article_id: Set(article_id),
            tag_id: Set(tag.id),
        })
        .exec_without_returning(conn)
        .await?;
    }

    Ok(())
}

async fn attach_one<C: ConnectionTrait>(conn: &C, article: Article) -> Result<ArticleRecord> {
    let mut records = attach_relations(conn, vec![article]).await?;
    records.pop().ok_or_else(|| AppError::Internal {
        message: "article vanished while loading relations".to_string(),
    })
}

/// Load authors and tags for a batch of articles with four queries total
async fn attach_relations<C: ConnectionTrait>(
    conn: &C,
    articles: Vec<Article>,
) -> Result<Vec<ArticleRecord>> {
    if articles.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = articles.iter().map(|a| a.id).collect();
    let mut authors = load_authors(conn, &ids).await?;
    let mut tags = load_tags(conn, &ids).await?;

    Ok(articles
        .into_iter()
        .map(|article| ArticleRecord {
            authors: authors.remove(&article.id).unwrap_or_default(),
            tags: tags.remove(&article.id).unwrap_or_default(),
            article,
        })
        .collect())
}

async fn load_authors<C: ConnectionTrait>(
    conn: &C,
    article_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Author>>> {
    let links = ArticleAuthorEntity::find()
        .filter(ArticleAuthorColumn::ArticleId.is_in(article_ids.iter().copied()))
        .all(conn)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let by_id: HashMap<Uuid, Author> = AuthorEntity::find()
        .filter(AuthorColumn::Id.is_in(links.iter().map(|l| l.author_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<Author>> = HashMap::new();
    for link in links {
        if let Some(author) = by_id.get(&link.author_id) {
            grouped.entry(link.article_id).or_default().push(author.clone());
        }
    }
    for list in grouped.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    }

    Ok(grouped)
}

async fn load_tags<C: ConnectionTrait>(
    conn: &C,
    article_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<Tag>>> {
    let links = ArticleTagEntity::find()
        .filter(ArticleTagColumn::ArticleId.is_in(article_ids.iter().copied()))
        .all(conn)
        .await?;
    if links.is_empty() {
        return Ok(HashMap::new());
    }

    let by_id: HashMap<Uuid, Tag> = TagEntity::find()
        .filter(TagColumn::Id.is_in(links.iter().map(|l| l.tag_id)))
        .all(conn)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();

    let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
    for link in links {
        if let Some(tag) = by_id.get(&link.tag_id) {
            grouped.entry(link.article_id).or_default().push(tag.clone());
        }
    }
    for list in grouped.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }

    Ok(grouped)
}
