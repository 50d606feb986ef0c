//! Table bootstrap derived from the entity definitions

use crate::db::models::*;
use crate::errors::Result;
use sea_orm::{ConnectionTrait, EntityTrait, Schema};

/// Create every table (and index) that does not exist yet.
///
/// Tables are created parents-first so foreign keys resolve.
pub async fn create_tables<C: ConnectionTrait>(conn: &C) -> Result<()> {
    create_table(conn, UserEntity).await?;
    create_table(conn, AuthorEntity).await?;
    create_table(conn, TagEntity).await?;
    create_table(conn, ArticleEntity).await?;
    create_table(conn, ArticleAuthorEntity).await?;
    create_table(conn, ArticleTagEntity).await?;
    create_table(conn, CommentEntity).await?;

    tracing::debug!("Schema is up to date");
    Ok(())
}

async fn create_table<C, E>(conn: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = conn.get_database_backend();
    let schema = Schema::new(backend);

    let mut table = schema.create_table_from_entity(entity);
    conn.execute(backend.build(table.if_not_exists())).await?;

    for mut index in schema.create_index_from_entity(entity) {
        conn.execute(backend.build(index.if_not_exists())).await?;
    }

    Ok(())
}
