//! SeaORM entity models
//!
//! Database entities for ArticleHub

mod article;
mod article_author;
mod article_tag;
mod author;
mod comment;
mod tag;
mod user;

pub use article::{
    Entity as ArticleEntity,
    Model as Article,
    ActiveModel as ArticleActiveModel,
    Column as ArticleColumn,
};

pub use author::{
    Entity as AuthorEntity,
    Model as Author,
    ActiveModel as AuthorActiveModel,
    Column as AuthorColumn,
};

pub use tag::{
    Entity as TagEntity,
    Model as Tag,
    ActiveModel as TagActiveModel,
    Column as TagColumn,
};

pub use article_author::{
    Entity as ArticleAuthorEntity,
    Model as ArticleAuthor,
    ActiveModel as ArticleAuthorActiveModel,
    Column as ArticleAuthorColumn,
};

pub use article_tag::{
    Entity as ArticleTagEntity,
    Model as ArticleTag,
    ActiveModel as ArticleTagActiveModel,
    Column as ArticleTagColumn,
};

pub use comment::{
    Entity as CommentEntity,
    Model as Comment,
    ActiveModel as CommentActiveModel,
    Column as CommentColumn,
};

pub use user::{
    Entity as UserEntity,
    Model as User,
    ActiveModel as UserActiveModel,
    Column as UserColumn,
};
