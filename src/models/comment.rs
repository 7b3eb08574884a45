use chrono::Utc;
use failure::Fail;
use serde::Serialize;
use std::ops::Deref;

use crate::{
    api::{self, ApiError, Status},
    db::models as db,
    events::{self, NotifyError},
    store::{Gateway, StoreError},
};

/// A reader's comment on a publication.
#[derive(Debug)]
pub struct Comment {
    data: db::Comment,
}

#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id_comentario: i32,
    pub id_publicacion: i32,
    pub id_usuario: i32,
    pub autor: String,
    pub contenido: String,
    pub fecha_creacion: String,
}

impl Comment {
    pub(crate) fn from_db(data: db::Comment) -> Comment {
        Comment { data }
    }

    pub fn by_id<S: Gateway>(store: &mut S, id: i32)
    -> Result<Comment, FindCommentError> {
        store.comment_by_id(id)?
            .ok_or(FindCommentError::NotFound)
            .map(Comment::from_db)
    }

    /// Post a comment on a publication, notifying its owner.
    pub fn create<S: Gateway>(
        store: &mut S,
        actor: &db::User,
        payload: &api::NewComment,
    ) -> Result<Comment, CreateCommentError> {
        let publication_id = payload.validate()?;

        let publication = store.publication_by_id(publication_id)?
            .filter(|p| !p.eliminado)
            .ok_or(CreateCommentError::PublicationNotFound)?;

        store.transaction(|store| {
            let row = store.insert_comment(&db::NewComment {
                id_publicacion: publication.id_publicacion,
                id_usuario: actor.id_usuario,
                contenido: payload.contenido.trim(),
                fecha_creacion: Utc::now().naive_utc(),
            })?;

            events::notify_new_comment(store, &publication, actor)?;

            Ok(Comment::from_db(row))
        })
    }

    /// Delete this comment. Only its author may do so.
    pub fn delete<S: Gateway>(self, store: &mut S, actor: &db::User)
    -> Result<(), DeleteCommentError> {
        if self.data.id_usuario != actor.id_usuario {
            return Err(DeleteCommentError::Forbidden);
        }

        store.delete_comment(self.data.id_comentario)?;

        Ok(())
    }

    /// All comments on a publication, oldest first, with author names.
    pub fn all_of<S: Gateway>(store: &mut S, publication: i32)
    -> Result<Vec<PublicData>, StoreError> {
        Ok(store.comments_of_publication(publication)?
            .into_iter()
            .map(|row| PublicData {
                id_comentario: row.comment.id_comentario,
                id_publicacion: row.comment.id_publicacion,
                id_usuario: row.comment.id_usuario,
                autor: row.autor,
                contenido: row.comment.contenido,
                fecha_creacion: row.comment.fecha_creacion.to_string(),
            })
            .collect())
    }
}

impl Deref for Comment {
    type Target = db::Comment;

    fn deref(&self) -> &db::Comment {
        &self.data
    }
}

#[derive(Debug, Fail)]
pub enum FindCommentError {
    #[fail(display = "Comentario no encontrado")]
    NotFound,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for FindCommentError ;
    StoreError => |e| FindCommentError::Store(e),
}

impl ApiError for FindCommentError {
    fn status(&self) -> Status {
        match self {
            FindCommentError::NotFound => Status::NotFound,
            FindCommentError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            FindCommentError::NotFound => Some("comment:not-found"),
            FindCommentError::Store(_) => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum CreateCommentError {
    #[fail(display = "{}", _0)]
    Invalid(#[cause] api::ValidationError),
    #[fail(display = "Publicación no encontrada")]
    PublicationNotFound,
    #[fail(display = "{}", _0)]
    Notify(#[cause] NotifyError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for CreateCommentError ;
    api::ValidationError => |e| CreateCommentError::Invalid(e),
    NotifyError => |e| CreateCommentError::Notify(e),
    StoreError => |e| CreateCommentError::Store(e),
}

impl ApiError for CreateCommentError {
    fn status(&self) -> Status {
        match self {
            CreateCommentError::Invalid(_) => Status::BadRequest,
            CreateCommentError::PublicationNotFound => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            CreateCommentError::Invalid(_) => Some("comment:invalid"),
            CreateCommentError::PublicationNotFound =>
                Some("publication:not-found"),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum DeleteCommentError {
    /// Caller is not the comment's author.
    #[fail(display = "No tienes permiso para eliminar este comentario")]
    Forbidden,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for DeleteCommentError ;
    StoreError => |e| DeleteCommentError::Store(e),
}

impl ApiError for DeleteCommentError {
    fn status(&self) -> Status {
        match self {
            DeleteCommentError::Forbidden => Status::Forbidden,
            DeleteCommentError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            DeleteCommentError::Forbidden => Some("comment:delete:forbidden"),
            DeleteCommentError::Store(_) => None,
        }
    }
}
