//! Postgres implementation of the persistence gateway.
//!
//! Implemented directly on [`crate::db::Connection`]; a pooled connection
//! can be used through `&mut *pool.get()?`.

use diesel::{dsl::max, prelude::*, result::{DatabaseErrorKind, Error as DbError}};

use crate::db::{
    models as db,
    schema::{
        comentarios, favoritos, multimedia_publicacion, notificaciones,
        publicaciones, tipos_publicacion, usuarios,
    },
    types::PublicationState,
    Connection,
};
use super::{CommentRow, Gateway, NotificationRow, PublicationMeta, StoreError};

impl From<DbError> for StoreError {
    fn from(e: DbError) -> StoreError {
        match e {
            DbError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) =>
                StoreError::Duplicate(info.message().to_string()),
            e => StoreError::Database(e.to_string()),
        }
    }
}

/// Carrier for the caller's error type through diesel's transaction
/// machinery, which needs `From<diesel::result::Error>` on it.
enum TxError<E> {
    User(E),
    Db(DbError),
}

impl<E> From<DbError> for TxError<E> {
    fn from(e: DbError) -> TxError<E> {
        TxError::Db(e)
    }
}

impl Gateway for Connection {
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let r = diesel::Connection::transaction::<T, TxError<E>, _>(
            self,
            |conn| f(conn).map_err(TxError::User),
        );

        match r {
            Ok(v) => Ok(v),
            Err(TxError::User(e)) => Err(e),
            Err(TxError::Db(e)) => Err(StoreError::from(e).into()),
        }
    }

    fn user_by_id(&mut self, id: i32) -> Result<Option<db::User>, StoreError> {
        usuarios::table
            .find(id)
            .get_result::<db::User>(self)
            .optional()
            .map_err(Into::into)
    }

    fn category_exists(&mut self, id: i32) -> Result<bool, StoreError> {
        tipos_publicacion::table
            .find(id)
            .count()
            .get_result::<i64>(self)
            .map(|count| count > 0)
            .map_err(Into::into)
    }

    fn categories(&mut self) -> Result<Vec<db::PublicationType>, StoreError> {
        tipos_publicacion::table
            .order(tipos_publicacion::id_tipo.asc())
            .get_results::<db::PublicationType>(self)
            .map_err(Into::into)
    }

    fn insert_publication(&mut self, new: &db::NewPublication)
    -> Result<db::Publication, StoreError> {
        diesel::insert_into(publicaciones::table)
            .values(new)
            .get_result::<db::Publication>(self)
            .map_err(Into::into)
    }

    fn insert_publication_with_id(&mut self, id: i32, new: &db::NewPublication)
    -> Result<db::Publication, StoreError> {
        diesel::insert_into(publicaciones::table)
            .values((publicaciones::id_publicacion.eq(id), new))
            .get_result::<db::Publication>(self)
            .map_err(Into::into)
    }

    fn publication_by_id(&mut self, id: i32)
    -> Result<Option<db::Publication>, StoreError> {
        publicaciones::table
            .find(id)
            .get_result::<db::Publication>(self)
            .optional()
            .map_err(Into::into)
    }

    fn publication_with_meta(&mut self, id: i32)
    -> Result<Option<PublicationMeta>, StoreError> {
        publicaciones::table
            .inner_join(usuarios::table)
            .inner_join(tipos_publicacion::table)
            .filter(publicaciones::id_publicacion.eq(id))
            .select((
                publicaciones::all_columns,
                usuarios::nombre,
                usuarios::foto_perfil,
                tipos_publicacion::nombre,
            ))
            .get_result::<(db::Publication, String, Option<String>, String)>(self)
            .optional()
            .map(|row| row.map(|(publication, autor, autor_foto, tipo)| {
                PublicationMeta {
                    publication,
                    autor,
                    autor_foto,
                    tipo_publicacion: tipo,
                }
            }))
            .map_err(Into::into)
    }

    fn max_publication_id(&mut self) -> Result<Option<i32>, StoreError> {
        publicaciones::table
            .select(max(publicaciones::id_publicacion))
            .get_result::<Option<i32>>(self)
            .map_err(Into::into)
    }

    fn update_publication(&mut self, id: i32, change: &db::PublicationChange)
    -> Result<usize, StoreError> {
        diesel::update(publicaciones::table.find(id))
            .set(change.clone())
            .execute(self)
            .map_err(Into::into)
    }

    fn publications_of_user(&mut self, user: i32)
    -> Result<Vec<db::Publication>, StoreError> {
        publicaciones::table
            .filter(publicaciones::id_usuario.eq(user)
                .and(publicaciones::eliminado.eq(false)))
            .order(publicaciones::fecha_creacion.desc())
            .get_results::<db::Publication>(self)
            .map_err(Into::into)
    }

    fn recent_published(&mut self, limit: i64)
    -> Result<Vec<db::Publication>, StoreError> {
        publicaciones::table
            .filter(publicaciones::estado.eq(PublicationState::Publicado)
                .and(publicaciones::eliminado.eq(false))
                .and(publicaciones::es_privada.eq(false)))
            .order(publicaciones::fecha_publicacion.desc())
            .limit(limit)
            .get_results::<db::Publication>(self)
            .map_err(Into::into)
    }

    fn pending_review(&mut self) -> Result<Vec<db::Publication>, StoreError> {
        publicaciones::table
            .filter(publicaciones::estado.eq(PublicationState::EnRevision)
                .and(publicaciones::eliminado.eq(false)))
            .order(publicaciones::fecha_creacion.desc())
            .get_results::<db::Publication>(self)
            .map_err(Into::into)
    }

    fn published_count_of_user(&mut self, user: i32) -> Result<i64, StoreError> {
        publicaciones::table
            .filter(publicaciones::id_usuario.eq(user)
                .and(publicaciones::estado.eq(PublicationState::Publicado))
                .and(publicaciones::eliminado.eq(false))
                .and(publicaciones::es_privada.eq(false)))
            .count()
            .get_result::<i64>(self)
            .map_err(Into::into)
    }

    fn favorite_of(&mut self, user: i32, publication: i32)
    -> Result<Option<db::Favorite>, StoreError> {
        favoritos::table
            .filter(favoritos::id_usuario.eq(user)
                .and(favoritos::id_publicacion.eq(publication)))
            .get_result::<db::Favorite>(self)
            .optional()
            .map_err(Into::into)
    }

    fn insert_favorite(&mut self, new: &db::NewFavorite)
    -> Result<db::Favorite, StoreError> {
        diesel::insert_into(favoritos::table)
            .values(new)
            .get_result::<db::Favorite>(self)
            .map_err(Into::into)
    }

    fn delete_favorite(&mut self, id: i32) -> Result<usize, StoreError> {
        diesel::delete(favoritos::table.find(id))
            .execute(self)
            .map_err(Into::into)
    }

    fn favorite_count(&mut self, publication: i32) -> Result<i64, StoreError> {
        favoritos::table
            .filter(favoritos::id_publicacion.eq(publication))
            .count()
            .get_result::<i64>(self)
            .map_err(Into::into)
    }

    fn insert_comment(&mut self, new: &db::NewComment)
    -> Result<db::Comment, StoreError> {
        diesel::insert_into(comentarios::table)
            .values(new)
            .get_result::<db::Comment>(self)
            .map_err(Into::into)
    }

    fn comment_by_id(&mut self, id: i32)
    -> Result<Option<db::Comment>, StoreError> {
        comentarios::table
            .find(id)
            .get_result::<db::Comment>(self)
            .optional()
            .map_err(Into::into)
    }

    fn delete_comment(&mut self, id: i32) -> Result<usize, StoreError> {
        diesel::delete(comentarios::table.find(id))
            .execute(self)
            .map_err(Into::into)
    }

    fn comments_of_publication(&mut self, publication: i32)
    -> Result<Vec<CommentRow>, StoreError> {
        comentarios::table
            .inner_join(usuarios::table)
            .filter(comentarios::id_publicacion.eq(publication))
            .order(comentarios::fecha_creacion.asc())
            .select((comentarios::all_columns, usuarios::nombre))
            .get_results::<(db::Comment, String)>(self)
            .map(|v| v.into_iter()
                .map(|(comment, autor)| CommentRow { comment, autor })
                .collect())
            .map_err(Into::into)
    }

    fn comment_count(&mut self, publication: i32) -> Result<i64, StoreError> {
        comentarios::table
            .filter(comentarios::id_publicacion.eq(publication))
            .count()
            .get_result::<i64>(self)
            .map_err(Into::into)
    }

    fn insert_notification(&mut self, new: &db::NewNotification)
    -> Result<db::Notification, StoreError> {
        diesel::insert_into(notificaciones::table)
            .values(new)
            .get_result::<db::Notification>(self)
            .map_err(Into::into)
    }

    fn set_notification_read(&mut self, id: i32, user: i32)
    -> Result<usize, StoreError> {
        diesel::update(notificaciones::table
            .filter(notificaciones::id_notificacion.eq(id)
                .and(notificaciones::id_usuario.eq(user))))
            .set(notificaciones::leida.eq(true))
            .execute(self)
            .map_err(Into::into)
    }

    fn mark_all_notifications_read(&mut self, user: i32)
    -> Result<usize, StoreError> {
        diesel::update(notificaciones::table
            .filter(notificaciones::id_usuario.eq(user)
                .and(notificaciones::leida.eq(false))))
            .set(notificaciones::leida.eq(true))
            .execute(self)
            .map_err(Into::into)
    }

    fn notifications_of_user(
        &mut self,
        user: i32,
        read: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>, StoreError> {
        let join = usuarios::table
            .on(usuarios::id_usuario.nullable().eq(notificaciones::id_origen));
        let select = (
            notificaciones::all_columns,
            usuarios::nombre.nullable(),
            usuarios::foto_perfil.nullable(),
        );

        let rows = match read {
            Some(read) => notificaciones::table
                .left_join(join)
                .filter(notificaciones::id_usuario.eq(user)
                    .and(notificaciones::leida.eq(read)))
                .order(notificaciones::fecha_creacion.desc())
                .limit(limit)
                .offset(offset)
                .select(select)
                .get_results::<(db::Notification, Option<String>, Option<String>)>(self)?,
            None => notificaciones::table
                .left_join(join)
                .filter(notificaciones::id_usuario.eq(user))
                .order(notificaciones::fecha_creacion.desc())
                .limit(limit)
                .offset(offset)
                .select(select)
                .get_results::<(db::Notification, Option<String>, Option<String>)>(self)?,
        };

        Ok(rows.into_iter()
            .map(|(notification, origen_nombre, origen_foto)| NotificationRow {
                notification,
                origen_nombre,
                origen_foto,
            })
            .collect())
    }

    fn notification_count(&mut self, user: i32, read: Option<bool>)
    -> Result<i64, StoreError> {
        let count = match read {
            Some(read) => notificaciones::table
                .filter(notificaciones::id_usuario.eq(user)
                    .and(notificaciones::leida.eq(read)))
                .count()
                .get_result::<i64>(self)?,
            None => notificaciones::table
                .filter(notificaciones::id_usuario.eq(user))
                .count()
                .get_result::<i64>(self)?,
        };

        Ok(count)
    }

    fn max_image_order(&mut self, publication: i32)
    -> Result<Option<i32>, StoreError> {
        multimedia_publicacion::table
            .filter(multimedia_publicacion::id_publicacion.eq(publication))
            .select(max(multimedia_publicacion::orden))
            .get_result::<Option<i32>>(self)
            .map_err(Into::into)
    }

    fn insert_image(&mut self, new: &db::NewPublicationImage)
    -> Result<db::PublicationImage, StoreError> {
        diesel::insert_into(multimedia_publicacion::table)
            .values(new)
            .get_result::<db::PublicationImage>(self)
            .map_err(Into::into)
    }

    fn images_of_publication(&mut self, publication: i32)
    -> Result<Vec<db::PublicationImage>, StoreError> {
        multimedia_publicacion::table
            .filter(multimedia_publicacion::id_publicacion.eq(publication))
            .order(multimedia_publicacion::orden.asc())
            .get_results::<db::PublicationImage>(self)
            .map_err(Into::into)
    }
}
