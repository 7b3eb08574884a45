use chrono::Utc;
use failure::Fail;
use log::debug;
use serde::Serialize;

use crate::{
    api::{ApiError, Status},
    db::models as db,
    events::{self, NotifyError},
    store::{Gateway, StoreError},
};

/// Outcome of a favorite toggle.
#[derive(Debug, Serialize)]
pub struct ToggleResult {
    pub es_favorito: bool,
    pub total_favoritos: i64,
}

pub struct Favorite;

impl Favorite {
    /// Toggle `actor`'s favorite on a publication.
    ///
    /// Adding a favorite notifies the publication's owner; removing one is
    /// silent. The insert and its notification commit together. A unique
    /// constraint on `(id_usuario, id_publicacion)` backs the toggle under
    /// concurrent double-submission; a violation is read as "already
    /// favorited".
    pub fn toggle<S: Gateway>(
        store: &mut S,
        actor: &db::User,
        publication: i32,
    ) -> Result<ToggleResult, ToggleFavoriteError> {
        let publication = store.publication_by_id(publication)?
            .filter(|p| !p.eliminado)
            .ok_or(ToggleFavoriteError::PublicationNotFound)?;

        let es_favorito = match store.favorite_of(
            actor.id_usuario, publication.id_publicacion)?
        {
            Some(favorite) => {
                store.delete_favorite(favorite.id_favorito)?;
                debug!("User {} unfavorited publication {}",
                    actor.id_usuario, publication.id_publicacion);
                false
            }
            None => {
                let inserted = store.transaction(
                    |store| -> Result<bool, ToggleFavoriteError> {
                        let r = store.insert_favorite(&db::NewFavorite {
                            id_usuario: actor.id_usuario,
                            id_publicacion: publication.id_publicacion,
                            fecha_creacion: Utc::now().naive_utc(),
                        });

                        match r {
                            Ok(_) => {
                                events::notify_new_favorite(
                                    store, &publication, actor)?;
                                Ok(true)
                            }
                            Err(StoreError::Duplicate(_)) => Ok(false),
                            Err(e) => Err(e.into()),
                        }
                    })?;

                if inserted {
                    debug!("User {} favorited publication {}",
                        actor.id_usuario, publication.id_publicacion);
                }

                true
            }
        };

        Ok(ToggleResult {
            es_favorito,
            total_favoritos: store.favorite_count(publication.id_publicacion)?,
        })
    }

    /// Whether `user` has favorited `publication`.
    pub fn exists<S: Gateway>(store: &mut S, user: i32, publication: i32)
    -> Result<bool, StoreError> {
        Ok(store.favorite_of(user, publication)?.is_some())
    }
}

#[derive(Debug, Fail)]
pub enum ToggleFavoriteError {
    #[fail(display = "Publicación no encontrada")]
    PublicationNotFound,
    #[fail(display = "{}", _0)]
    Notify(#[cause] NotifyError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for ToggleFavoriteError ;
    NotifyError => |e| ToggleFavoriteError::Notify(e),
    StoreError => |e| ToggleFavoriteError::Store(e),
}

impl ApiError for ToggleFavoriteError {
    fn status(&self) -> Status {
        match self {
            ToggleFavoriteError::PublicationNotFound => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            ToggleFavoriteError::PublicationNotFound =>
                Some("publication:not-found"),
            _ => None,
        }
    }
}
