//! Publications and their editorial lifecycle.
//!
//! State changes go through an explicit transition table
//! (`borrador → en_revision → {publicado, rechazado}`, with `rechazado`
//! re-entering `en_revision` on resubmission). Owners edit and submit,
//! reviewers decide, and every public read path is gated by the
//! visibility predicate.

use chrono::{NaiveDateTime, Utc};
use failure::Fail;
use log::debug;
use serde::Serialize;
use std::{io, ops::Deref};

use crate::{
    api::{self, ApiError, Status},
    db::{models as db, types::PublicationState},
    events::{self, NotifyError},
    files::{self, FileStore, Upload},
    images::{ImageResizer, ProcessImageError},
    permissions::{self, RequireRoleError, ReviewPublications},
    store::{Gateway, PublicationMeta, StoreError},
};

#[derive(Debug)]
pub struct Publication {
    data: db::Publication,
}

/// Full public view of a publication, as the read path exposes it.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id_publicacion: i32,
    pub id_usuario: i32,
    pub autor: String,
    pub autor_foto: Option<String>,
    pub titulo: String,
    pub resumen: String,
    pub contenido: String,
    pub referencias: String,
    pub tipo_publicacion: String,
    pub imagen_portada: Option<String>,
    pub fecha_publicacion: Option<NaiveDateTime>,
    pub total_favoritos: i64,
    pub total_comentarios: i64,
    /// Whether the viewing user has favorited this publication.
    pub es_favorito: bool,
}

impl Publication {
    pub(crate) fn from_db(data: db::Publication) -> Publication {
        Publication { data }
    }

    /// Find a publication by ID, ignoring soft-deleted rows.
    pub fn by_id<S: Gateway>(store: &mut S, id: i32)
    -> Result<Publication, FindPublicationError> {
        store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(FindPublicationError::NotFound)
            .map(Publication::from_db)
    }

    /// Whether this publication may be shown to the general public.
    pub fn is_publicly_visible(&self) -> bool {
        !self.data.eliminado
            && self.data.estado == PublicationState::Publicado
            && !self.data.es_privada
    }

    /// Full public view with joined author and category data.
    ///
    /// A viewer who owns the publication bypasses the privacy flag but
    /// still never sees deleted rows.
    pub fn get_public<S: Gateway>(
        store: &mut S,
        id: i32,
        viewer: Option<i32>,
    ) -> Result<PublicData, FindPublicationError> {
        let meta = store.publication_with_meta(id)?
            .ok_or(FindPublicationError::NotFound)?;
        let PublicationMeta { publication, autor, autor_foto, tipo_publicacion }
            = meta;

        let is_owner = viewer == Some(publication.id_usuario);
        let visible = !publication.eliminado
            && (is_owner
                || (publication.estado == PublicationState::Publicado
                    && !publication.es_privada));
        if !visible {
            return Err(FindPublicationError::NotFound);
        }

        let es_favorito = match viewer {
            Some(viewer) => store
                .favorite_of(viewer, publication.id_publicacion)?
                .is_some(),
            None => false,
        };

        Ok(PublicData {
            id_publicacion: publication.id_publicacion,
            id_usuario: publication.id_usuario,
            autor,
            autor_foto,
            titulo: publication.titulo.clone(),
            resumen: publication.resumen.clone(),
            contenido: publication.contenido.clone(),
            referencias: publication.referencias.clone(),
            tipo_publicacion,
            imagen_portada: publication.imagen_portada.clone(),
            fecha_publicacion: publication.fecha_publicacion,
            total_favoritos: store.favorite_count(publication.id_publicacion)?,
            total_comentarios: store.comment_count(publication.id_publicacion)?,
            es_favorito,
        })
    }

    /// Create a new publication, as a draft or directly submitted for
    /// review. Drafts and fresh submissions are always private.
    pub fn create<S, F, R>(
        store: &mut S,
        actor: &db::User,
        payload: &api::NewPublication,
        cover: Option<&Upload>,
        file_store: &F,
        resizer: &R,
    ) -> Result<Publication, CreatePublicationError>
    where
        S: Gateway,
        F: FileStore,
        R: ImageResizer,
    {
        let id_tipo = payload.validate()?;
        if !store.category_exists(id_tipo)? {
            return Err(CreatePublicationError::CategoryNotFound);
        }

        let estado = if payload.es_borrador {
            PublicationState::Borrador
        } else {
            PublicationState::EnRevision
        };

        let row = store.insert_publication(&db::NewPublication {
            id_usuario: actor.id_usuario,
            id_tipo,
            titulo: &payload.titulo,
            resumen: &payload.resumen,
            contenido: &payload.contenido,
            referencias: &payload.referencias,
            estado,
            imagen_portada: None,
            es_privada: true,
            fecha_creacion: Utc::now().naive_utc(),
        })?;

        let row = match cover {
            Some(upload) => store_cover(
                store, file_store, resizer, &row, upload)?,
            None => row,
        };

        debug!("User {} created publication {} as {}",
            actor.id_usuario, row.id_publicacion, estado);

        Ok(Publication::from_db(row))
    }

    /// Create or update a draft under a client-reserved ID.
    ///
    /// IDs above the current maximum insert a new row under that exact ID;
    /// anything else must match an existing draft owned by the caller.
    /// Returns the draft and whether a row was created.
    pub fn upsert_draft<S, F, R>(
        store: &mut S,
        actor: &db::User,
        payload: &api::DraftUpsert,
        cover: Option<&Upload>,
        file_store: &F,
        resizer: &R,
    ) -> Result<(Publication, bool), UpsertDraftError>
    where
        S: Gateway,
        F: FileStore,
        R: ImageResizer,
    {
        let (id, id_tipo) = payload.validate()?;
        if !store.category_exists(id_tipo)? {
            return Err(UpsertDraftError::CategoryNotFound);
        }

        let max = store.max_publication_id()?.unwrap_or(0);

        if id > max {
            let row = store.insert_publication_with_id(id, &db::NewPublication {
                id_usuario: actor.id_usuario,
                id_tipo,
                titulo: &payload.titulo,
                resumen: &payload.resumen,
                contenido: &payload.contenido,
                referencias: &payload.referencias,
                estado: PublicationState::Borrador,
                imagen_portada: None,
                es_privada: true,
                fecha_creacion: Utc::now().naive_utc(),
            })?;

            let row = match cover {
                Some(upload) => store_cover(
                    store, file_store, resizer, &row, upload)?,
                None => row,
            };

            debug!("User {} reserved draft {}", actor.id_usuario, id);

            return Ok((Publication::from_db(row), true));
        }

        let existing = store.publication_by_id(id)?
            .filter(|p| p.id_usuario == actor.id_usuario
                && p.estado == PublicationState::Borrador
                && !p.eliminado)
            .ok_or(UpsertDraftError::NotFound)?;

        let new_cover = cover
            .map(|upload| prepare_cover(file_store, resizer, &existing, upload))
            .transpose()?;

        let change = db::PublicationChange {
            id_tipo: Some(id_tipo),
            titulo: Some(&payload.titulo),
            resumen: Some(&payload.resumen),
            contenido: Some(&payload.contenido),
            referencias: Some(&payload.referencias),
            imagen_portada: new_cover.as_ref()
                .map(|name| Some(name.as_str())),
            ..db::PublicationChange::default()
        };
        store.update_publication(id, &change)?;

        if let Some(new_name) = new_cover {
            delete_replaced_cover(file_store, &existing, &new_name);
        }

        let row = store.publication_by_id(id)?
            .ok_or(UpsertDraftError::NotFound)?;

        Ok((Publication::from_db(row), false))
    }

    /// Submit an owned draft (or a rejected publication) for review.
    ///
    /// A cover image is required: either already stored or supplied with
    /// this call. The state change and field updates commit atomically.
    pub fn submit_for_review<S, F, R>(
        store: &mut S,
        actor: &db::User,
        id: i32,
        payload: &api::PublicationUpdate,
        cover: Option<&Upload>,
        file_store: &F,
        resizer: &R,
    ) -> Result<Publication, SubmitForReviewError>
    where
        S: Gateway,
        F: FileStore,
        R: ImageResizer,
    {
        let existing = store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(SubmitForReviewError::NotFound)?;
        if existing.id_usuario != actor.id_usuario {
            return Err(SubmitForReviewError::Forbidden);
        }

        require_transition(existing.estado, PublicationState::EnRevision)
            .map_err(SubmitForReviewError::Transition)?;

        if cover.is_none() && existing.imagen_portada.is_none() {
            return Err(SubmitForReviewError::CoverRequired);
        }

        let row = store.transaction(
            |store| -> Result<db::Publication, SubmitForReviewError> {
                let new_cover = cover
                    .map(|upload| prepare_cover(
                        file_store, resizer, &existing, upload))
                    .transpose()?;

                let change = db::PublicationChange {
                    titulo: payload.titulo.as_deref(),
                    resumen: payload.resumen.as_deref(),
                    contenido: payload.contenido.as_deref(),
                    referencias: payload.referencias.as_deref(),
                    estado: Some(PublicationState::EnRevision),
                    es_privada: Some(true),
                    imagen_portada: new_cover.as_ref()
                        .map(|name| Some(name.as_str())),
                    ..db::PublicationChange::default()
                };
                store.update_publication(id, &change)?;

                if let Some(new_name) = new_cover {
                    delete_replaced_cover(file_store, &existing, &new_name);
                }

                store.publication_by_id(id)?
                    .ok_or(SubmitForReviewError::NotFound)
            })?;

        debug!("Publication {} submitted for review", id);

        Ok(Publication::from_db(row))
    }

    /// General owner edit of a publication.
    ///
    /// A requested state change must follow the transition table, and the
    /// terminal review states can only be entered through
    /// [`Publication::review`].
    pub fn update<S, F, R>(
        store: &mut S,
        actor: &db::User,
        id: i32,
        payload: &api::PublicationUpdate,
        cover: Option<&Upload>,
        file_store: &F,
        resizer: &R,
    ) -> Result<Publication, UpdatePublicationError>
    where
        S: Gateway,
        F: FileStore,
        R: ImageResizer,
    {
        let existing = store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(UpdatePublicationError::NotFound)?;
        if existing.id_usuario != actor.id_usuario {
            return Err(UpdatePublicationError::Forbidden);
        }

        let estado = match payload.estado {
            Some(target) if target != existing.estado => {
                require_transition(existing.estado, target)
                    .map_err(UpdatePublicationError::Transition)?;
                // Review verdicts are reserved for reviewers.
                if target == PublicationState::Publicado
                    || target == PublicationState::Rechazado
                {
                    return Err(UpdatePublicationError::Transition(
                        InvalidTransitionError {
                            from: existing.estado,
                            to: target,
                        }));
                }
                Some(target)
            }
            _ => None,
        };

        if let Some(id_tipo) = payload.id_tipo {
            if !store.category_exists(id_tipo)? {
                return Err(UpdatePublicationError::CategoryNotFound);
            }
        }

        let new_cover = cover
            .map(|upload| prepare_cover(file_store, resizer, &existing, upload))
            .transpose()?;

        let change = db::PublicationChange {
            id_tipo: payload.id_tipo,
            titulo: payload.titulo.as_deref(),
            resumen: payload.resumen.as_deref(),
            contenido: payload.contenido.as_deref(),
            referencias: payload.referencias.as_deref(),
            estado,
            es_privada: payload.es_privada,
            imagen_portada: new_cover.as_ref()
                .map(|name| Some(name.as_str())),
            ..db::PublicationChange::default()
        };
        store.update_publication(id, &change)?;

        if let Some(new_name) = new_cover {
            delete_replaced_cover(file_store, &existing, &new_name);
        }

        let row = store.publication_by_id(id)?
            .ok_or(UpdatePublicationError::NotFound)?;

        Ok(Publication::from_db(row))
    }

    /// Decide on a pending submission. Reviewer must be a moderator or an
    /// administrator. Commits the verdict together with the owner's
    /// notification.
    pub fn review<S: Gateway>(
        store: &mut S,
        reviewer: &db::User,
        id: i32,
        decision: &api::ReviewDecision,
    ) -> Result<Publication, ReviewError> {
        permissions::require::<ReviewPublications>(reviewer.rol)?;

        let existing = store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(ReviewError::NotFound)?;

        let target = if decision.aprobada {
            PublicationState::Publicado
        } else {
            PublicationState::Rechazado
        };
        require_transition(existing.estado, target)
            .map_err(ReviewError::Transition)?;

        let row = store.transaction(
            |store| -> Result<db::Publication, ReviewError> {
                let fecha_publicacion = if decision.aprobada {
                    Some(Utc::now().naive_utc())
                } else {
                    None
                };

                let change = db::PublicationChange {
                    estado: Some(target),
                    comentario_revision: Some(
                        decision.comentario_revision.as_deref()),
                    revisor_id: Some(Some(reviewer.id_usuario)),
                    fecha_publicacion: Some(fecha_publicacion),
                    // Publishing makes the work world-readable.
                    es_privada: if decision.aprobada {
                        Some(false)
                    } else {
                        None
                    },
                    ..db::PublicationChange::default()
                };
                store.update_publication(id, &change)?;

                events::notify_review_decision(
                    store, &existing, reviewer, decision.aprobada)?;

                store.publication_by_id(id)?
                    .ok_or(ReviewError::NotFound)
            })?;

        debug!("Publication {} {} by reviewer {}",
            id, target, reviewer.id_usuario);

        Ok(Publication::from_db(row))
    }

    /// Soft-delete an owned publication. The row and its files remain.
    pub fn soft_delete<S: Gateway>(store: &mut S, actor: &db::User, id: i32)
    -> Result<(), DeletePublicationError> {
        let existing = store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(DeletePublicationError::NotFound)?;
        if existing.id_usuario != actor.id_usuario {
            return Err(DeletePublicationError::Forbidden);
        }

        let change = db::PublicationChange {
            eliminado: Some(true),
            fecha_eliminacion: Some(Some(Utc::now().naive_utc())),
            ..db::PublicationChange::default()
        };
        store.update_publication(id, &change)?;

        debug!("Publication {} soft-deleted by owner", id);

        Ok(())
    }

    /// Attach a gallery image to an owned publication, placing it at the
    /// end of the gallery.
    pub fn add_image<S, F, R>(
        store: &mut S,
        actor: &db::User,
        id: i32,
        upload: &Upload,
        descripcion: &str,
        file_store: &F,
        resizer: &R,
    ) -> Result<db::PublicationImage, AddImageError>
    where
        S: Gateway,
        F: FileStore,
        R: ImageResizer,
    {
        let existing = store.publication_by_id(id)?
            .filter(|p| !p.eliminado)
            .ok_or(AddImageError::NotFound)?;
        if existing.id_usuario != actor.id_usuario {
            return Err(AddImageError::Forbidden);
        }

        let bytes = resizer.normalize(&upload.bytes)?;
        // Uploads are re-encoded as JPEG regardless of source format.
        let name = files::gallery_name();

        store.transaction(|store| -> Result<db::PublicationImage, AddImageError> {
            let orden = store.max_image_order(id)?.unwrap_or(0) + 1;

            file_store.save(&name, &bytes)?;

            store.insert_image(&db::NewPublicationImage {
                id_publicacion: id,
                url: &name,
                descripcion,
                orden,
            }).map_err(Into::into)
        })
    }

    /// Gallery of a publication, in display order.
    pub fn images<S: Gateway>(store: &mut S, id: i32)
    -> Result<Vec<db::PublicationImage>, StoreError> {
        store.images_of_publication(id)
    }

    /// Most recently published, publicly visible works.
    pub fn recent<S: Gateway>(store: &mut S, limit: i64)
    -> Result<Vec<Publication>, StoreError> {
        Ok(store.recent_published(limit)?
            .into_iter()
            .map(Publication::from_db)
            .collect())
    }

    /// All of a user's publications, newest first. Owner view: ignores
    /// privacy and state, skips deleted rows.
    pub fn all_of<S: Gateway>(store: &mut S, user: i32)
    -> Result<Vec<Publication>, StoreError> {
        Ok(store.publications_of_user(user)?
            .into_iter()
            .map(Publication::from_db)
            .collect())
    }

    /// Submissions awaiting review, newest first. Reviewer-only.
    pub fn pending<S: Gateway>(store: &mut S, reviewer: &db::User)
    -> Result<Vec<Publication>, PendingReviewError> {
        permissions::require::<ReviewPublications>(reviewer.rol)?;

        Ok(store.pending_review()?
            .into_iter()
            .map(Publication::from_db)
            .collect())
    }

    /// The category catalogue.
    pub fn categories<S: Gateway>(store: &mut S)
    -> Result<Vec<db::PublicationType>, StoreError> {
        store.categories()
    }

    /// Unwrap this wrapper into the raw database row.
    pub fn into_db(self) -> db::Publication {
        self.data
    }
}

impl Deref for Publication {
    type Target = db::Publication;

    fn deref(&self) -> &db::Publication {
        &self.data
    }
}

/// Normalize and store a new cover image, returning its stored name.
fn prepare_cover<F, R>(
    file_store: &F,
    resizer: &R,
    publication: &db::Publication,
    upload: &Upload,
) -> Result<String, StoreCoverError>
where
    F: FileStore,
    R: ImageResizer,
{
    let bytes = resizer.normalize(&upload.bytes)?;
    let name = files::cover_name(publication.id_publicacion);
    file_store.save(&name, &bytes)?;

    Ok(name)
}

/// Remove a cover file superseded by `new_name`, best-effort.
fn delete_replaced_cover<F: FileStore>(
    file_store: &F,
    publication: &db::Publication,
    new_name: &str,
) {
    if let Some(ref old) = publication.imagen_portada {
        if old != new_name {
            file_store.delete_quietly(old);
        }
    }
}

/// Store a cover for a freshly inserted row and record it on the row.
fn store_cover<S, F, R>(
    store: &mut S,
    file_store: &F,
    resizer: &R,
    row: &db::Publication,
    upload: &Upload,
) -> Result<db::Publication, StoreCoverError>
where
    S: Gateway,
    F: FileStore,
    R: ImageResizer,
{
    let name = prepare_cover(file_store, resizer, row, upload)?;

    let change = db::PublicationChange {
        imagen_portada: Some(Some(&name)),
        ..db::PublicationChange::default()
    };
    store.update_publication(row.id_publicacion, &change)?;

    let mut row = row.clone();
    row.imagen_portada = Some(name);

    Ok(row)
}

/// Check a requested state change against the transition table.
fn require_transition(from: PublicationState, to: PublicationState)
-> Result<(), InvalidTransitionError> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(InvalidTransitionError { from, to })
    }
}

/// A state change not present in the transition table.
#[derive(Debug, Fail)]
#[fail(display = "No se puede pasar de {} a {}", from, to)]
pub struct InvalidTransitionError {
    pub from: PublicationState,
    pub to: PublicationState,
}

impl ApiError for InvalidTransitionError {
    fn status(&self) -> Status {
        Status::Conflict
    }

    fn code(&self) -> Option<&str> {
        Some("publication:invalid-transition")
    }
}

/// Failure while normalizing or storing an uploaded cover.
#[derive(Debug, Fail)]
pub enum StoreCoverError {
    #[fail(display = "{}", _0)]
    Image(#[cause] ProcessImageError),
    #[fail(display = "{}", _0)]
    System(#[cause] io::Error),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for StoreCoverError ;
    ProcessImageError => |e| StoreCoverError::Image(e),
    io::Error => |e| StoreCoverError::System(e),
    StoreError => |e| StoreCoverError::Store(e),
}

#[derive(Debug, Fail)]
pub enum FindPublicationError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for FindPublicationError ;
    StoreError => |e| FindPublicationError::Store(e),
}

impl ApiError for FindPublicationError {
    fn status(&self) -> Status {
        match self {
            FindPublicationError::NotFound => Status::NotFound,
            FindPublicationError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            FindPublicationError::NotFound => Some("publication:not-found"),
            FindPublicationError::Store(_) => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum CreatePublicationError {
    #[fail(display = "{}", _0)]
    Invalid(#[cause] api::ValidationError),
    /// `id_tipo` does not reference an existing category.
    #[fail(display = "El tipo de publicación no existe")]
    CategoryNotFound,
    #[fail(display = "{}", _0)]
    Cover(#[cause] StoreCoverError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for CreatePublicationError ;
    api::ValidationError => |e| CreatePublicationError::Invalid(e),
    StoreCoverError => |e| CreatePublicationError::Cover(e),
    StoreError => |e| CreatePublicationError::Store(e),
}

impl ApiError for CreatePublicationError {
    fn status(&self) -> Status {
        match self {
            CreatePublicationError::Invalid(_) => Status::BadRequest,
            CreatePublicationError::CategoryNotFound => Status::BadRequest,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            CreatePublicationError::Invalid(_) => Some("publication:invalid"),
            CreatePublicationError::CategoryNotFound =>
                Some("publication:category-not-found"),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum UpsertDraftError {
    #[fail(display = "{}", _0)]
    Invalid(#[cause] api::ValidationError),
    #[fail(display = "El tipo de publicación no existe")]
    CategoryNotFound,
    /// ID is within the existing range but matches no draft owned by
    /// the caller.
    #[fail(display = "Borrador no encontrado o no pertenece al usuario")]
    NotFound,
    #[fail(display = "{}", _0)]
    Cover(#[cause] StoreCoverError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for UpsertDraftError ;
    api::ValidationError => |e| UpsertDraftError::Invalid(e),
    StoreCoverError => |e| UpsertDraftError::Cover(e),
    StoreError => |e| UpsertDraftError::Store(e),
}

impl ApiError for UpsertDraftError {
    fn status(&self) -> Status {
        match self {
            UpsertDraftError::Invalid(_) => Status::BadRequest,
            UpsertDraftError::CategoryNotFound => Status::BadRequest,
            UpsertDraftError::NotFound => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            UpsertDraftError::Invalid(_) => Some("publication:invalid"),
            UpsertDraftError::CategoryNotFound =>
                Some("publication:category-not-found"),
            UpsertDraftError::NotFound => Some("draft:not-found"),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum SubmitForReviewError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "No tienes permiso para modificar esta publicación")]
    Forbidden,
    /// Submissions must carry a cover image, stored or supplied.
    #[fail(display = "La imagen de portada es obligatoria")]
    CoverRequired,
    #[fail(display = "{}", _0)]
    Transition(#[cause] InvalidTransitionError),
    #[fail(display = "{}", _0)]
    Cover(#[cause] StoreCoverError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for SubmitForReviewError ;
    StoreCoverError => |e| SubmitForReviewError::Cover(e),
    StoreError => |e| SubmitForReviewError::Store(e),
}

impl ApiError for SubmitForReviewError {
    fn status(&self) -> Status {
        match self {
            SubmitForReviewError::NotFound => Status::NotFound,
            SubmitForReviewError::Forbidden => Status::Forbidden,
            SubmitForReviewError::CoverRequired => Status::BadRequest,
            SubmitForReviewError::Transition(e) => e.status(),
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            SubmitForReviewError::NotFound => Some("publication:not-found"),
            SubmitForReviewError::Forbidden => Some("publication:forbidden"),
            SubmitForReviewError::CoverRequired =>
                Some("publication:cover-required"),
            SubmitForReviewError::Transition(e) => e.code(),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum UpdatePublicationError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "No tienes permiso para modificar esta publicación")]
    Forbidden,
    #[fail(display = "El tipo de publicación no existe")]
    CategoryNotFound,
    #[fail(display = "{}", _0)]
    Transition(#[cause] InvalidTransitionError),
    #[fail(display = "{}", _0)]
    Cover(#[cause] StoreCoverError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for UpdatePublicationError ;
    StoreCoverError => |e| UpdatePublicationError::Cover(e),
    StoreError => |e| UpdatePublicationError::Store(e),
}

impl ApiError for UpdatePublicationError {
    fn status(&self) -> Status {
        match self {
            UpdatePublicationError::NotFound => Status::NotFound,
            UpdatePublicationError::Forbidden => Status::Forbidden,
            UpdatePublicationError::CategoryNotFound => Status::BadRequest,
            UpdatePublicationError::Transition(e) => e.status(),
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            UpdatePublicationError::NotFound => Some("publication:not-found"),
            UpdatePublicationError::Forbidden => Some("publication:forbidden"),
            UpdatePublicationError::CategoryNotFound =>
                Some("publication:category-not-found"),
            UpdatePublicationError::Transition(e) => e.code(),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum ReviewError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "{}", _0)]
    Role(#[cause] RequireRoleError),
    #[fail(display = "{}", _0)]
    Transition(#[cause] InvalidTransitionError),
    #[fail(display = "{}", _0)]
    Notify(#[cause] NotifyError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for ReviewError ;
    RequireRoleError => |e| ReviewError::Role(e),
    NotifyError => |e| ReviewError::Notify(e),
    StoreError => |e| ReviewError::Store(e),
}

impl ApiError for ReviewError {
    fn status(&self) -> Status {
        match self {
            ReviewError::NotFound => Status::NotFound,
            ReviewError::Role(e) => e.status(),
            ReviewError::Transition(e) => e.status(),
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            ReviewError::NotFound => Some("publication:not-found"),
            ReviewError::Role(e) => e.code(),
            ReviewError::Transition(e) => e.code(),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum DeletePublicationError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "No tienes permiso para eliminar esta publicación")]
    Forbidden,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for DeletePublicationError ;
    StoreError => |e| DeletePublicationError::Store(e),
}

impl ApiError for DeletePublicationError {
    fn status(&self) -> Status {
        match self {
            DeletePublicationError::NotFound => Status::NotFound,
            DeletePublicationError::Forbidden => Status::Forbidden,
            DeletePublicationError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            DeletePublicationError::NotFound => Some("publication:not-found"),
            DeletePublicationError::Forbidden => Some("publication:forbidden"),
            DeletePublicationError::Store(_) => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum AddImageError {
    #[fail(display = "Publicación no encontrada")]
    NotFound,
    #[fail(display = "No tienes permiso para modificar esta publicación")]
    Forbidden,
    #[fail(display = "{}", _0)]
    Image(#[cause] ProcessImageError),
    #[fail(display = "{}", _0)]
    System(#[cause] io::Error),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for AddImageError ;
    ProcessImageError => |e| AddImageError::Image(e),
    io::Error => |e| AddImageError::System(e),
    StoreError => |e| AddImageError::Store(e),
}

impl ApiError for AddImageError {
    fn status(&self) -> Status {
        match self {
            AddImageError::NotFound => Status::NotFound,
            AddImageError::Forbidden => Status::Forbidden,
            AddImageError::Image(_) => Status::BadRequest,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            AddImageError::NotFound => Some("publication:not-found"),
            AddImageError::Forbidden => Some("publication:forbidden"),
            AddImageError::Image(_) => Some("image:invalid"),
            _ => None,
        }
    }
}

#[derive(Debug, Fail)]
pub enum PendingReviewError {
    #[fail(display = "{}", _0)]
    Role(#[cause] RequireRoleError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for PendingReviewError ;
    RequireRoleError => |e| PendingReviewError::Role(e),
    StoreError => |e| PendingReviewError::Store(e),
}

impl ApiError for PendingReviewError {
    fn status(&self) -> Status {
        match self {
            PendingReviewError::Role(e) => e.status(),
            PendingReviewError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            PendingReviewError::Role(e) => e.code(),
            PendingReviewError::Store(_) => None,
        }
    }
}
