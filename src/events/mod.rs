//! Notifications.
//!
//! Events describe things that happened; the dispatcher turns them into
//! persisted notification rows. A user is never notified about their own
//! actions, and notifications for unknown recipients are rejected rather
//! than silently dropped.

use chrono::Utc;
use failure::Fail;
use log::debug;
use serde::Serialize;

use crate::{
    api::{ApiError, NotificationQuery, Status},
    db::models as db,
    store::{Gateway, StoreError},
};

mod events;

pub use self::events::{Event, REF_PUBLICATION};

/// Notify a user that an event has happened.
///
/// Returns `Ok(None)` without writing anything when the event's origin is
/// the recipient themselves.
pub fn notify<S: Gateway>(
    store: &mut S,
    recipient: i32,
    origin: Option<i32>,
    event: &Event,
    reference: i32,
) -> Result<Option<db::Notification>, NotifyError> {
    if origin == Some(recipient) {
        debug!("Suppressing self-notification for user {}", recipient);
        return Ok(None);
    }

    if store.user_by_id(recipient)?.is_none() {
        return Err(NotifyError::UnknownReceiver(recipient));
    }

    let row = store.insert_notification(&db::NewNotification {
        id_usuario: recipient,
        id_origen: origin,
        tipo: event.kind(),
        id_referencia: reference,
        tipo_referencia: REF_PUBLICATION,
        contenido: &event.message(),
        notificar_correo: true,
        fecha_creacion: Utc::now().naive_utc(),
    })?;

    debug!("Notified user {} of {:?}", recipient, event.kind());

    Ok(Some(row))
}

/// Notify a publication's owner that `actor` commented on it.
pub fn notify_new_comment<S: Gateway>(
    store: &mut S,
    publication: &db::Publication,
    actor: &db::User,
) -> Result<Option<db::Notification>, NotifyError> {
    notify(
        store,
        publication.id_usuario,
        Some(actor.id_usuario),
        &Event::NewComment {
            autor: actor.nombre.clone(),
            titulo: publication.titulo.clone(),
        },
        publication.id_publicacion,
    )
}

/// Notify a publication's owner that `actor` marked it as a favorite.
pub fn notify_new_favorite<S: Gateway>(
    store: &mut S,
    publication: &db::Publication,
    actor: &db::User,
) -> Result<Option<db::Notification>, NotifyError> {
    notify(
        store,
        publication.id_usuario,
        Some(actor.id_usuario),
        &Event::NewFavorite {
            autor: actor.nombre.clone(),
            titulo: publication.titulo.clone(),
        },
        publication.id_publicacion,
    )
}

/// Notify a publication's owner of the review verdict.
pub fn notify_review_decision<S: Gateway>(
    store: &mut S,
    publication: &db::Publication,
    reviewer: &db::User,
    aprobada: bool,
) -> Result<Option<db::Notification>, NotifyError> {
    notify(
        store,
        publication.id_usuario,
        Some(reviewer.id_usuario),
        &Event::ReviewDecision {
            revisor: reviewer.nombre.clone(),
            titulo: publication.titulo.clone(),
            aprobada,
        },
        publication.id_publicacion,
    )
}

/// Mark one of `user`'s notifications as read.
pub fn mark_read<S: Gateway>(store: &mut S, user: i32, notification: i32)
-> Result<(), MarkReadError> {
    match store.set_notification_read(notification, user)? {
        0 => Err(MarkReadError::NotFound),
        _ => Ok(()),
    }
}

/// Mark all of `user`'s notifications as read; returns how many were
/// still unread.
pub fn mark_all_read<S: Gateway>(store: &mut S, user: i32)
-> Result<usize, StoreError> {
    store.mark_all_notifications_read(user)
}

/// Number of unread notifications, for badges.
pub fn unread_count<S: Gateway>(store: &mut S, user: i32)
-> Result<i64, StoreError> {
    store.notification_count(user, Some(false))
}

/// A page of a user's notifications.
pub fn list<S: Gateway>(store: &mut S, user: i32, query: &NotificationQuery)
-> Result<NotificationList, StoreError> {
    let rows = store.notifications_of_user(
        user, query.leidas, query.limit, query.offset())?;
    let total = store.notification_count(user, query.leidas)?;
    let no_leidas = store.notification_count(user, Some(false))?;

    Ok(NotificationList {
        notificaciones: rows.into_iter()
            .map(|row| NotificationData {
                id_notificacion: row.notification.id_notificacion,
                tipo: row.notification.tipo.as_str().to_string(),
                contenido: row.notification.contenido,
                leida: row.notification.leida,
                id_referencia: row.notification.id_referencia,
                tipo_referencia: row.notification.tipo_referencia,
                fecha_creacion: row.notification.fecha_creacion.to_string(),
                origen_nombre: row.origen_nombre,
                origen_foto: row.origen_foto,
            })
            .collect(),
        total,
        no_leidas,
        page: query.page.max(1),
        limit: query.limit,
    })
}

#[derive(Debug, Serialize)]
pub struct NotificationData {
    pub id_notificacion: i32,
    pub tipo: String,
    pub contenido: String,
    pub leida: bool,
    pub id_referencia: i32,
    pub tipo_referencia: String,
    pub fecha_creacion: String,
    pub origen_nombre: Option<String>,
    pub origen_foto: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NotificationList {
    pub notificaciones: Vec<NotificationData>,
    pub total: i64,
    pub no_leidas: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Fail)]
pub enum NotifyError {
    /// Recipient does not exist.
    #[fail(display = "No notification receiver with ID {}", _0)]
    UnknownReceiver(i32),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for NotifyError ;
    StoreError => |e| NotifyError::Store(e),
}

#[derive(Debug, Fail)]
pub enum MarkReadError {
    /// No such notification, or it belongs to someone else.
    #[fail(display = "Notificación no encontrada")]
    NotFound,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for MarkReadError ;
    StoreError => |e| MarkReadError::Store(e),
}

impl ApiError for MarkReadError {
    fn status(&self) -> Status {
        match self {
            MarkReadError::NotFound => Status::NotFound,
            MarkReadError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            MarkReadError::NotFound => Some("notification:not-found"),
            MarkReadError::Store(_) => None,
        }
    }
}
