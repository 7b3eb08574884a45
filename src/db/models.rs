use chrono::NaiveDateTime;

use super::{
    schema::*,
    types::{NotificationKind, PublicationState, UserRole},
};

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = usuarios, primary_key(id_usuario))]
pub struct User {
    pub id_usuario: i32,
    /// User's display name. This is visible to other users.
    pub nombre: String,
    /// User's email address, used for identification.
    pub correo: String,
    /// Hash of the user's password. Never exposed outside `db`.
    pub contrasena: String,
    pub rol: UserRole,
    /// Title or affiliation shown on the public profile.
    pub nombramiento: String,
    pub foto_perfil: Option<String>,
    pub fecha_creacion: NaiveDateTime,
    pub ultimo_acceso: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = usuarios)]
pub struct NewUser<'a> {
    pub nombre: &'a str,
    pub correo: &'a str,
    pub contrasena: &'a str,
    pub rol: UserRole,
    pub nombramiento: &'a str,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = publicaciones, primary_key(id_publicacion))]
pub struct Publication {
    pub id_publicacion: i32,
    /// Owner of this publication. Immutable once created.
    pub id_usuario: i32,
    /// Category this publication belongs to.
    pub id_tipo: i32,
    pub titulo: String,
    pub resumen: String,
    /// Rich-text HTML body.
    pub contenido: String,
    /// Bibliographic references, free text. May be empty.
    pub referencias: String,
    pub estado: PublicationState,
    pub imagen_portada: Option<String>,
    pub es_privada: bool,
    /// Soft-delete flag. Rows are never physically removed.
    pub eliminado: bool,
    pub comentario_revision: Option<String>,
    pub revisor_id: Option<i32>,
    pub fecha_creacion: NaiveDateTime,
    /// Set exactly when the state transitions to `publicado`.
    pub fecha_publicacion: Option<NaiveDateTime>,
    pub fecha_eliminacion: Option<NaiveDateTime>,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = publicaciones)]
pub struct NewPublication<'a> {
    pub id_usuario: i32,
    pub id_tipo: i32,
    pub titulo: &'a str,
    pub resumen: &'a str,
    pub contenido: &'a str,
    pub referencias: &'a str,
    pub estado: PublicationState,
    pub imagen_portada: Option<&'a str>,
    pub es_privada: bool,
    pub fecha_creacion: NaiveDateTime,
}

/// Partial update of a publication row.
///
/// `None` leaves a column untouched; `Some(None)` writes NULL into
/// a nullable column.
#[derive(AsChangeset, Clone, Debug, Default)]
#[diesel(table_name = publicaciones, treat_none_as_null = false)]
pub struct PublicationChange<'a> {
    pub id_tipo: Option<i32>,
    pub titulo: Option<&'a str>,
    pub resumen: Option<&'a str>,
    pub contenido: Option<&'a str>,
    pub referencias: Option<&'a str>,
    pub estado: Option<PublicationState>,
    pub imagen_portada: Option<Option<&'a str>>,
    pub es_privada: Option<bool>,
    pub eliminado: Option<bool>,
    pub comentario_revision: Option<Option<&'a str>>,
    pub revisor_id: Option<Option<i32>>,
    pub fecha_publicacion: Option<Option<NaiveDateTime>>,
    pub fecha_eliminacion: Option<Option<NaiveDateTime>>,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = comentarios, primary_key(id_comentario))]
pub struct Comment {
    pub id_comentario: i32,
    pub id_publicacion: i32,
    /// Author of the comment. Only they may delete it.
    pub id_usuario: i32,
    pub contenido: String,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = comentarios)]
pub struct NewComment<'a> {
    pub id_publicacion: i32,
    pub id_usuario: i32,
    pub contenido: &'a str,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Identifiable, Queryable)]
#[diesel(table_name = favoritos, primary_key(id_favorito))]
pub struct Favorite {
    pub id_favorito: i32,
    pub id_usuario: i32,
    pub id_publicacion: i32,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = favoritos)]
pub struct NewFavorite {
    pub id_usuario: i32,
    pub id_publicacion: i32,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = notificaciones, primary_key(id_notificacion))]
pub struct Notification {
    pub id_notificacion: i32,
    /// Recipient of this notification.
    pub id_usuario: i32,
    /// User whose action triggered it, if any.
    pub id_origen: Option<i32>,
    pub tipo: NotificationKind,
    pub id_referencia: i32,
    pub tipo_referencia: String,
    /// Rendered, human-readable message. Composed server-side.
    pub contenido: String,
    pub leida: bool,
    /// Whether this notification should also go out by email. The flag is
    /// persisted only; delivery is an external concern.
    pub notificar_correo: bool,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = notificaciones)]
pub struct NewNotification<'a> {
    pub id_usuario: i32,
    pub id_origen: Option<i32>,
    pub tipo: NotificationKind,
    pub id_referencia: i32,
    pub tipo_referencia: &'a str,
    pub contenido: &'a str,
    pub notificar_correo: bool,
    pub fecha_creacion: NaiveDateTime,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = multimedia_publicacion, primary_key(id_imagen))]
pub struct PublicationImage {
    pub id_imagen: i32,
    pub id_publicacion: i32,
    pub url: String,
    pub descripcion: String,
    /// Position within the publication's gallery, assigned as max + 1.
    pub orden: i32,
}

#[derive(Clone, Copy, Debug, Insertable)]
#[diesel(table_name = multimedia_publicacion)]
pub struct NewPublicationImage<'a> {
    pub id_publicacion: i32,
    pub url: &'a str,
    pub descripcion: &'a str,
    pub orden: i32,
}

#[derive(Clone, Debug, Identifiable, Queryable)]
#[diesel(table_name = tipos_publicacion, primary_key(id_tipo))]
pub struct PublicationType {
    pub id_tipo: i32,
    pub nombre: String,
    pub descripcion: String,
}
