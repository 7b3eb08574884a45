//! Operation payloads and the error taxonomy.
//!
//! Input structs here are deserialized from whatever transport sits in
//! front of this crate, validated up front, and handed to the models.

use failure::Fail;
use serde::{Deserialize, Serialize};

pub mod error;

pub use self::error::{ApiError, Error, ErrorResponse, Status};

/// A successful operation's envelope.
#[derive(Debug, Serialize)]
pub struct Payload<T> {
    pub mensaje: String,
    pub datos: T,
}

impl<T> Payload<T> {
    pub fn new<S: Into<String>>(mensaje: S, datos: T) -> Payload<T> {
        Payload { mensaje: mensaje.into(), datos }
    }
}

/// Data for creating a new publication.
#[derive(Debug, Deserialize)]
pub struct NewPublication {
    pub titulo: String,
    pub resumen: String,
    pub contenido: String,
    #[serde(default)]
    pub referencias: String,
    pub id_tipo: Option<i32>,
    /// When set the publication is stored as a draft instead of being
    /// submitted for review.
    #[serde(default)]
    pub es_borrador: bool,
}

impl NewPublication {
    pub fn validate(&self) -> Result<i32, ValidationError> {
        match self.id_tipo {
            Some(id) => Ok(id),
            None => Err(ValidationError::new(
                "El campo id_tipo es obligatorio.")),
        }
    }
}

/// Data for creating or updating a draft under a client-reserved ID.
#[derive(Debug, Deserialize)]
pub struct DraftUpsert {
    pub id_publicacion: Option<i32>,
    pub titulo: String,
    pub resumen: String,
    pub contenido: String,
    #[serde(default)]
    pub referencias: String,
    pub id_tipo: Option<i32>,
}

impl DraftUpsert {
    pub fn validate(&self) -> Result<(i32, i32), ValidationError> {
        let id = self.id_publicacion.ok_or_else(|| ValidationError::new(
            "El ID de la publicación es obligatorio para guardar o \
             actualizar un borrador."))?;
        let tipo = self.id_tipo.ok_or_else(|| ValidationError::new(
            "El campo id_tipo es obligatorio."))?;

        Ok((id, tipo))
    }
}

/// Partial update of an owned publication.
#[derive(Debug, Default, Deserialize)]
pub struct PublicationUpdate {
    pub titulo: Option<String>,
    pub resumen: Option<String>,
    pub contenido: Option<String>,
    pub referencias: Option<String>,
    pub id_tipo: Option<i32>,
    pub es_privada: Option<bool>,
    /// Requested state change; validated against the transition table.
    pub estado: Option<crate::db::types::PublicationState>,
}

/// A reviewer's verdict on a pending submission.
#[derive(Debug, Deserialize)]
pub struct ReviewDecision {
    pub aprobada: bool,
    #[serde(default)]
    pub comentario_revision: Option<String>,
}

/// Data for posting a comment.
#[derive(Debug, Deserialize)]
pub struct NewComment {
    pub id_publicacion: Option<i32>,
    pub contenido: String,
}

impl NewComment {
    pub fn validate(&self) -> Result<i32, ValidationError> {
        match self.id_publicacion {
            Some(id) if !self.contenido.trim().is_empty() => Ok(id),
            _ => Err(ValidationError::new(
                "El ID de la publicación y el contenido son obligatorios")),
        }
    }
}

fn default_page() -> i64 { 1 }
fn default_limit() -> i64 { 20 }

/// Paging and filtering for the notification listing.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// `Some(true)` for read only, `Some(false)` for unread only.
    #[serde(default)]
    pub leidas: Option<bool>,
}

impl Default for NotificationQuery {
    fn default() -> NotificationQuery {
        NotificationQuery {
            page: default_page(),
            limit: default_limit(),
            leidas: None,
        }
    }
}

impl NotificationQuery {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit
    }
}

/// Request to render a publication to a document.
#[derive(Debug, Deserialize)]
pub struct RenderRequest {
    pub id_publicacion: i32,
    #[serde(default)]
    pub descargar: bool,
}

/// A request failed up-front validation.
#[derive(Debug, Fail)]
#[fail(display = "{}", _0)]
pub struct ValidationError(String);

impl ValidationError {
    pub fn new<S: Into<String>>(mensaje: S) -> ValidationError {
        ValidationError(mensaje.into())
    }
}

impl ApiError for ValidationError {
    fn status(&self) -> Status {
        Status::BadRequest
    }

    fn code(&self) -> Option<&str> {
        Some("request:invalid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_upsert_requires_id_and_type() {
        let payload = DraftUpsert {
            id_publicacion: None,
            titulo: "t".to_string(),
            resumen: "r".to_string(),
            contenido: "c".to_string(),
            referencias: String::new(),
            id_tipo: Some(1),
        };
        assert!(payload.validate().is_err());

        let payload = DraftUpsert {
            id_publicacion: Some(7),
            id_tipo: None,
            ..payload
        };
        assert!(payload.validate().is_err());
    }

    #[test]
    fn payload_serializes_with_spanish_field_names() {
        let payload = Payload::new("Publicación creada", 7);
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mensaje"], "Publicación creada");
        assert_eq!(json["datos"], 7);
    }

    #[test]
    fn update_deserializes_missing_fields_as_none() {
        let update: PublicationUpdate = serde_json::from_str(
            r#"{"titulo": "Nuevo título", "estado": "en_revision"}"#).unwrap();
        assert_eq!(update.titulo.as_deref(), Some("Nuevo título"));
        assert_eq!(update.estado,
            Some(crate::db::types::PublicationState::EnRevision));
        assert!(update.resumen.is_none());
        assert!(update.es_privada.is_none());
    }

    #[test]
    fn notification_query_pages_from_one() {
        let query = NotificationQuery { page: 3, limit: 20, leidas: None };
        assert_eq!(query.offset(), 40);

        let query = NotificationQuery::default();
        assert_eq!(query.offset(), 0);
        assert_eq!(query.limit, 20);
    }
}
