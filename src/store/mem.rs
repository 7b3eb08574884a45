//! In-memory implementation of the persistence gateway.
//!
//! Backs the test suite and any deployment that does not need durability.
//! Transactions are honoured by snapshotting the whole state and restoring
//! it when the closure fails.

use chrono::NaiveDateTime;

use crate::db::{
    models as db,
    types::{PublicationState, UserRole},
};
use super::{CommentRow, Gateway, NotificationRow, PublicationMeta, StoreError};

#[derive(Clone, Debug, Default)]
struct State {
    users: Vec<db::User>,
    categories: Vec<db::PublicationType>,
    publications: Vec<db::Publication>,
    comments: Vec<db::Comment>,
    favorites: Vec<db::Favorite>,
    notifications: Vec<db::Notification>,
    images: Vec<db::PublicationImage>,
    next_user: i32,
    next_publication: i32,
    next_comment: i32,
    next_favorite: i32,
    next_notification: i32,
    next_image: i32,
    next_category: i32,
}

#[derive(Clone, Debug)]
pub struct MemGateway {
    state: State,
}

impl Default for MemGateway {
    fn default() -> MemGateway {
        MemGateway::new()
    }
}

impl MemGateway {
    pub fn new() -> MemGateway {
        MemGateway {
            state: State {
                next_user: 1,
                next_publication: 1,
                next_comment: 1,
                next_favorite: 1,
                next_notification: 1,
                next_image: 1,
                next_category: 1,
                ..State::default()
            },
        }
    }

    /// Seed a user; returns the assigned ID.
    pub fn add_user(
        &mut self,
        nombre: &str,
        correo: &str,
        rol: UserRole,
        fecha_creacion: NaiveDateTime,
    ) -> i32 {
        let id = self.state.next_user;
        self.state.next_user += 1;
        self.state.users.push(db::User {
            id_usuario: id,
            nombre: nombre.to_string(),
            correo: correo.to_string(),
            contrasena: String::new(),
            rol,
            nombramiento: String::new(),
            foto_perfil: None,
            fecha_creacion,
            ultimo_acceso: None,
        });
        id
    }

    /// Seed a publication category; returns the assigned ID.
    pub fn add_category(&mut self, nombre: &str, descripcion: &str) -> i32 {
        let id = self.state.next_category;
        self.state.next_category += 1;
        self.state.categories.push(db::PublicationType {
            id_tipo: id,
            nombre: nombre.to_string(),
            descripcion: descripcion.to_string(),
        });
        id
    }

    fn make_publication(&mut self, id: i32, new: &db::NewPublication)
    -> db::Publication {
        db::Publication {
            id_publicacion: id,
            id_usuario: new.id_usuario,
            id_tipo: new.id_tipo,
            titulo: new.titulo.to_string(),
            resumen: new.resumen.to_string(),
            contenido: new.contenido.to_string(),
            referencias: new.referencias.to_string(),
            estado: new.estado,
            imagen_portada: new.imagen_portada.map(str::to_string),
            es_privada: new.es_privada,
            eliminado: false,
            comentario_revision: None,
            revisor_id: None,
            fecha_creacion: new.fecha_creacion,
            fecha_publicacion: None,
            fecha_eliminacion: None,
        }
    }
}

fn apply_change(row: &mut db::Publication, change: &db::PublicationChange) {
    if let Some(id_tipo) = change.id_tipo {
        row.id_tipo = id_tipo;
    }
    if let Some(titulo) = change.titulo {
        row.titulo = titulo.to_string();
    }
    if let Some(resumen) = change.resumen {
        row.resumen = resumen.to_string();
    }
    if let Some(contenido) = change.contenido {
        row.contenido = contenido.to_string();
    }
    if let Some(referencias) = change.referencias {
        row.referencias = referencias.to_string();
    }
    if let Some(estado) = change.estado {
        row.estado = estado;
    }
    if let Some(ref imagen) = change.imagen_portada {
        row.imagen_portada = imagen.map(str::to_string);
    }
    if let Some(es_privada) = change.es_privada {
        row.es_privada = es_privada;
    }
    if let Some(eliminado) = change.eliminado {
        row.eliminado = eliminado;
    }
    if let Some(ref comentario) = change.comentario_revision {
        row.comentario_revision = comentario.map(str::to_string);
    }
    if let Some(revisor) = change.revisor_id {
        row.revisor_id = revisor;
    }
    if let Some(fecha) = change.fecha_publicacion {
        row.fecha_publicacion = fecha;
    }
    if let Some(fecha) = change.fecha_eliminacion {
        row.fecha_eliminacion = fecha;
    }
}

impl Gateway for MemGateway {
    fn transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: From<StoreError>,
        F: FnOnce(&mut Self) -> Result<T, E>,
    {
        let snapshot = self.state.clone();

        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.state = snapshot;
                Err(e)
            }
        }
    }

    fn user_by_id(&mut self, id: i32) -> Result<Option<db::User>, StoreError> {
        Ok(self.state.users.iter().find(|u| u.id_usuario == id).cloned())
    }

    fn category_exists(&mut self, id: i32) -> Result<bool, StoreError> {
        Ok(self.state.categories.iter().any(|c| c.id_tipo == id))
    }

    fn categories(&mut self) -> Result<Vec<db::PublicationType>, StoreError> {
        Ok(self.state.categories.clone())
    }

    fn insert_publication(&mut self, new: &db::NewPublication)
    -> Result<db::Publication, StoreError> {
        let id = self.state.next_publication;
        self.state.next_publication = id + 1;
        let row = self.make_publication(id, new);
        self.state.publications.push(row.clone());
        Ok(row)
    }

    fn insert_publication_with_id(&mut self, id: i32, new: &db::NewPublication)
    -> Result<db::Publication, StoreError> {
        if self.state.publications.iter().any(|p| p.id_publicacion == id) {
            return Err(StoreError::Duplicate(
                format!("publicaciones.id_publicacion = {}", id)));
        }

        if id >= self.state.next_publication {
            self.state.next_publication = id + 1;
        }

        let row = self.make_publication(id, new);
        self.state.publications.push(row.clone());
        Ok(row)
    }

    fn publication_by_id(&mut self, id: i32)
    -> Result<Option<db::Publication>, StoreError> {
        Ok(self.state.publications.iter()
            .find(|p| p.id_publicacion == id)
            .cloned())
    }

    fn publication_with_meta(&mut self, id: i32)
    -> Result<Option<PublicationMeta>, StoreError> {
        let publication = match self.publication_by_id(id)? {
            Some(publication) => publication,
            None => return Ok(None),
        };

        let autor = self.state.users.iter()
            .find(|u| u.id_usuario == publication.id_usuario);
        let tipo = self.state.categories.iter()
            .find(|c| c.id_tipo == publication.id_tipo);

        // An inner join: both sides must exist.
        match (autor, tipo) {
            (Some(autor), Some(tipo)) => Ok(Some(PublicationMeta {
                autor: autor.nombre.clone(),
                autor_foto: autor.foto_perfil.clone(),
                tipo_publicacion: tipo.nombre.clone(),
                publication,
            })),
            _ => Ok(None),
        }
    }

    fn max_publication_id(&mut self) -> Result<Option<i32>, StoreError> {
        Ok(self.state.publications.iter().map(|p| p.id_publicacion).max())
    }

    fn update_publication(&mut self, id: i32, change: &db::PublicationChange)
    -> Result<usize, StoreError> {
        match self.state.publications.iter_mut()
            .find(|p| p.id_publicacion == id)
        {
            Some(row) => {
                apply_change(row, change);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn publications_of_user(&mut self, user: i32)
    -> Result<Vec<db::Publication>, StoreError> {
        let mut rows = self.state.publications.iter()
            .filter(|p| p.id_usuario == user && !p.eliminado)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
        Ok(rows)
    }

    fn recent_published(&mut self, limit: i64)
    -> Result<Vec<db::Publication>, StoreError> {
        let mut rows = self.state.publications.iter()
            .filter(|p| p.estado == PublicationState::Publicado
                && !p.eliminado
                && !p.es_privada)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.fecha_publicacion.cmp(&a.fecha_publicacion));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    fn pending_review(&mut self) -> Result<Vec<db::Publication>, StoreError> {
        let mut rows = self.state.publications.iter()
            .filter(|p| p.estado == PublicationState::EnRevision && !p.eliminado)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));
        Ok(rows)
    }

    fn published_count_of_user(&mut self, user: i32) -> Result<i64, StoreError> {
        Ok(self.state.publications.iter()
            .filter(|p| p.id_usuario == user
                && p.estado == PublicationState::Publicado
                && !p.eliminado
                && !p.es_privada)
            .count() as i64)
    }

    fn favorite_of(&mut self, user: i32, publication: i32)
    -> Result<Option<db::Favorite>, StoreError> {
        Ok(self.state.favorites.iter()
            .find(|f| f.id_usuario == user && f.id_publicacion == publication)
            .copied())
    }

    fn insert_favorite(&mut self, new: &db::NewFavorite)
    -> Result<db::Favorite, StoreError> {
        let exists = self.state.favorites.iter().any(|f| {
            f.id_usuario == new.id_usuario
                && f.id_publicacion == new.id_publicacion
        });
        if exists {
            return Err(StoreError::Duplicate(
                "favoritos (id_usuario, id_publicacion)".to_string()));
        }

        let id = self.state.next_favorite;
        self.state.next_favorite += 1;
        let row = db::Favorite {
            id_favorito: id,
            id_usuario: new.id_usuario,
            id_publicacion: new.id_publicacion,
            fecha_creacion: new.fecha_creacion,
        };
        self.state.favorites.push(row);
        Ok(row)
    }

    fn delete_favorite(&mut self, id: i32) -> Result<usize, StoreError> {
        let before = self.state.favorites.len();
        self.state.favorites.retain(|f| f.id_favorito != id);
        Ok(before - self.state.favorites.len())
    }

    fn favorite_count(&mut self, publication: i32) -> Result<i64, StoreError> {
        Ok(self.state.favorites.iter()
            .filter(|f| f.id_publicacion == publication)
            .count() as i64)
    }

    fn insert_comment(&mut self, new: &db::NewComment)
    -> Result<db::Comment, StoreError> {
        let id = self.state.next_comment;
        self.state.next_comment += 1;
        let row = db::Comment {
            id_comentario: id,
            id_publicacion: new.id_publicacion,
            id_usuario: new.id_usuario,
            contenido: new.contenido.to_string(),
            fecha_creacion: new.fecha_creacion,
        };
        self.state.comments.push(row.clone());
        Ok(row)
    }

    fn comment_by_id(&mut self, id: i32)
    -> Result<Option<db::Comment>, StoreError> {
        Ok(self.state.comments.iter()
            .find(|c| c.id_comentario == id)
            .cloned())
    }

    fn delete_comment(&mut self, id: i32) -> Result<usize, StoreError> {
        let before = self.state.comments.len();
        self.state.comments.retain(|c| c.id_comentario != id);
        Ok(before - self.state.comments.len())
    }

    fn comments_of_publication(&mut self, publication: i32)
    -> Result<Vec<CommentRow>, StoreError> {
        let mut rows = Vec::new();
        for comment in &self.state.comments {
            if comment.id_publicacion != publication {
                continue;
            }
            let autor = self.state.users.iter()
                .find(|u| u.id_usuario == comment.id_usuario);
            if let Some(autor) = autor {
                rows.push(CommentRow {
                    comment: comment.clone(),
                    autor: autor.nombre.clone(),
                });
            }
        }
        rows.sort_by(|a, b| a.comment.fecha_creacion.cmp(&b.comment.fecha_creacion));
        Ok(rows)
    }

    fn comment_count(&mut self, publication: i32) -> Result<i64, StoreError> {
        Ok(self.state.comments.iter()
            .filter(|c| c.id_publicacion == publication)
            .count() as i64)
    }

    fn insert_notification(&mut self, new: &db::NewNotification)
    -> Result<db::Notification, StoreError> {
        let id = self.state.next_notification;
        self.state.next_notification += 1;
        let row = db::Notification {
            id_notificacion: id,
            id_usuario: new.id_usuario,
            id_origen: new.id_origen,
            tipo: new.tipo,
            id_referencia: new.id_referencia,
            tipo_referencia: new.tipo_referencia.to_string(),
            contenido: new.contenido.to_string(),
            leida: false,
            notificar_correo: new.notificar_correo,
            fecha_creacion: new.fecha_creacion,
        };
        self.state.notifications.push(row.clone());
        Ok(row)
    }

    fn set_notification_read(&mut self, id: i32, user: i32)
    -> Result<usize, StoreError> {
        match self.state.notifications.iter_mut()
            .find(|n| n.id_notificacion == id && n.id_usuario == user)
        {
            Some(row) => {
                row.leida = true;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    fn mark_all_notifications_read(&mut self, user: i32)
    -> Result<usize, StoreError> {
        let mut affected = 0;
        for row in &mut self.state.notifications {
            if row.id_usuario == user && !row.leida {
                row.leida = true;
                affected += 1;
            }
        }
        Ok(affected)
    }

    fn notifications_of_user(
        &mut self,
        user: i32,
        read: Option<bool>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<NotificationRow>, StoreError> {
        let mut rows = self.state.notifications.iter()
            .filter(|n| n.id_usuario == user
                && read.map_or(true, |r| n.leida == r))
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by(|a, b| b.fecha_creacion.cmp(&a.fecha_creacion));

        Ok(rows.into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|notification| {
                let origen = notification.id_origen.and_then(|id| {
                    self.state.users.iter().find(|u| u.id_usuario == id)
                });
                NotificationRow {
                    origen_nombre: origen.map(|u| u.nombre.clone()),
                    origen_foto: origen.and_then(|u| u.foto_perfil.clone()),
                    notification,
                }
            })
            .collect())
    }

    fn notification_count(&mut self, user: i32, read: Option<bool>)
    -> Result<i64, StoreError> {
        Ok(self.state.notifications.iter()
            .filter(|n| n.id_usuario == user
                && read.map_or(true, |r| n.leida == r))
            .count() as i64)
    }

    fn max_image_order(&mut self, publication: i32)
    -> Result<Option<i32>, StoreError> {
        Ok(self.state.images.iter()
            .filter(|i| i.id_publicacion == publication)
            .map(|i| i.orden)
            .max())
    }

    fn insert_image(&mut self, new: &db::NewPublicationImage)
    -> Result<db::PublicationImage, StoreError> {
        let id = self.state.next_image;
        self.state.next_image += 1;
        let row = db::PublicationImage {
            id_imagen: id,
            id_publicacion: new.id_publicacion,
            url: new.url.to_string(),
            descripcion: new.descripcion.to_string(),
            orden: new.orden,
        };
        self.state.images.push(row.clone());
        Ok(row)
    }

    fn images_of_publication(&mut self, publication: i32)
    -> Result<Vec<db::PublicationImage>, StoreError> {
        let mut rows = self.state.images.iter()
            .filter(|i| i.id_publicacion == publication)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by_key(|i| i.orden);
        Ok(rows)
    }
}
