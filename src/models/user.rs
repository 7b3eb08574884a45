use chrono::NaiveDateTime;
use failure::Fail;
use serde::Serialize;
use std::ops::Deref;

use crate::{
    api::{ApiError, Status},
    db::{models as db, types::UserRole},
    store::{Gateway, StoreError},
};

/// A registered user of the platform.
#[derive(Debug)]
pub struct User {
    data: db::User,
}

/// Part of a user's data the platform shows on public profiles. The
/// password hash never leaves the `db` layer.
#[derive(Debug, Serialize)]
pub struct PublicData {
    pub id_usuario: i32,
    pub nombre: String,
    pub nombramiento: String,
    pub rol: UserRole,
    pub foto_perfil: Option<String>,
    pub fecha_creacion: NaiveDateTime,
    /// Number of the user's publicly visible publications.
    pub total_publicaciones: i64,
}

impl User {
    /// Construct `User` from its database counterpart.
    pub(crate) fn from_db(data: db::User) -> User {
        User { data }
    }

    /// Find a user by ID.
    pub fn by_id<S: Gateway>(store: &mut S, id: i32)
    -> Result<User, FindUserError> {
        store.user_by_id(id)?
            .ok_or(FindUserError::NotFound)
            .map(User::from_db)
    }

    /// Get the public portion of this user's data.
    pub fn get_public<S: Gateway>(&self, store: &mut S)
    -> Result<PublicData, StoreError> {
        let db::User {
            id_usuario, ref nombre, ref nombramiento, rol, ref foto_perfil,
            fecha_creacion, ..
        } = self.data;

        Ok(PublicData {
            id_usuario,
            nombre: nombre.clone(),
            nombramiento: nombramiento.clone(),
            rol,
            foto_perfil: foto_perfil.clone(),
            fecha_creacion,
            total_publicaciones: store.published_count_of_user(id_usuario)?,
        })
    }
}

impl Deref for User {
    type Target = db::User;

    fn deref(&self) -> &db::User {
        &self.data
    }
}

#[derive(Debug, Fail)]
pub enum FindUserError {
    /// No user found for given ID.
    #[fail(display = "Usuario no encontrado")]
    NotFound,
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for FindUserError ;
    StoreError => |e| FindUserError::Store(e),
}

impl ApiError for FindUserError {
    fn status(&self) -> Status {
        match self {
            FindUserError::NotFound => Status::NotFound,
            FindUserError::Store(_) => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            FindUserError::NotFound => Some("user:not-found"),
            FindUserError::Store(_) => None,
        }
    }
}
