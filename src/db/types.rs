use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    serialize::{self, Output, ToSql},
    sql_types::Text,
};
use serde::{Deserialize, Serialize};

use std::{fmt, str::FromStr};

/// State of a publication within the editorial workflow.
///
/// Stored in the database as text. Valid transitions are described by
/// [`PublicationState::can_transition_to`]; everything else is rejected.
#[derive(
    AsExpression, Clone, Copy, Debug, Deserialize, Eq, FromSqlRow, Hash, PartialEq, Serialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum PublicationState {
    /// Work in progress, visible only to its owner.
    Borrador,
    /// Submitted, awaiting a moderator's decision.
    EnRevision,
    /// Approved and publicly readable (subject to the privacy flag).
    Publicado,
    /// Rejected by a reviewer. May be resubmitted.
    Rechazado,
}

impl PublicationState {
    pub fn as_str(self) -> &'static str {
        match self {
            PublicationState::Borrador => "borrador",
            PublicationState::EnRevision => "en_revision",
            PublicationState::Publicado => "publicado",
            PublicationState::Rechazado => "rechazado",
        }
    }

    /// The transition table of the editorial workflow.
    ///
    /// A draft can only be submitted, a submission can only be approved or
    /// rejected, and a rejected work can be resubmitted. There is no path
    /// back to `borrador`, and published works are final.
    pub fn can_transition_to(self, next: PublicationState) -> bool {
        use self::PublicationState::*;

        match (self, next) {
            (Borrador, EnRevision) => true,
            (Rechazado, EnRevision) => true,
            (EnRevision, Publicado) => true,
            (EnRevision, Rechazado) => true,
            _ => false,
        }
    }
}

impl fmt::Display for PublicationState {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for PublicationState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<PublicationState, UnknownVariant> {
        match s {
            "borrador" => Ok(PublicationState::Borrador),
            "en_revision" => Ok(PublicationState::EnRevision),
            "publicado" => Ok(PublicationState::Publicado),
            "rechazado" => Ok(PublicationState::Rechazado),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Role a user can take.
#[derive(
    AsExpression, Clone, Copy, Debug, Deserialize, Eq, FromSqlRow, Hash, PartialEq, Serialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Usuario,
    Registrado,
    Moderador,
    Administrador,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Usuario => "usuario",
            UserRole::Registrado => "registrado",
            UserRole::Moderador => "moderador",
            UserRole::Administrador => "administrador",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<UserRole, UnknownVariant> {
        match s {
            "usuario" => Ok(UserRole::Usuario),
            "registrado" => Ok(UserRole::Registrado),
            "moderador" => Ok(UserRole::Moderador),
            "administrador" => Ok(UserRole::Administrador),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

/// Kind of a notification.
#[derive(
    AsExpression, Clone, Copy, Debug, Deserialize, Eq, FromSqlRow, Hash, PartialEq, Serialize,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Comentario,
    Favorito,
    Revision,
    ComentarioRevision,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Comentario => "comentario",
            NotificationKind::Favorito => "favorito",
            NotificationKind::Revision => "revision",
            NotificationKind::ComentarioRevision => "comentario_revision",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<NotificationKind, UnknownVariant> {
        match s {
            "comentario" => Ok(NotificationKind::Comentario),
            "favorito" => Ok(NotificationKind::Favorito),
            "revision" => Ok(NotificationKind::Revision),
            "comentario_revision" => Ok(NotificationKind::ComentarioRevision),
            _ => Err(UnknownVariant(s.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

macro_rules! impl_text_sql {
    ($($type:ty),+ $(,)*) => {
        $(
            impl ToSql<Text, Pg> for $type {
                fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>)
                -> serialize::Result {
                    <str as ToSql<Text, Pg>>::to_sql(
                        self.as_str(), &mut out.reborrow())
                }
            }

            impl FromSql<Text, Pg> for $type {
                fn from_sql(bytes: PgValue) -> deserialize::Result<Self> {
                    let s = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                    s.parse().map_err(Into::into)
                }
            }
        )+
    };
}

impl_text_sql!(PublicationState, UserRole, NotificationKind);

#[cfg(test)]
mod tests {
    use super::PublicationState::*;

    #[test]
    fn only_workflow_edges_are_allowed() {
        let all = [Borrador, EnRevision, Publicado, Rechazado];
        let allowed = [
            (Borrador, EnRevision),
            (Rechazado, EnRevision),
            (EnRevision, Publicado),
            (EnRevision, Rechazado),
        ];

        for &from in &all {
            for &to in &all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{} -> {}",
                    from,
                    to,
                );
            }
        }
    }
}
