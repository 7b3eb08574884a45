use crate::db::types::NotificationKind;

/// Reference type stored alongside publication-scoped notifications.
pub const REF_PUBLICATION: &str = "publicacion";

/// Things which can happen and that a user may be notified about.
#[derive(Clone, Debug)]
pub enum Event {
    /// Someone commented on the recipient's publication.
    NewComment {
        autor: String,
        titulo: String,
    },
    /// Someone marked the recipient's publication as a favorite.
    NewFavorite {
        autor: String,
        titulo: String,
    },
    /// A reviewer decided on the recipient's submission.
    ReviewDecision {
        revisor: String,
        titulo: String,
        aprobada: bool,
    },
}

impl Event {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Event::NewComment { .. } => NotificationKind::Comentario,
            Event::NewFavorite { .. } => NotificationKind::Favorito,
            Event::ReviewDecision { .. } => NotificationKind::Revision,
        }
    }

    /// Human-readable message stored with the notification.
    pub fn message(&self) -> String {
        match self {
            Event::NewComment { autor, titulo } => format!(
                "{} ha comentado en tu publicación \"{}\"", autor, titulo),
            Event::NewFavorite { autor, titulo } => format!(
                "{} ha marcado como favorito tu publicación \"{}\"",
                autor, titulo),
            Event::ReviewDecision { revisor, titulo, aprobada: true } => format!(
                "Tu publicación \"{}\" ha sido aprobada por {}",
                titulo, revisor),
            Event::ReviewDecision { revisor, titulo, aprobada: false } => format!(
                "Tu publicación \"{}\" ha sido rechazada por {}",
                titulo, revisor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_actor_and_title() {
        let ev = Event::NewComment {
            autor: "Ana".to_string(),
            titulo: "Axolotes".to_string(),
        };
        assert_eq!(ev.message(),
            "Ana ha comentado en tu publicación \"Axolotes\"");

        let ev = Event::ReviewDecision {
            revisor: "Marco".to_string(),
            titulo: "Axolotes".to_string(),
            aprobada: false,
        };
        assert_eq!(ev.message(),
            "Tu publicación \"Axolotes\" ha sido rechazada por Marco");
    }
}
