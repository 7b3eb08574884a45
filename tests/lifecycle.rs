//! Tests for the publication lifecycle: drafts, submission, review,
//! favorites, comments, and the notifications they emit.

use chrono::Utc;
use failure::Fallible;

use xires::{
    api,
    db::{models as db, types::{PublicationState, UserRole}},
    events,
    files::{DiskStore, FileStore, Upload},
    images::Resizer,
    models::{
        publication::{SubmitForReviewError, UpdatePublicationError, UpsertDraftError},
        Comment, Favorite, Publication,
    },
    store::{Gateway, MemGateway},
};

struct Ctx {
    store: MemGateway,
    files: DiskStore,
    _dir: tempfile::TempDir,
    autor: db::User,
    lector: db::User,
    moderador: db::User,
    tipo: i32,
}

fn setup() -> Ctx {
    let now = Utc::now().naive_utc();
    let mut store = MemGateway::new();

    let autor = store.add_user(
        "Ana", "a@b.com", UserRole::Registrado, now);
    let lector = store.add_user(
        "Beto", "beto@axotl.test", UserRole::Registrado, now);
    let moderador = store.add_user(
        "Marco", "marco@axotl.test", UserRole::Moderador, now);
    let tipo = store.add_category("Artículo científico", "");

    let dir = tempfile::tempdir().expect("tempdir");
    let files = DiskStore::at(dir.path());

    let autor = store.user_by_id(autor).unwrap().unwrap();
    let lector = store.user_by_id(lector).unwrap().unwrap();
    let moderador = store.user_by_id(moderador).unwrap().unwrap();

    Ctx { store, files, _dir: dir, autor, lector, moderador, tipo }
}

fn sample_image() -> Upload {
    let img = image::RgbImage::from_pixel(64, 48, image::Rgb([120, 40, 200]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes),
            image::ImageOutputFormat::Png)
        .expect("encode sample image");
    Upload::new(bytes)
}

fn new_draft(ctx: &mut Ctx, titulo: &str) -> Publication {
    Publication::create(
        &mut ctx.store,
        &ctx.autor.clone(),
        &api::NewPublication {
            titulo: titulo.to_string(),
            resumen: "Resumen de prueba".to_string(),
            contenido: "<p>Contenido</p>".to_string(),
            referencias: String::new(),
            id_tipo: Some(ctx.tipo),
            es_borrador: true,
        },
        None,
        &ctx.files,
        &Resizer,
    ).expect("create draft")
}

fn publish(ctx: &mut Ctx, titulo: &str) -> db::Publication {
    let draft = new_draft(ctx, titulo);
    let cover = sample_image();
    let submitted = Publication::submit_for_review(
        &mut ctx.store,
        &ctx.autor.clone(),
        draft.id_publicacion,
        &api::PublicationUpdate::default(),
        Some(&cover),
        &ctx.files,
        &Resizer,
    ).expect("submit");
    let published = Publication::review(
        &mut ctx.store,
        &ctx.moderador.clone(),
        submitted.id_publicacion,
        &api::ReviewDecision { aprobada: true, comentario_revision: None },
    ).expect("approve");
    published.into_db()
}

#[test]
fn draft_without_cover_cannot_be_submitted() {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "T");
    assert_eq!(draft.estado, PublicationState::Borrador);
    assert!(draft.es_privada);
    assert!(draft.imagen_portada.is_none());

    let r = Publication::submit_for_review(
        &mut ctx.store,
        &ctx.autor.clone(),
        draft.id_publicacion,
        &api::PublicationUpdate::default(),
        None,
        &ctx.files,
        &Resizer,
    );
    assert!(matches!(r, Err(SubmitForReviewError::CoverRequired)));

    // Nothing changed.
    let row = ctx.store.publication_by_id(draft.id_publicacion)
        .unwrap().unwrap();
    assert_eq!(row.estado, PublicationState::Borrador);
}

#[test]
fn submission_keeps_a_previously_stored_cover() -> Fallible<()> {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Con portada");

    let cover = sample_image();
    let draft = Publication::update(
        &mut ctx.store,
        &ctx.autor.clone(),
        draft.id_publicacion,
        &api::PublicationUpdate::default(),
        Some(&cover),
        &ctx.files,
        &Resizer,
    )?;
    let stored = draft.imagen_portada.clone().expect("cover stored");
    assert!(ctx.files.exists(&stored));

    let submitted = Publication::submit_for_review(
        &mut ctx.store,
        &ctx.autor.clone(),
        draft.id_publicacion,
        &api::PublicationUpdate::default(),
        None,
        &ctx.files,
        &Resizer,
    )?;

    assert_eq!(submitted.estado, PublicationState::EnRevision);
    assert!(submitted.es_privada);
    assert_eq!(submitted.imagen_portada.as_deref(), Some(stored.as_str()));
    Ok(())
}

#[test]
fn public_visibility_matches_the_predicate_exactly() {
    let mut ctx = setup();

    let states = [
        PublicationState::Borrador,
        PublicationState::EnRevision,
        PublicationState::Publicado,
        PublicationState::Rechazado,
    ];

    for estado in states {
        for es_privada in [false, true] {
            for eliminado in [false, true] {
                let row = ctx.store.insert_publication(&db::NewPublication {
                    id_usuario: ctx.autor.id_usuario,
                    id_tipo: ctx.tipo,
                    titulo: "V",
                    resumen: "",
                    contenido: "",
                    referencias: "",
                    estado,
                    imagen_portada: None,
                    es_privada,
                    fecha_creacion: Utc::now().naive_utc(),
                }).unwrap();
                ctx.store.update_publication(row.id_publicacion,
                    &db::PublicationChange {
                        eliminado: Some(eliminado),
                        ..db::PublicationChange::default()
                    }).unwrap();

                let expected = !eliminado
                    && estado == PublicationState::Publicado
                    && !es_privada;
                let visible = Publication::get_public(
                    &mut ctx.store, row.id_publicacion, None).is_ok();
                assert_eq!(visible, expected,
                    "estado={} privada={} eliminado={}",
                    estado, es_privada, eliminado);
            }
        }
    }
}

#[test]
fn favorite_toggle_is_an_involution() -> Fallible<()> {
    let mut ctx = setup();
    let publication = publish(&mut ctx, "Favorita");
    let lector = ctx.lector.clone();

    let before = ctx.store.notification_count(ctx.autor.id_usuario, None)?;

    let first = Favorite::toggle(
        &mut ctx.store, &lector, publication.id_publicacion)?;
    assert!(first.es_favorito);
    assert_eq!(first.total_favoritos, 1);

    let rows = ctx.store.notifications_of_user(
        ctx.autor.id_usuario, None, 50, 0)?;
    let favorito = rows.iter()
        .find(|r| r.notification.tipo.as_str() == "favorito")
        .expect("favorite notification");
    assert_eq!(favorito.notification.id_origen, Some(lector.id_usuario));
    assert_eq!(favorito.notification.contenido,
        "Beto ha marcado como favorito tu publicación \"Favorita\"");
    // Dispatched notifications are flagged for email delivery.
    assert!(favorito.notification.notificar_correo);

    let second = Favorite::toggle(
        &mut ctx.store, &lector, publication.id_publicacion)?;
    assert!(!second.es_favorito);
    assert_eq!(second.total_favoritos, 0);

    // Unfavoriting is silent.
    let after = ctx.store.notification_count(ctx.autor.id_usuario, None)?;
    assert_eq!(after, before + 1);
    Ok(())
}

#[test]
fn self_triggered_actions_produce_no_notifications() -> Fallible<()> {
    let mut ctx = setup();
    let publication = publish(&mut ctx, "Propia");
    let autor = ctx.autor.clone();

    // The approval already notified the owner; record the baseline.
    let before = ctx.store.notification_count(autor.id_usuario, None)?;

    Favorite::toggle(&mut ctx.store, &autor, publication.id_publicacion)?;
    Comment::create(&mut ctx.store, &autor, &api::NewComment {
        id_publicacion: Some(publication.id_publicacion),
        contenido: "Mi propio comentario".to_string(),
    })?;

    let after = ctx.store.notification_count(autor.id_usuario, None)?;
    assert_eq!(after, before);
    Ok(())
}

#[test]
fn rejection_records_comment_and_notifies_owner() -> Fallible<()> {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Observada");
    let cover = sample_image();
    Publication::submit_for_review(
        &mut ctx.store, &ctx.autor.clone(), draft.id_publicacion,
        &api::PublicationUpdate::default(), Some(&cover),
        &ctx.files, &Resizer)?;

    let rejected = Publication::review(
        &mut ctx.store,
        &ctx.moderador.clone(),
        draft.id_publicacion,
        &api::ReviewDecision {
            aprobada: false,
            comentario_revision: Some("needs more detail".to_string()),
        },
    )?;

    assert_eq!(rejected.estado, PublicationState::Rechazado);
    assert_eq!(rejected.comentario_revision.as_deref(),
        Some("needs more detail"));
    assert_eq!(rejected.revisor_id, Some(ctx.moderador.id_usuario));
    assert!(rejected.fecha_publicacion.is_none());

    let rows = ctx.store.notifications_of_user(
        ctx.autor.id_usuario, None, 10, 0)?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].notification.tipo.as_str(), "revision");
    assert_eq!(rows[0].notification.contenido,
        "Tu publicación \"Observada\" ha sido rechazada por Marco");
    Ok(())
}

#[test]
fn approval_sets_published_at_and_publishes() {
    let mut ctx = setup();
    let publication = publish(&mut ctx, "Aprobada");

    assert_eq!(publication.estado, PublicationState::Publicado);
    assert!(publication.fecha_publicacion.is_some());
    assert!(!publication.es_privada);
}

#[test]
fn regular_users_cannot_review() {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Sin permisos");

    let r = Publication::review(
        &mut ctx.store,
        &ctx.lector.clone(),
        draft.id_publicacion,
        &api::ReviewDecision { aprobada: true, comentario_revision: None },
    );
    assert!(r.is_err());
}

#[test]
fn rejected_publications_can_be_resubmitted() -> Fallible<()> {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Insistente");
    let cover = sample_image();
    Publication::submit_for_review(
        &mut ctx.store, &ctx.autor.clone(), draft.id_publicacion,
        &api::PublicationUpdate::default(), Some(&cover),
        &ctx.files, &Resizer)?;
    Publication::review(
        &mut ctx.store, &ctx.moderador.clone(), draft.id_publicacion,
        &api::ReviewDecision { aprobada: false, comentario_revision: None })?;

    let resubmitted = Publication::submit_for_review(
        &mut ctx.store, &ctx.autor.clone(), draft.id_publicacion,
        &api::PublicationUpdate::default(), None,
        &ctx.files, &Resizer)?;
    assert_eq!(resubmitted.estado, PublicationState::EnRevision);
    Ok(())
}

#[test]
fn update_cannot_skip_review() {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Impaciente");

    let r = Publication::update(
        &mut ctx.store,
        &ctx.autor.clone(),
        draft.id_publicacion,
        &api::PublicationUpdate {
            estado: Some(PublicationState::Publicado),
            ..api::PublicationUpdate::default()
        },
        None,
        &ctx.files,
        &Resizer,
    );
    assert!(matches!(r, Err(UpdatePublicationError::Transition(_))));
}

#[test]
fn only_the_owner_may_update_or_delete() {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Ajena");
    let lector = ctx.lector.clone();

    let r = Publication::update(
        &mut ctx.store, &lector, draft.id_publicacion,
        &api::PublicationUpdate::default(), None, &ctx.files, &Resizer);
    assert!(matches!(r, Err(UpdatePublicationError::Forbidden)));

    let r = Publication::soft_delete(
        &mut ctx.store, &lector, draft.id_publicacion);
    assert!(r.is_err());

    Publication::soft_delete(
        &mut ctx.store, &ctx.autor.clone(), draft.id_publicacion)
        .expect("owner deletes");
    let row = ctx.store.publication_by_id(draft.id_publicacion)
        .unwrap().unwrap();
    assert!(row.eliminado);
    assert!(row.fecha_eliminacion.is_some());
}

#[test]
fn draft_upsert_reserves_ids_and_is_idempotent() -> Fallible<()> {
    let mut ctx = setup();
    let autor = ctx.autor.clone();

    let payload = api::DraftUpsert {
        id_publicacion: Some(10),
        titulo: "Reservada".to_string(),
        resumen: "R".to_string(),
        contenido: "<p>C</p>".to_string(),
        referencias: String::new(),
        id_tipo: Some(ctx.tipo),
    };

    // Above the current maximum: inserted under that exact ID.
    let (draft, created) = Publication::upsert_draft(
        &mut ctx.store, &autor, &payload, None, &ctx.files, &Resizer)?;
    assert!(created);
    assert_eq!(draft.id_publicacion, 10);
    assert_eq!(draft.estado, PublicationState::Borrador);

    // Same call again: updates in place, field for field.
    let (again, created) = Publication::upsert_draft(
        &mut ctx.store, &autor, &payload, None, &ctx.files, &Resizer)?;
    assert!(!created);
    assert_eq!(again.id_publicacion, 10);
    assert_eq!(again.titulo, draft.titulo);
    assert_eq!(again.resumen, draft.resumen);
    assert_eq!(again.contenido, draft.contenido);
    assert_eq!(again.imagen_portada, draft.imagen_portada);

    // Within range but not an owned draft: rejected.
    let missing = api::DraftUpsert {
        id_publicacion: Some(3),
        ..payload
    };
    let r = Publication::upsert_draft(
        &mut ctx.store, &autor, &missing, None, &ctx.files, &Resizer);
    assert!(matches!(r, Err(UpsertDraftError::NotFound)));
    Ok(())
}

#[test]
fn draft_upsert_replaces_the_cover_file() -> Fallible<()> {
    let mut ctx = setup();
    let autor = ctx.autor.clone();

    let payload = api::DraftUpsert {
        id_publicacion: Some(5),
        titulo: "Portadas".to_string(),
        resumen: String::new(),
        contenido: String::new(),
        referencias: String::new(),
        id_tipo: Some(ctx.tipo),
    };

    let cover = sample_image();
    let (draft, _) = Publication::upsert_draft(
        &mut ctx.store, &autor, &payload, Some(&cover),
        &ctx.files, &Resizer)?;
    let first = draft.imagen_portada.clone().expect("first cover");
    assert!(first.ends_with(".jpg"));
    assert!(ctx.files.exists(&first));

    let replacement = sample_image();
    let (draft, _) = Publication::upsert_draft(
        &mut ctx.store, &autor, &payload, Some(&replacement),
        &ctx.files, &Resizer)?;
    let second = draft.imagen_portada.clone().expect("second cover");
    assert!(ctx.files.exists(&second));
    Ok(())
}

#[test]
fn comments_notify_the_owner_and_are_author_scoped() -> Fallible<()> {
    let mut ctx = setup();
    let publication = publish(&mut ctx, "Comentada");
    let lector = ctx.lector.clone();
    let autor = ctx.autor.clone();

    let comment = Comment::create(&mut ctx.store, &lector, &api::NewComment {
        id_publicacion: Some(publication.id_publicacion),
        contenido: "Muy interesante".to_string(),
    })?;

    let rows = ctx.store.notifications_of_user(
        autor.id_usuario, None, 10, 0)?;
    let nota = rows.iter()
        .find(|r| r.notification.tipo.as_str() == "comentario")
        .expect("comment notification");
    assert_eq!(nota.notification.contenido,
        "Beto ha comentado en tu publicación \"Comentada\"");
    assert_eq!(nota.origen_nombre.as_deref(), Some("Beto"));

    // Only the author may delete their comment.
    let id = comment.id_comentario;
    let held = Comment::by_id(&mut ctx.store, id)?;
    assert!(held.delete(&mut ctx.store, &autor).is_err());
    let held = Comment::by_id(&mut ctx.store, id)?;
    held.delete(&mut ctx.store, &lector)?;
    assert!(Comment::by_id(&mut ctx.store, id).is_err());
    Ok(())
}

#[test]
fn notifications_are_read_scoped_and_countable() -> Fallible<()> {
    let mut ctx = setup();
    let publication = publish(&mut ctx, "Notificada");
    let lector = ctx.lector.clone();
    let autor = ctx.autor.clone();

    Favorite::toggle(&mut ctx.store, &lector, publication.id_publicacion)?;
    Comment::create(&mut ctx.store, &lector, &api::NewComment {
        id_publicacion: Some(publication.id_publicacion),
        contenido: "Hola".to_string(),
    })?;

    // approval + favorite + comment
    assert_eq!(events::unread_count(&mut ctx.store, autor.id_usuario)?, 3);

    let list = events::list(&mut ctx.store, autor.id_usuario,
        &api::NotificationQuery { page: 1, limit: 2, leidas: None })?;
    assert_eq!(list.notificaciones.len(), 2);
    assert_eq!(list.total, 3);
    assert_eq!(list.no_leidas, 3);

    let first = list.notificaciones[0].id_notificacion;

    // Another user cannot mark someone else's notification.
    assert!(events::mark_read(&mut ctx.store, lector.id_usuario, first)
        .is_err());

    events::mark_read(&mut ctx.store, autor.id_usuario, first)?;
    assert_eq!(events::unread_count(&mut ctx.store, autor.id_usuario)?, 2);

    assert_eq!(events::mark_all_read(&mut ctx.store, autor.id_usuario)?, 2);
    assert_eq!(events::unread_count(&mut ctx.store, autor.id_usuario)?, 0);

    let unread_only = events::list(&mut ctx.store, autor.id_usuario,
        &api::NotificationQuery { page: 1, limit: 10, leidas: Some(false) })?;
    assert!(unread_only.notificaciones.is_empty());
    Ok(())
}

#[test]
fn gallery_images_are_ordered_monotonically() -> Fallible<()> {
    let mut ctx = setup();
    let draft = new_draft(&mut ctx, "Galería");
    let autor = ctx.autor.clone();

    let first = Publication::add_image(
        &mut ctx.store, &autor, draft.id_publicacion,
        &sample_image(), "Figura 1", &ctx.files, &Resizer)?;
    let second = Publication::add_image(
        &mut ctx.store, &autor, draft.id_publicacion,
        &sample_image(), "Figura 2", &ctx.files, &Resizer)?;

    assert_eq!(first.orden, 1);
    assert_eq!(second.orden, 2);
    assert!(ctx.files.exists(&first.url));
    assert_ne!(first.url, second.url);

    let images = Publication::images(&mut ctx.store, draft.id_publicacion)?;
    assert_eq!(images.len(), 2);
    assert_eq!(images[0].descripcion, "Figura 1");
    Ok(())
}

#[test]
fn failed_transactions_roll_back_completely() {
    let mut ctx = setup();
    let autor = ctx.autor.id_usuario;
    let before = ctx.store.notification_count(autor, None).unwrap();

    let r: Result<(), xires::store::StoreError> =
        ctx.store.transaction(|store| {
            store.insert_notification(&db::NewNotification {
                id_usuario: autor,
                id_origen: None,
                tipo: xires::db::types::NotificationKind::Revision,
                id_referencia: 1,
                tipo_referencia: "publicacion",
                contenido: "fantasma",
                notificar_correo: false,
                fecha_creacion: Utc::now().naive_utc(),
            })?;
            Err(xires::store::StoreError::Database("boom".to_string()))
        });
    assert!(r.is_err());

    let after = ctx.store.notification_count(autor, None).unwrap();
    assert_eq!(after, before);
}
