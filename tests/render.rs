//! Tests for the document renderer pipeline: visibility gating, content
//! transformation, page order, and output metadata.

use chrono::Utc;
use failure::Fallible;

use xires::{
    config,
    db::{models as db, types::{PublicationState, UserRole}},
    files::{DiskStore, FileStore},
    render::{Disposition, RenderError, Renderer},
    store::{Gateway, MemGateway},
};

struct Ctx {
    store: MemGateway,
    files: DiskStore,
    _dir: tempfile::TempDir,
    renderer: Renderer,
    autor: i32,
    tipo: i32,
}

fn setup() -> Ctx {
    let now = Utc::now().naive_utc();
    let mut store = MemGateway::new();
    let autor = store.add_user("Ana", "ana@axotl.test", UserRole::Registrado, now);
    let tipo = store.add_category("Ensayo", "");

    let dir = tempfile::tempdir().expect("tempdir");
    let files = DiskStore::at(dir.path());

    let renderer = Renderer::new(&config::Render { logo: None })
        .expect("renderer");

    Ctx { store, files, _dir: dir, renderer, autor, tipo }
}

fn insert_publication(ctx: &mut Ctx, titulo: &str, contenido: &str,
                      referencias: &str) -> i32 {
    let row = ctx.store.insert_publication(&db::NewPublication {
        id_usuario: ctx.autor,
        id_tipo: ctx.tipo,
        titulo,
        resumen: "Un estudio del ajolote.",
        contenido,
        referencias,
        estado: PublicationState::Publicado,
        imagen_portada: None,
        es_privada: false,
        fecha_creacion: Utc::now().naive_utc(),
    }).expect("insert");
    row.id_publicacion
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn renders_a_pdf_with_slugified_filename() -> Fallible<()> {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx,
        "El Ajolote: Regeneración & Ciencia",
        "<p>Contenido</p>", "");

    let doc = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Attachment)?;

    assert!(doc.bytes.starts_with(b"%PDF-1.5"));
    assert_eq!(doc.content_type, "application/pdf");
    assert_eq!(doc.disposition, Disposition::Attachment);
    assert_eq!(doc.filename, "el_ajolote_regeneraci_n_ciencia.pdf");
    Ok(())
}

#[test]
fn only_publicly_visible_publications_render() {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx, "Privada", "<p>x</p>", "");
    ctx.store.update_publication(id, &db::PublicationChange {
        es_privada: Some(true),
        ..db::PublicationChange::default()
    }).unwrap();

    let r = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Inline);
    assert!(matches!(r, Err(RenderError::NotFound)));

    for change in [
        db::PublicationChange {
            es_privada: Some(false),
            estado: Some(PublicationState::EnRevision),
            ..db::PublicationChange::default()
        },
        db::PublicationChange {
            estado: Some(PublicationState::Publicado),
            eliminado: Some(true),
            ..db::PublicationChange::default()
        },
    ] {
        ctx.store.update_publication(id, &change).unwrap();
        let r = ctx.renderer.render(
            &mut ctx.store, &ctx.files, id, Disposition::Inline);
        assert!(matches!(r, Err(RenderError::NotFound)));
    }
}

#[test]
fn references_page_present_only_when_nonempty() -> Fallible<()> {
    let mut ctx = setup();
    let sin = insert_publication(&mut ctx, "Sin referencias",
        "<p>Texto</p>", "");
    let con = insert_publication(&mut ctx, "Con referencias",
        "<p>Texto</p>", "Monjaraz (2021). Biología del ajolote.");

    let a = ctx.renderer.render(
        &mut ctx.store, &ctx.files, sin, Disposition::Inline)?;
    let b = ctx.renderer.render(
        &mut ctx.store, &ctx.files, con, Disposition::Inline)?;

    // Content streams are uncompressed: section titles and reference
    // text appear literally in the output.
    assert!(!contains(&a.bytes, b"Referencias"));
    assert!(contains(&b.bytes, b"Referencias"));
    assert!(contains(&b.bytes, b"Monjaraz \\(2021\\)."));

    let pages_a = lopdf::Document::load_mem(&a.bytes)?.get_pages().len();
    let pages_b = lopdf::Document::load_mem(&b.bytes)?.get_pages().len();
    assert_eq!(pages_b, pages_a + 1);
    Ok(())
}

#[test]
fn inline_markers_survive_into_the_document() -> Fallible<()> {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx, "Marcas",
        "<h2>Sección</h2>\
         <p>Texto con <strong>negrita</strong> y <em>cursiva</em> y \
         <code>codigo</code>.</p>",
        "");

    let doc = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Inline)?;

    assert!(contains(&doc.bytes, b"**negrita**"));
    assert!(contains(&doc.bytes, b"_cursiva_"));
    assert!(contains(&doc.bytes, b"`codigo`"));
    Ok(())
}

#[test]
fn disposition_changes_metadata_not_bytes() -> Fallible<()> {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx, "Igual", "<p>x</p>", "");

    let inline = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Inline)?;
    let attachment = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Attachment)?;

    assert_eq!(inline.bytes, attachment.bytes);
    assert_eq!(inline.disposition, Disposition::Inline);
    assert_eq!(attachment.disposition, Disposition::Attachment);
    Ok(())
}

#[test]
fn missing_cover_file_degrades_by_omission() -> Fallible<()> {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx, "Huérfana", "<p>x</p>", "");
    ctx.store.update_publication(id, &db::PublicationChange {
        imagen_portada: Some(Some("portada_999.jpg")),
        ..db::PublicationChange::default()
    }).unwrap();
    assert!(!ctx.files.exists("portada_999.jpg"));

    let doc = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Inline)?;
    assert!(doc.bytes.starts_with(b"%PDF-1.5"));
    Ok(())
}

#[test]
fn stored_cover_is_embedded_as_jpeg() -> Fallible<()> {
    let mut ctx = setup();
    let id = insert_publication(&mut ctx, "Ilustrada", "<p>x</p>", "");

    let img = image::RgbImage::from_pixel(32, 32, image::Rgb([200, 30, 60]));
    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut png),
            image::ImageOutputFormat::Png)?;
    ctx.files.save("portada_1.png", &png)?;
    ctx.store.update_publication(id, &db::PublicationChange {
        imagen_portada: Some(Some("portada_1.png")),
        ..db::PublicationChange::default()
    }).unwrap();

    let doc = ctx.renderer.render(
        &mut ctx.store, &ctx.files, id, Disposition::Inline)?;
    assert!(contains(&doc.bytes, b"DCTDecode"));
    Ok(())
}
