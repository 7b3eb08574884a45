//! The document renderer.
//!
//! Turns a publicly visible publication into a downloadable PDF:
//! fetch → content transform → layout → emission. Missing cover art or
//! logo degrade by omission; unusable font metrics abort construction,
//! so a running renderer never fails on typefaces.

use failure::Fail;
use image::codecs::jpeg::JpegEncoder;
use log::{debug, warn};
use serde::Serialize;

use crate::{
    api::{ApiError, Status},
    config,
    files::FileStore,
    store::{Gateway, PublicationMeta, StoreError},
    utils,
};

pub mod content;
pub mod fonts;
pub mod layout;
pub mod pdf;

pub use self::{
    content::Block,
    fonts::{Face, FontError, FontSet},
    layout::{ImageAsset, PageKind},
    pdf::EmitError,
};

/// How the client intends to consume the document. Affects only
/// metadata, never the bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Inline,
    Attachment,
}

/// A rendered document, ready to stream out.
#[derive(Clone, Debug)]
pub struct RenderedDocument {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
    pub disposition: Disposition,
}

/// Decode stored image bytes into an embeddable JPEG asset.
fn load_asset(bytes: &[u8]) -> Result<ImageAsset, image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = (img.width(), img.height());

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, 90).encode_image(&img)?;

    Ok(ImageAsset { jpeg, width, height })
}

pub struct Renderer {
    fonts: FontSet,
    logo: Option<ImageAsset>,
}

impl Renderer {
    /// Build a renderer, validating font metrics once up front.
    pub fn new(cfg: &config::Render) -> Result<Renderer, FontError> {
        let fonts = FontSet::builtin()?;

        let logo = cfg.logo.as_ref().and_then(|path| {
            let bytes = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Logo not readable at {}: {}", path.display(), e);
                    return None;
                }
            };
            match load_asset(&bytes) {
                Ok(asset) => Some(asset),
                Err(e) => {
                    warn!("Logo at {} not usable: {}", path.display(), e);
                    None
                }
            }
        });

        Ok(Renderer { fonts, logo })
    }

    /// Render a publicly visible publication.
    pub fn render<S, F>(
        &self,
        store: &mut S,
        files: &F,
        publication: i32,
        disposition: Disposition,
    ) -> Result<RenderedDocument, RenderError>
    where
        S: Gateway,
        F: FileStore,
    {
        let meta = store.publication_with_meta(publication)?
            .filter(|m| !m.publication.eliminado
                && m.publication.estado
                    == crate::db::types::PublicationState::Publicado
                && !m.publication.es_privada)
            .ok_or(RenderError::NotFound)?;
        let PublicationMeta { publication, autor, tipo_publicacion, .. } = meta;

        let cover = publication.imagen_portada.as_ref().and_then(|name| {
            let bytes = match files.read(name) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Cover image {} not readable: {}", name, e);
                    return None;
                }
            };
            match load_asset(&bytes) {
                Ok(asset) => Some(asset),
                Err(e) => {
                    warn!("Cover image {} not usable: {}", name, e);
                    None
                }
            }
        });

        let blocks = content::transform(&publication.contenido);

        let doc = layout::layout(&self.fonts, layout::Input {
            titulo: publication.titulo.clone(),
            autor,
            fecha_publicacion: publication.fecha_publicacion,
            tipo_publicacion,
            resumen: publication.resumen.clone(),
            blocks,
            referencias: publication.referencias.clone(),
            cover,
            logo: self.logo.clone(),
        });

        let bytes = pdf::emit(&doc)?;

        debug!("Rendered publication {} ({} pages, {} bytes)",
            publication.id_publicacion, doc.pages.len(), bytes.len());

        Ok(RenderedDocument {
            bytes,
            filename: format!("{}.pdf", utils::slugify(&publication.titulo)),
            content_type: "application/pdf",
            disposition,
        })
    }
}

#[derive(Debug, Fail)]
pub enum RenderError {
    /// Publication is missing, deleted, private, or not yet published.
    #[fail(display = "Publicación no encontrada o no disponible")]
    NotFound,
    #[fail(display = "{}", _0)]
    Emit(#[cause] EmitError),
    #[fail(display = "{}", _0)]
    Store(#[cause] StoreError),
}

impl_from! { for RenderError ;
    EmitError => |e| RenderError::Emit(e),
    StoreError => |e| RenderError::Store(e),
}

impl ApiError for RenderError {
    fn status(&self) -> Status {
        match self {
            RenderError::NotFound => Status::NotFound,
            _ => Status::InternalServerError,
        }
    }

    fn code(&self) -> Option<&str> {
        match self {
            RenderError::NotFound => Some("publication:not-found"),
            _ => None,
        }
    }
}
