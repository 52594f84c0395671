//! Document-Assembly Collaborators
//!
//! Seams to the components outside the AI pipeline: the DOCX template filler,
//! the notification mailer and the municipal coat-of-arms lookup. The first
//! two are interfaces only; concrete backends live with the document service.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::constants::document as doc_constants;
use crate::types::{GeneratedRecord, Result, strip_accents};

// =============================================================================
// Template Filling
// =============================================================================

/// Request to place an image into a template placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePlacement {
    pub path: PathBuf,
    /// Target width in pixels.
    pub width: u32,
    /// Keep the source aspect ratio when scaling.
    pub preserve_ratio: bool,
}

/// Mail-merge collaborator: receives the flat record plus an optional image
/// placement and produces the final document file.
pub trait TemplateFiller: Send + Sync {
    fn fill(
        &self,
        template: &Path,
        record: &GeneratedRecord,
        image: Option<&ImagePlacement>,
        output: &Path,
    ) -> Result<()>;
}

// =============================================================================
// Mail Notification
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub email: String,
    pub name: String,
}

/// Delivery collaborator: one message per generation run, linking every
/// produced document by kind.
pub trait Mailer: Send + Sync {
    fn send_documents(&self, recipient: &Recipient, documents: &BTreeMap<String, Url>)
    -> Result<()>;
}

// =============================================================================
// Coat of Arms Lookup
// =============================================================================

/// Normalized municipality name used as the image filename: accents folded,
/// non-alphanumerics dropped, lowercased. "São José dos Pinhais" →
/// "saojosedospinhais".
pub fn normalize_municipality(name: &str) -> String {
    strip_accents(name)
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_lowercase()
}

/// Resolve the coat-of-arms image for a municipality: the specific
/// `<normalized>.png` when present, otherwise the default image, otherwise
/// nothing (the template keeps its placeholder).
pub fn coat_of_arms_path(dir: &Path, municipality: &str) -> Option<PathBuf> {
    let specific = dir.join(format!("{}.png", normalize_municipality(municipality)));
    if specific.is_file() {
        return Some(specific);
    }

    let fallback = dir.join(doc_constants::COAT_OF_ARMS_DEFAULT);
    fallback.is_file().then_some(fallback)
}

/// Placement request for the resolved coat of arms, sized per the template
/// contract.
pub fn coat_of_arms_placement(dir: &Path, municipality: &str) -> Option<ImagePlacement> {
    coat_of_arms_path(dir, municipality).map(|path| ImagePlacement {
        path,
        width: doc_constants::COAT_OF_ARMS_WIDTH_PX,
        preserve_ratio: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn municipality_names_normalize_to_filenames() {
        assert_eq!(normalize_municipality("São Paulo"), "saopaulo");
        assert_eq!(
            normalize_municipality("São José dos Pinhais"),
            "saojosedospinhais"
        );
        assert_eq!(normalize_municipality("Brasília-DF"), "brasiliadf");
        assert_eq!(normalize_municipality("Curitiba"), "curitiba");
        assert_eq!(normalize_municipality(""), "");
    }

    #[test]
    fn specific_image_wins_over_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("curitiba.png"), b"png").unwrap();
        fs::write(dir.path().join("default.png"), b"png").unwrap();

        let path = coat_of_arms_path(dir.path(), "Curitiba").unwrap();
        assert!(path.ends_with("curitiba.png"));
    }

    #[test]
    fn missing_specific_image_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.png"), b"png").unwrap();

        let path = coat_of_arms_path(dir.path(), "Maringá").unwrap();
        assert!(path.ends_with("default.png"));
    }

    #[test]
    fn no_image_at_all_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(coat_of_arms_path(dir.path(), "Maringá").is_none());
        assert!(coat_of_arms_placement(dir.path(), "Maringá").is_none());
    }

    #[test]
    fn placement_uses_the_template_contract() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("default.png"), b"png").unwrap();

        let placement = coat_of_arms_placement(dir.path(), "Curitiba").unwrap();
        assert_eq!(placement.width, 80);
        assert!(placement.preserve_ratio);
    }
}
