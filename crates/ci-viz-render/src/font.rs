//! System font faces used for text measurement.
//!
//! Faces come from the same `fontdb` database `usvg` rasterizes with, so
//! layout widths match what the PNG output draws. The system scan runs once
//! per process; faces are cached per font-family list.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use ab_glyph::{FontArc, FontVec};
use usvg::fontdb::{Database, Family, Query, Stretch, Style, Weight};

use crate::primitives::FontWeight;

/// Regular and bold faces resolved for one font-family list.
///
/// Either face is `None` when nothing on the system matches.
#[derive(Clone, Default)]
pub struct FontHandle {
    pub regular: Option<FontArc>,
    pub bold: Option<FontArc>,
}

impl fmt::Debug for FontHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontHandle")
            .field("regular", &self.regular.is_some())
            .field("bold", &self.bold.is_some())
            .finish()
    }
}

impl FontHandle {
    /// Resolve faces for a CSS-style family list against `db`.
    pub fn from_database(db: &Database, families: &str) -> Self {
        let names = parse_families(families);
        Self { regular: load_face(db, &names, Weight::NORMAL), bold: load_face(db, &names, Weight::BOLD) }
    }

    /// Face for `weight`; bold falls back to regular.
    pub fn select(&self, weight: FontWeight) -> Option<&FontArc> {
        match weight {
            FontWeight::Bold => self.bold.as_ref().or(self.regular.as_ref()),
            FontWeight::Regular => self.regular.as_ref(),
        }
    }
}

/// Faces for `families` from the system font database.
pub fn system_fonts(families: &str) -> Arc<FontHandle> {
    static DB: OnceLock<Database> = OnceLock::new();
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<FontHandle>>>> = OnceLock::new();

    let cache = CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    // A poisoned cache only means another thread panicked mid-insert.
    let mut cache = cache.lock().unwrap_or_else(|p| p.into_inner());
    if let Some(h) = cache.get(families) {
        return Arc::clone(h);
    }
    let db = DB.get_or_init(|| {
        let mut db = Database::new();
        db.load_system_fonts();
        db
    });
    let handle = Arc::new(FontHandle::from_database(db, families));
    cache.insert(families.to_string(), Arc::clone(&handle));
    handle
}

/// `"DejaVu Sans, 'Open Sans', sans-serif"` → named families plus generics.
fn parse_families(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().trim_matches(|c| c == '"' || c == '\'').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn family(name: &str) -> Family<'_> {
    match name.to_ascii_lowercase().as_str() {
        "sans-serif" => Family::SansSerif,
        "serif" => Family::Serif,
        "monospace" => Family::Monospace,
        "cursive" => Family::Cursive,
        "fantasy" => Family::Fantasy,
        _ => Family::Name(name),
    }
}

fn load_face(db: &Database, names: &[String], weight: Weight) -> Option<FontArc> {
    let families: Vec<Family<'_>> = names.iter().map(|n| family(n)).collect();
    let query = Query { families: &families, weight, stretch: Stretch::Normal, style: Style::Normal };
    let id = db.query(&query)?;
    db.with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index).ok())
        .flatten()
        .map(FontArc::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_list_parsing() {
        assert_eq!(
            parse_families("DejaVu Sans, 'Open Sans' ,\"Arial\", sans-serif,"),
            vec!["DejaVu Sans", "Open Sans", "Arial", "sans-serif"]
        );
    }

    #[test]
    fn empty_database_has_no_faces() {
        let h = FontHandle::from_database(&Database::new(), "sans-serif");
        assert!(h.regular.is_none());
        assert!(h.select(FontWeight::Bold).is_none());
    }

    #[test]
    fn cache_returns_same_handle() {
        let a = system_fonts("DejaVu Sans, sans-serif");
        let b = system_fonts("DejaVu Sans, sans-serif");
        assert!(Arc::ptr_eq(&a, &b));
    }
}
