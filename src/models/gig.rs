use rand::Rng;
use std::fmt::Write;

use crate::constants::gigs::SLUG_SUFFIX_BYTES;
use crate::entities::gigs;

#[derive(Debug, Clone, PartialEq)]
pub struct Gig {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub payment: Option<f64>,
    pub location: String,
    pub employer_id: i32,
    pub slug: String,
    pub created_at: String,
}

impl From<gigs::Model> for Gig {
    fn from(model: gigs::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            payment: model.payment,
            location: model.location,
            employer_id: model.employer_id,
            slug: model.slug,
            created_at: model.created_at,
        }
    }
}

/// Editable fields of a gig.
#[derive(Debug, Clone, PartialEq)]
pub struct GigInput {
    pub title: String,
    pub description: String,
    pub payment: Option<f64>,
    pub location: String,
}

/// Lowercase, hyphen-separated form of `title` containing only ASCII
/// letters and digits. Accented letters are transliterated first.
/// Falls back to `"gig"` when nothing survives.
#[must_use]
pub fn slugify(title: &str) -> String {
    let ascii = deunicode::deunicode(title);
    let mut slug = String::with_capacity(ascii.len());

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        slug.push_str("gig");
    }

    slug
}

/// Slug of `title` plus a short random hex suffix, e.g. `need-violin-player-3fa2c1`.
#[must_use]
pub fn generate_slug(title: &str) -> String {
    let mut rng = rand::rng();
    let bytes: [u8; SLUG_SUFFIX_BYTES] = rng.random();

    let mut slug = slugify(title);
    slug.push('-');
    for b in bytes {
        let _ = write!(slug, "{b:02x}");
    }
    slug
}
