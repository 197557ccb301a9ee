//! Variant naming.
//!
//! A shop image exists as five files that differ only by a one-letter tag in
//! front of the extension: `shoe.jpg` (product), `shoe-r.jpg` (related),
//! `shoe-t.jpg` (thumbnail), `shoe-p.jpg` (popup) and `shoe-o.jpg` (the
//! untouched original).

use std::path::Path;

use crate::utils::is_image_extension;

/// The role a file plays in a variant family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    Product,
    Related,
    Thumbnail,
    Popup,
    Original,
}

impl Variant {
    /// Derived variants in the order they are produced and uploaded.
    pub const DERIVED: [Variant; 4] = [
        Variant::Popup,
        Variant::Thumbnail,
        Variant::Related,
        Variant::Product,
    ];

    /// Filename tag, `None` for the canonical product name.
    pub fn tag(&self) -> Option<char> {
        match self {
            Self::Product => None,
            Self::Related => Some('r'),
            Self::Thumbnail => Some('t'),
            Self::Popup => Some('p'),
            Self::Original => Some('o'),
        }
    }

    fn from_tag(tag: char) -> Option<Self> {
        match tag.to_ascii_lowercase() {
            'r' => Some(Self::Related),
            't' => Some(Self::Thumbnail),
            'p' => Some(Self::Popup),
            'o' => Some(Self::Original),
            _ => None,
        }
    }

}

/// All five names of one image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSet {
    pub product: String,
    pub related: String,
    pub thumbnail: String,
    pub popup: String,
    pub original: String,
}

impl VariantSet {
    /// Derives the family from any member name or path.
    ///
    /// Never fails: a name without a tag is already canonical and a name
    /// without an extension gets its tag appended at the end.
    pub fn from_filename(filename: &str) -> Self {
        let (stem, extension) = split_extension(base_name(filename));
        let canonical = split_tag(stem).map(|(base, _)| base).unwrap_or(stem);

        let name = |variant: Variant| {
            let mut name = canonical.to_string();
            if let Some(tag) = variant.tag() {
                name.push('-');
                name.push(tag);
            }
            if let Some(ext) = extension {
                name.push('.');
                name.push_str(ext);
            }
            name
        };

        Self {
            product: name(Variant::Product),
            related: name(Variant::Related),
            thumbnail: name(Variant::Thumbnail),
            popup: name(Variant::Popup),
            original: name(Variant::Original),
        }
    }

    pub fn get(&self, variant: Variant) -> &str {
        match variant {
            Variant::Product => &self.product,
            Variant::Related => &self.related,
            Variant::Thumbnail => &self.thumbnail,
            Variant::Popup => &self.popup,
            Variant::Original => &self.original,
        }
    }
}

/// True for `name-p.<ext>` with a recognized image extension.
pub fn is_popup(filename: &str) -> bool {
    is_tagged_image(filename, Variant::Popup)
}

/// True for `name-o.<ext>` with a recognized image extension.
pub fn is_original(filename: &str) -> bool {
    is_tagged_image(filename, Variant::Original)
}

fn is_tagged_image(filename: &str, variant: Variant) -> bool {
    let (stem, extension) = split_extension(filename);
    extension.is_some_and(is_image_extension)
        && split_tag(stem).is_some_and(|(_, found)| found == variant)
}

fn base_name(filename: &str) -> &str {
    Path::new(filename)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(filename)
}

/// Splits at the last dot. Dotfiles like `.hidden` have no extension.
fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(index) if index > 0 => (&name[..index], Some(&name[index + 1..])),
        _ => (name, None),
    }
}

/// Splits `base-x` into `base` and the variant for tag `x`. The base must
/// not be empty.
fn split_tag(stem: &str) -> Option<(&str, Variant)> {
    let mut chars = stem.char_indices().rev();
    let (_, tag) = chars.next()?;
    let (dash_index, dash) = chars.next()?;
    if dash != '-' || dash_index == 0 {
        return None;
    }
    Variant::from_tag(tag).map(|variant| (&stem[..dash_index], variant))
}
