//! Page names, heading anchors and cross-page links.

use crate::cref::{LinkBuilder, Symbol};
use crate::document::Inline;
use crate::metadata::{display_type_name, Metadata, TypeDescriptor};

/// Builds links relative to the page currently being assembled.
pub struct SiteLinks {
    current: Option<String>,
    extension: String,
}

impl SiteLinks {
    /// `current` is the path of the type whose page is being built, if any.
    pub fn new(current: Option<&str>, extension: &str) -> Self {
        Self {
            current: current.map(page_name),
            extension: extension.to_string(),
        }
    }

    /// Destination of a type's page, empty when it is the current page.
    fn page_destination(&self, type_path: &str) -> String {
        let page = page_name(type_path);
        if self.current.as_deref() == Some(page.as_str()) {
            String::new()
        } else {
            format!("{}.{}", page, self.extension)
        }
    }
}

impl LinkBuilder for SiteLinks {
    fn build_link(&self, symbol: Symbol<'_>, text: Option<&str>) -> Inline {
        let label = text
            .map(str::to_string)
            .unwrap_or_else(|| symbol.display_name());
        let destination = match symbol {
            Symbol::Type(ty) => {
                let page = self.page_destination(&ty.path());
                if page.is_empty() {
                    format!("#{}", github_slug(&type_title(ty)))
                } else {
                    page
                }
            }
            Symbol::Member(ty, member) => format!(
                "{}#{}",
                self.page_destination(&ty.path()),
                github_slug(&member.heading(ty))
            ),
        };
        Inline::link(vec![Inline::text(label)], destination)
    }
}

/// Page title of a type, e.g. `Widget<T> class`.
pub fn type_title(ty: &TypeDescriptor) -> String {
    format!("{} {}", ty.display_name(), ty.kind.display_name())
}

/// A type path as an inline: a link when the type is documented here,
/// otherwise a code span of its short name.
pub fn type_reference(metadata: &Metadata, links: &dyn LinkBuilder, path: &str) -> Inline {
    let core = path.trim_end_matches(['[', ']', '&', '*']);
    match metadata.find_type(core) {
        Some(ty) if core == path => links.build_link(Symbol::Type(ty), None),
        Some(ty) => links.build_link(Symbol::Type(ty), Some(&display_type_name(path))),
        None => Inline::code(display_type_name(path)),
    }
}

/// File stem for a type page: characters outside `[A-Za-z0-9._-]` become `-`.
pub fn page_name(type_path: &str) -> String {
    type_path
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// GitHub heading anchor slug generation.
///
/// - lowercase
/// - remove all chars that aren't alphanumeric, space, or hyphen
/// - replace spaces with hyphens
pub fn github_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() || c == ' ' || c == '-' {
            slug.push(c);
        }
    }
    slug.replace(' ', "-")
}
