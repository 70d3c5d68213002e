//! Symbolic reference (`cref`) parsing and resolution.
//!
//! A reference looks like `M:Acme.Widget.Resize(System.Int32)`: a kind
//! prefix, a dotted path, an optional double-backtick arity marker and an
//! optional parameter list. Resolution never fails loudly: anything that cannot be
//! matched against the metadata degrades to literal text.

use crate::document::Inline;
use crate::metadata::{MemberDescriptor, MemberKind, Metadata, TypeDescriptor};

/// Kind prefix of a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Type,
    Method,
    Field,
    Property,
    Event,
}

impl RefKind {
    fn from_prefix(c: char) -> Option<Self> {
        match c {
            'T' => Some(RefKind::Type),
            'M' => Some(RefKind::Method),
            'F' => Some(RefKind::Field),
            'P' => Some(RefKind::Property),
            'E' => Some(RefKind::Event),
            _ => None,
        }
    }

    fn member_kind(self) -> Option<MemberKind> {
        match self {
            RefKind::Field => Some(MemberKind::Field),
            RefKind::Property => Some(MemberKind::Property),
            RefKind::Event => Some(MemberKind::Event),
            RefKind::Method => Some(MemberKind::Method),
            RefKind::Type => None,
        }
    }
}

/// A parsed reference, ready for lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolRef {
    Type {
        path: String,
    },
    Member {
        kind: RefKind,
        type_path: String,
        name: String,
    },
    Method {
        type_path: String,
        name: String,
        param_count: usize,
        generic_count: usize,
    },
}

impl SymbolRef {
    /// Parse a raw reference. `None` for malformed input.
    pub fn parse(cref: &str) -> Option<Self> {
        let mut chars = cref.chars();
        let kind = chars.next().and_then(RefKind::from_prefix)?;
        if chars.next() != Some(':') || cref.len() < 3 {
            return None;
        }
        let path = &cref[2..];

        match kind {
            RefKind::Type => Some(SymbolRef::Type {
                path: path.to_string(),
            }),
            RefKind::Method => parse_method(path),
            RefKind::Field | RefKind::Property | RefKind::Event => {
                let (type_path, name) = path.rsplit_once('.')?;
                Some(SymbolRef::Member {
                    kind,
                    type_path: type_path.to_string(),
                    name: name.to_string(),
                })
            }
        }
    }
}

/// Split `Ns.Type.Name``2(A,B)` into owner, name, arity and parameter count.
fn parse_method(path: &str) -> Option<SymbolRef> {
    let paren = path.find('(');
    let head = &path[..paren.unwrap_or(path.len())];

    let param_count = match paren {
        Some(pos) => {
            let list = path[pos + 1..].trim_end_matches(')');
            if list.trim().is_empty() {
                0
            } else {
                list.matches(',').count() + 1
            }
        }
        None => 0,
    };

    let (name_end, generic_count) = match head.find("``") {
        Some(pos) => {
            let digits: String = head[pos + 2..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            (pos, digits.parse().unwrap_or(0))
        }
        None => (head.len(), 0),
    };

    let dot = head[..name_end].rfind('.')?;
    let type_path = &head[..dot];
    let name = head[dot + 1..name_end].replace('#', ".");
    if type_path.is_empty() || name.is_empty() {
        return None;
    }

    Some(SymbolRef::Method {
        type_path: type_path.to_string(),
        name,
        param_count,
        generic_count,
    })
}

/// A resolved reference target.
#[derive(Debug, Clone, Copy)]
pub enum Symbol<'a> {
    Type(&'a TypeDescriptor),
    Member(&'a TypeDescriptor, &'a MemberDescriptor),
}

impl Symbol<'_> {
    pub fn display_name(&self) -> String {
        match self {
            Symbol::Type(ty) => ty.display_name(),
            Symbol::Member(ty, member) => {
                format!("{}.{}", ty.display_name(), member.display_name(ty))
            }
        }
    }
}

/// Builds links to resolved symbols; supplied by the page layer.
pub trait LinkBuilder {
    fn build_link(&self, symbol: Symbol<'_>, text: Option<&str>) -> Inline;
}

/// Resolves references against the metadata universe.
pub struct Resolver<'a> {
    metadata: &'a Metadata,
    links: &'a dyn LinkBuilder,
}

impl<'a> Resolver<'a> {
    pub fn new(metadata: &'a Metadata, links: &'a dyn LinkBuilder) -> Self {
        Self { metadata, links }
    }

    pub fn links(&self) -> &'a dyn LinkBuilder {
        self.links
    }

    /// Resolve a raw reference to a link, or literal text when it cannot be
    /// matched. The fallback shows `text`, else the raw reference verbatim.
    pub fn resolve(&self, cref: &str, text: Option<&str>) -> Inline {
        match self.lookup(cref) {
            Some(symbol) => self.links.build_link(symbol, text),
            None => {
                log::debug!("unresolved reference: {}", cref);
                Inline::text(text.unwrap_or(cref))
            }
        }
    }

    /// Find the symbol a reference points at.
    pub fn lookup(&self, cref: &str) -> Option<Symbol<'a>> {
        match SymbolRef::parse(cref)? {
            SymbolRef::Type { path } => self.metadata.find_type(&path).map(Symbol::Type),
            SymbolRef::Member {
                kind,
                type_path,
                name,
            } => {
                // Same-named members of another kind are a fallback
                let ty = self.metadata.find_type(&type_path)?;
                let candidates = ty.find_members(&name);
                let member = candidates
                    .iter()
                    .copied()
                    .find(|m| kind.member_kind() == Some(m.kind))
                    .or_else(|| candidates.first().copied())?;
                Some(Symbol::Member(ty, member))
            }
            SymbolRef::Method {
                type_path,
                name,
                param_count,
                generic_count,
            } => {
                let ty = self.metadata.find_type(&type_path)?;
                let candidates = ty.find_members(&name);
                let best = candidates.iter().copied().find(|m| {
                    (m.generic_params.is_empty() || m.generic_params.len() == generic_count)
                        && m.parameters.len() == param_count
                });
                let member = best.or_else(|| candidates.first().copied())?;
                Some(Symbol::Member(ty, member))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::tests::{member, method, type_desc};
    use crate::metadata::MemberKind;

    /// Links to `#<member id>` so tests can see which overload was chosen.
    struct IdLinks;

    impl LinkBuilder for IdLinks {
        fn build_link(&self, symbol: Symbol<'_>, text: Option<&str>) -> Inline {
            let dest = match symbol {
                Symbol::Type(ty) => ty.id(),
                Symbol::Member(_, m) => m.id.clone(),
            };
            let label = text.map(str::to_string).unwrap_or_else(|| symbol.display_name());
            Inline::link(vec![Inline::text(label)], dest)
        }
    }

    fn universe() -> Metadata {
        let mut map2 = method("Map", "M:Foo.Map``2(``0)", &["System.Object"]);
        map2.generic_params = vec!["T".to_string(), "U".to_string()];
        let mut map1 = method("Map", "M:Foo.Map``1(``0)", &["System.Object"]);
        map1.generic_params = vec!["T".to_string()];
        Metadata::new(
            "test",
            vec![
                type_desc(
                    "",
                    "Foo",
                    vec![
                        method("Bar", "M:Foo.Bar", &[]),
                        method("Bar", "M:Foo.Bar(System.Int32)", &["System.Int32"]),
                        method("Baz", "M:Foo.Baz(System.Int32)", &["System.Int32"]),
                        method(".ctor", "M:Foo.#ctor", &[]),
                        map2,
                        map1,
                        member(MemberKind::Property, "Size", "P:Foo.Size"),
                        member(MemberKind::Field, "count", "F:Foo.count"),
                    ],
                ),
                type_desc("Acme", "Outer.Inner", vec![]),
            ],
        )
    }

    fn dest(inline: &Inline) -> Option<&str> {
        match inline {
            Inline::Link { destination, .. } => Some(destination),
            _ => None,
        }
    }

    #[test]
    fn parse_method_reference() {
        assert_eq!(
            SymbolRef::parse("M:Acme.Widget.Resize(System.Int32,System.String)"),
            Some(SymbolRef::Method {
                type_path: "Acme.Widget".to_string(),
                name: "Resize".to_string(),
                param_count: 2,
                generic_count: 0,
            })
        );
    }

    #[test]
    fn parse_empty_parameter_list() {
        match SymbolRef::parse("M:Foo.Bar()") {
            Some(SymbolRef::Method { param_count, .. }) => assert_eq!(param_count, 0),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_generic_arity() {
        assert_eq!(
            SymbolRef::parse("M:Acme.List`1.ConvertAll``1(System.Converter{`0,``0})"),
            Some(SymbolRef::Method {
                type_path: "Acme.List`1".to_string(),
                name: "ConvertAll".to_string(),
                // comma inside the generic argument is counted
                param_count: 2,
                generic_count: 1,
            })
        );
        assert_eq!(
            SymbolRef::parse("M:Foo.Map``2"),
            Some(SymbolRef::Method {
                type_path: "Foo".to_string(),
                name: "Map".to_string(),
                param_count: 0,
                generic_count: 2,
            })
        );
    }

    #[test]
    fn parse_constructor_name() {
        match SymbolRef::parse("M:Foo.#ctor(System.Int32)") {
            Some(SymbolRef::Method { name, type_path, .. }) => {
                assert_eq!(name, ".ctor");
                assert_eq!(type_path, "Foo");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn parse_rejects_malformed() {
        assert_eq!(SymbolRef::parse(""), None);
        assert_eq!(SymbolRef::parse("T:"), None);
        assert_eq!(SymbolRef::parse("X:Foo"), None);
        assert_eq!(SymbolRef::parse("TFoo"), None);
        assert_eq!(SymbolRef::parse("!:Foo"), None);
        assert_eq!(SymbolRef::parse("https://example.com"), None);
    }

    #[test]
    fn malformed_falls_back_to_raw_text() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        assert_eq!(resolver.resolve("X:Foo", None), Inline::text("X:Foo"));
        assert_eq!(resolver.resolve("T", None), Inline::text("T"));
        assert_eq!(
            resolver.resolve("X:Foo", Some("the foo")),
            Inline::text("the foo")
        );
    }

    #[test]
    fn unresolvable_keeps_prefix() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        assert_eq!(
            resolver.resolve("T:Missing.Type", None),
            Inline::text("T:Missing.Type")
        );
        assert_eq!(
            resolver.resolve("M:Missing.Bar(System.Int32)", None),
            Inline::text("M:Missing.Bar(System.Int32)")
        );
        assert_eq!(
            resolver.resolve("M:Foo.Nope", Some("nope")),
            Inline::text("nope")
        );
    }

    #[test]
    fn overload_by_parameter_count() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        let link = resolver.resolve("M:Foo.Bar(System.Int32)", None);
        assert_eq!(dest(&link), Some("M:Foo.Bar(System.Int32)"));
        let link = resolver.resolve("M:Foo.Bar", None);
        assert_eq!(dest(&link), Some("M:Foo.Bar"));
    }

    #[test]
    fn missing_zero_arg_falls_back_to_first_candidate() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        let link = resolver.resolve("M:Foo.Baz", None);
        assert_eq!(dest(&link), Some("M:Foo.Baz(System.Int32)"));
    }

    #[test]
    fn overload_by_generic_arity() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        let link = resolver.resolve("M:Foo.Map``1(``0)", None);
        assert_eq!(dest(&link), Some("M:Foo.Map``1(``0)"));
        let link = resolver.resolve("M:Foo.Map``2(``0)", None);
        assert_eq!(dest(&link), Some("M:Foo.Map``2(``0)"));
    }

    #[test]
    fn constructor_reference() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        let link = resolver.resolve("M:Foo.#ctor", None);
        assert_eq!(dest(&link), Some("M:Foo.#ctor"));
    }

    #[test]
    fn field_and_property_references() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        assert_eq!(dest(&resolver.resolve("P:Foo.Size", None)), Some("P:Foo.Size"));
        assert_eq!(dest(&resolver.resolve("F:Foo.count", None)), Some("F:Foo.count"));
        assert_eq!(
            resolver.resolve("E:Foo.Changed", None),
            Inline::text("E:Foo.Changed")
        );
    }

    #[test]
    fn member_kind_is_preferred() {
        let meta = Metadata::new(
            "test",
            vec![type_desc(
                "",
                "Foo",
                vec![
                    member(MemberKind::Field, "Value", "F:Foo.Value"),
                    member(MemberKind::Property, "Value", "P:Foo.Value"),
                ],
            )],
        );
        let resolver = Resolver::new(&meta, &IdLinks);
        assert_eq!(dest(&resolver.resolve("P:Foo.Value", None)), Some("P:Foo.Value"));
        assert_eq!(dest(&resolver.resolve("E:Foo.Value", None)), Some("F:Foo.Value"));
    }

    #[test]
    fn type_reference_and_display_text() {
        let meta = universe();
        let resolver = Resolver::new(&meta, &IdLinks);
        assert_eq!(
            resolver.resolve("T:Acme.Outer.Inner", None),
            Inline::link(vec![Inline::text("Outer.Inner")], "T:Acme.Outer.Inner")
        );
        assert_eq!(
            resolver.resolve("T:Foo", Some("the Foo")),
            Inline::link(vec![Inline::text("the Foo")], "T:Foo")
        );
    }
}
