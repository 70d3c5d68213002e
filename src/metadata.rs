//! Read-only description of types and their members.
//!
//! Loaded from a JSON dump produced by an introspection tool. Type
//! references (base types, parameter types, …) are paths into the same
//! universe and are looked up on demand.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;

/// Kind of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl TypeKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Interface => "interface",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

/// Kind of a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberKind {
    Field,
    Property,
    Constructor,
    Method,
    Event,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Internal,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::Protected)
    }
}

/// `[Obsolete]` marker with its optional message.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Deprecation {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_path: String,
    /// `ref` / `out` parameter
    #[serde(default)]
    pub by_ref: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberDescriptor {
    pub kind: MemberKind,
    /// Metadata name (`.ctor` for constructors)
    pub name: String,
    /// Stable documentation identifier, e.g. `M:Acme.Widget.Resize(System.Int32)`
    pub id: String,
    #[serde(default)]
    pub signature: String,
    /// Return type for methods, value type for fields/properties/events
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub parameters: Vec<Parameter>,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deprecated: Option<Deprecation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeDescriptor {
    #[serde(default)]
    pub namespace: String,
    /// Metadata name, with backtick arity (`Widget`1`) and `.` for nesting
    pub name: String,
    pub kind: TypeKind,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub base_type: Option<String>,
    #[serde(default)]
    pub interfaces: Vec<String>,
    #[serde(default)]
    pub generic_params: Vec<String>,
    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub deprecated: Option<Deprecation>,
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Fully qualified path, the key used by `T:` references.
    pub fn path(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    pub fn id(&self) -> String {
        format!("T:{}", self.path())
    }

    /// Name without namespace or arity suffix (`Widget`).
    pub fn simple_name(&self) -> &str {
        let name = self.name.rsplit('.').next().unwrap_or(&self.name);
        strip_arity(name)
    }

    /// Human-readable name, e.g. `Widget<T>` or `Outer.Inner`.
    pub fn display_name(&self) -> String {
        let base: Vec<&str> = self.name.split('.').map(strip_arity).collect();
        let base = base.join(".");
        if self.generic_params.is_empty() {
            base
        } else {
            format!("{}<{}>", base, self.generic_params.join(", "))
        }
    }

    /// Exact-name member lookup; overloads yield several matches.
    pub fn find_members(&self, name: &str) -> Vec<&MemberDescriptor> {
        self.members.iter().filter(|m| m.name == name).collect()
    }

    pub fn members_of(&self, kind: MemberKind) -> impl Iterator<Item = &MemberDescriptor> {
        self.members.iter().filter(move |m| m.kind == kind)
    }
}

impl MemberDescriptor {
    pub fn is_constructor(&self) -> bool {
        self.kind == MemberKind::Constructor || self.name == ".ctor" || self.name == ".cctor"
    }

    /// Name shown to readers: constructors take the owning type's name.
    pub fn display_name(&self, owner: &TypeDescriptor) -> String {
        if self.is_constructor() {
            return owner.simple_name().to_string();
        }
        let name = self.name.rsplit('.').next().unwrap_or(&self.name);
        if self.generic_params.is_empty() {
            name.to_string()
        } else {
            format!("{}<{}>", name, self.generic_params.join(", "))
        }
    }

    /// Section heading; methods and constructors include parameter types
    /// so overloads get distinct anchors.
    pub fn heading(&self, owner: &TypeDescriptor) -> String {
        let name = self.display_name(owner);
        match self.kind {
            MemberKind::Method | MemberKind::Constructor => {
                let params: Vec<String> = self
                    .parameters
                    .iter()
                    .map(|p| {
                        let ty = display_type_name(&p.type_path);
                        if p.by_ref {
                            format!("ref {}", ty)
                        } else {
                            ty
                        }
                    })
                    .collect();
                format!("{}({})", name, params.join(", "))
            }
            _ => name,
        }
    }

    pub fn is_backing_field(&self) -> bool {
        self.kind == MemberKind::Field
            && (self.name.ends_with(">k__BackingField")
                || self
                    .attributes
                    .iter()
                    .any(|a| a.ends_with("CompilerGeneratedAttribute")))
    }
}

/// Keyword aliases for well-known system types.
const TYPE_ALIASES: &[(&str, &str)] = &[
    ("System.Boolean", "bool"),
    ("System.Byte", "byte"),
    ("System.SByte", "sbyte"),
    ("System.Char", "char"),
    ("System.Decimal", "decimal"),
    ("System.Double", "double"),
    ("System.Single", "float"),
    ("System.Int16", "short"),
    ("System.UInt16", "ushort"),
    ("System.Int32", "int"),
    ("System.UInt32", "uint"),
    ("System.Int64", "long"),
    ("System.UInt64", "ulong"),
    ("System.Object", "object"),
    ("System.String", "string"),
    ("System.Void", "void"),
];

/// Strip a trailing backtick arity marker (`List`1` → `List`).
pub fn strip_arity(name: &str) -> &str {
    match name.find('`') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Short display form of a type path: keyword alias, or the last path
/// segment without its arity suffix. Array/by-ref decorations are kept.
pub fn display_type_name(path: &str) -> String {
    let core = path.trim_end_matches(['[', ']', '&', '*']);
    let suffix = &path[core.len()..];
    let suffix = suffix.replace('&', "");
    if let Some((_, alias)) = TYPE_ALIASES.iter().find(|(full, _)| *full == core) {
        return format!("{}{}", alias, suffix);
    }
    let last = core.rsplit('.').next().unwrap_or(core);
    format!("{}{}", strip_arity(last), suffix)
}

#[derive(Debug, Deserialize)]
struct MetadataDump {
    #[serde(default)]
    assembly: String,
    #[serde(default)]
    types: Vec<TypeDescriptor>,
}

/// The metadata universe: every introspected type, indexed by path.
#[derive(Debug, Default)]
pub struct Metadata {
    pub assembly: String,
    types: Vec<TypeDescriptor>,
    index: HashMap<String, usize>,
}

impl Metadata {
    pub fn new(assembly: impl Into<String>, types: Vec<TypeDescriptor>) -> Self {
        let index = types
            .iter()
            .enumerate()
            .map(|(i, t)| (t.path(), i))
            .collect();
        Self {
            assembly: assembly.into(),
            types,
            index,
        }
    }

    /// Parse a JSON metadata dump.
    pub fn from_json(input: &str) -> Result<Self> {
        let dump: MetadataDump =
            serde_json::from_str(input).context("invalid metadata dump")?;
        Ok(Self::new(dump.assembly, dump.types))
    }

    /// Exact path lookup (`Acme.Widget`1`).
    pub fn find_type(&self, path: &str) -> Option<&TypeDescriptor> {
        self.index.get(path).map(|&i| &self.types[i])
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    /// Apply a policy to the universe, keeping only what it admits.
    pub fn retain<F, G>(&mut self, mut keep_type: F, mut keep_member: G)
    where
        F: FnMut(&TypeDescriptor) -> bool,
        G: FnMut(&MemberDescriptor) -> bool,
    {
        let mut types = std::mem::take(&mut self.types);
        types.retain(|t| keep_type(t));
        for ty in &mut types {
            ty.members.retain(|m| keep_member(m));
        }
        *self = Self::new(std::mem::take(&mut self.assembly), types);
    }
}
