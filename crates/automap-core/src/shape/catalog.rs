//! Shape provider and the in-memory shape catalog
//!
//! The mapper never inspects host types. Everything it knows about a class
//! (members, declared types, accessors, constructor, discriminator) comes
//! from a [`ShapeProvider`]. [`ShapeCatalog`] is the provided implementation,
//! filled programmatically or from a serialized [`ShapeDocument`].
//!
//! Copyright (c) 2025 Automap Team
//! Licensed under the Apache-2.0 license

use super::{ShapeId, TypeDescriptor};
use crate::{Error, Result, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// A readable method of a class, called with the whole instance
pub type MethodFn = Arc<dyn Fn(&Value) -> anyhow::Result<Value> + Send + Sync>;

/// Member visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

/// How a member is read from an instance
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadAccess {
    #[default]
    Property,
    /// Readable only through a registered method
    Method(String),
    None,
}

/// How a member is written on an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAccess {
    #[default]
    Property,
    /// Writable only at construction time
    Constructor,
    None,
}

/// Declaration of one class member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberDecl {
    pub name: String,
    /// Declared type; `None` when undeclared
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub ty: Option<TypeDescriptor>,
    #[serde(default)]
    pub read: ReadAccess,
    #[serde(default)]
    pub write: WriteAccess,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub ignore: bool,
    /// Name of the source member to read instead of the same-named one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map_from: Option<String>,
}

impl MemberDecl {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            ty: Some(ty),
            ..Self::untyped(name)
        }
    }

    /// A member without a declared type
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            read: ReadAccess::Property,
            write: WriteAccess::Property,
            groups: Vec::new(),
            max_depth: None,
            visibility: Visibility::Public,
            ignore: false,
            map_from: None,
        }
    }

    /// Readable only through the named method
    pub fn via_method(mut self, method: impl Into<String>) -> Self {
        self.read = ReadAccess::Method(method.into());
        self
    }

    pub fn constructor_only(mut self) -> Self {
        self.write = WriteAccess::Constructor;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.write = WriteAccess::None;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.read = ReadAccess::None;
        self
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    pub fn map_from(mut self, source_member: impl Into<String>) -> Self {
        self.map_from = Some(source_member.into());
        self
    }

    /// Declared descriptors, unions expanded
    pub fn descriptors(&self) -> Vec<TypeDescriptor> {
        self.ty.as_ref().map(TypeDescriptor::flatten).unwrap_or_default()
    }

    pub fn is_readable(&self) -> bool {
        self.read != ReadAccess::None
    }

    pub fn is_writable(&self) -> bool {
        self.write != WriteAccess::None
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

/// A constructor parameter. Parameters bind to the same-named member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstructorParam {
    pub name: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

fn default_required() -> bool {
    true
}

impl ConstructorParam {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, default: Option<Value>) -> Self {
        Self {
            name: name.into(),
            required: false,
            default,
        }
    }

    /// Whether construction must fail when no value is available
    pub fn is_mandatory(&self) -> bool {
        self.required && self.default.is_none()
    }
}

/// Polymorphic subtype selection by the value of one member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discriminator {
    pub property: String,
    /// Discriminator value to concrete class name
    pub mapping: BTreeMap<String, String>,
}

impl Discriminator {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            mapping: BTreeMap::new(),
        }
    }

    pub fn subtype(mut self, value: impl Into<String>, class: impl Into<String>) -> Self {
        self.mapping.insert(value.into(), class.into());
        self
    }

    /// Discriminator value identifying a class
    pub fn value_of(&self, class: &str) -> Option<&str> {
        self.mapping
            .iter()
            .find(|(_, c)| c.as_str() == class)
            .map(|(v, _)| v.as_str())
    }
}

/// Declaration of a class or record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassShape {
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberDecl>,
    /// Constructor parameters; `None` when instances are created empty
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constructor: Option<Vec<ConstructorParam>>,
    /// Field values every new instance starts from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prototype: Option<BTreeMap<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,
    /// Opt-in for mapping non-public members
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub map_private_members: bool,
}

impl ClassShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            constructor: None,
            prototype: None,
            discriminator: None,
            map_private_members: false,
        }
    }

    pub fn member(mut self, member: MemberDecl) -> Self {
        self.members.push(member);
        self
    }

    pub fn constructor(mut self, params: Vec<ConstructorParam>) -> Self {
        self.constructor = Some(params);
        self
    }

    pub fn prototype(mut self, fields: BTreeMap<String, Value>) -> Self {
        self.prototype = Some(fields);
        self
    }

    pub fn discriminator(mut self, discriminator: Discriminator) -> Self {
        self.discriminator = Some(discriminator);
        self
    }

    pub fn with_private_members(mut self) -> Self {
        self.map_private_members = true;
        self
    }

    pub fn id(&self) -> ShapeId {
        ShapeId::Class(self.name.clone())
    }

    pub fn find_member(&self, name: &str) -> Option<&MemberDecl> {
        self.members.iter().find(|m| m.name == name)
    }

    pub fn constructor_param(&self, name: &str) -> Option<&ConstructorParam> {
        self.constructor
            .as_ref()
            .and_then(|params| params.iter().find(|p| p.name == name))
    }

    fn validate(&self) -> Result<()> {
        if self.name == "map" || self.name == "dynamic" || self.name.trim().is_empty() {
            return Err(Error::configuration(format!(
                "'{}' is not a valid class name",
                self.name
            )));
        }
        let mut seen = HashSet::new();
        for member in &self.members {
            if !seen.insert(member.name.as_str()) {
                return Err(Error::configuration(format!(
                    "Class {} declares member '{}' twice",
                    self.name, member.name
                )));
            }
        }
        for param in self.constructor.iter().flatten() {
            if self.find_member(&param.name).is_none() {
                return Err(Error::configuration(format!(
                    "Constructor parameter '{}' of {} does not name a member",
                    param.name, self.name
                )));
            }
        }
        Ok(())
    }
}

/// A case of an enumeration, optionally backed by a scalar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumCase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Declaration of an enumeration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumShape {
    pub name: String,
    #[serde(default)]
    pub cases: Vec<EnumCase>,
}

impl EnumShape {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cases: Vec::new(),
        }
    }

    pub fn case(mut self, name: impl Into<String>) -> Self {
        self.cases.push(EnumCase {
            name: name.into(),
            value: None,
        });
        self
    }

    pub fn backed_case(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.cases.push(EnumCase {
            name: name.into(),
            value: Some(value.into()),
        });
        self
    }

    pub fn case_by_name(&self, name: &str) -> Option<&EnumCase> {
        self.cases.iter().find(|c| c.name == name)
    }

    pub fn case_by_value(&self, value: &Value) -> Option<&EnumCase> {
        self.cases.iter().find(|c| c.value.as_ref() == Some(value))
    }

    pub fn is_backed(&self) -> bool {
        self.cases.iter().any(|c| c.value.is_some())
    }
}

/// Source of structural type information
pub trait ShapeProvider: Send + Sync {
    /// Look up a class by name
    fn class(&self, name: &str) -> Option<&ClassShape>;

    /// Look up an enumeration by name
    fn enumeration(&self, name: &str) -> Option<&EnumShape>;

    /// Look up a readable method of a class
    fn method(&self, class: &str, method: &str) -> Option<MethodFn>;

    /// The (property, value) pair identifying a class inside a discriminated hierarchy
    fn discriminator_value(&self, _class: &str) -> Option<(String, String)> {
        None
    }
}

/// Serialized form of a catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDocument {
    #[serde(default)]
    pub classes: Vec<ClassShape>,
    #[serde(default)]
    pub enums: Vec<EnumShape>,
}

impl ShapeDocument {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// In-memory [`ShapeProvider`]
#[derive(Clone, Default)]
pub struct ShapeCatalog {
    classes: BTreeMap<String, ClassShape>,
    enums: BTreeMap<String, EnumShape>,
    methods: HashMap<(String, String), MethodFn>,
}

impl fmt::Debug for ShapeCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShapeCatalog")
            .field("classes", &self.classes.keys().collect::<Vec<_>>())
            .field("enums", &self.enums.keys().collect::<Vec<_>>())
            .field("methods", &self.methods.len())
            .finish()
    }
}

impl ShapeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from a document, validating every declaration
    pub fn from_document(document: ShapeDocument) -> Result<Self> {
        let mut catalog = Self::new();
        for class in document.classes {
            catalog.add_class(class)?;
        }
        for enumeration in document.enums {
            catalog.add_enum(enumeration)?;
        }
        catalog.validate()?;
        Ok(catalog)
    }

    /// Export the declarations (methods are not serializable)
    pub fn to_document(&self) -> ShapeDocument {
        ShapeDocument {
            classes: self.classes.values().cloned().collect(),
            enums: self.enums.values().cloned().collect(),
        }
    }

    pub fn add_class(&mut self, class: ClassShape) -> Result<()> {
        class.validate()?;
        if self.classes.contains_key(&class.name) {
            return Err(Error::configuration(format!(
                "Class {} is declared twice",
                class.name
            )));
        }
        self.classes.insert(class.name.clone(), class);
        Ok(())
    }

    /// Builder-style [`add_class`](Self::add_class)
    pub fn with_class(mut self, class: ClassShape) -> Result<Self> {
        self.add_class(class)?;
        Ok(self)
    }

    pub fn add_enum(&mut self, enumeration: EnumShape) -> Result<()> {
        if self.enums.contains_key(&enumeration.name) {
            return Err(Error::configuration(format!(
                "Enum {} is declared twice",
                enumeration.name
            )));
        }
        self.enums.insert(enumeration.name.clone(), enumeration);
        Ok(())
    }

    /// Builder-style [`add_enum`](Self::add_enum)
    pub fn with_enum(mut self, enumeration: EnumShape) -> Result<Self> {
        self.add_enum(enumeration)?;
        Ok(self)
    }

    /// Register the implementation of a method-readable member
    pub fn register_method<F>(&mut self, class: impl Into<String>, method: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.methods.insert((class.into(), method.into()), Arc::new(f));
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    /// Check cross references: discriminator subtypes must be declared classes
    pub fn validate(&self) -> Result<()> {
        for class in self.classes.values() {
            if let Some(discriminator) = &class.discriminator {
                for subtype in discriminator.mapping.values() {
                    if !self.classes.contains_key(subtype) {
                        return Err(Error::UnknownShape {
                            name: subtype.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl ShapeProvider for ShapeCatalog {
    fn class(&self, name: &str) -> Option<&ClassShape> {
        self.classes.get(name)
    }

    fn enumeration(&self, name: &str) -> Option<&EnumShape> {
        self.enums.get(name)
    }

    fn method(&self, class: &str, method: &str) -> Option<MethodFn> {
        self.methods
            .get(&(class.to_string(), method.to_string()))
            .cloned()
    }

    fn discriminator_value(&self, class: &str) -> Option<(String, String)> {
        self.classes.values().find_map(|parent| {
            let discriminator = parent.discriminator.as_ref()?;
            discriminator
                .value_of(class)
                .map(|value| (discriminator.property.clone(), value.to_string()))
        })
    }
}
