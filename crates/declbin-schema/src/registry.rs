use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::enum_def::EnumDef;
use crate::error::SchemaError;
use crate::layout::BinaryLayout;
use crate::schema::StructSchema;
use crate::types::TypeRef;
use crate::value::{Record, Value};

/// A named type the decoder can dispatch to.
#[derive(Clone, Debug)]
pub enum TypeDef {
    Struct(Arc<StructSchema>),
    Enum(Arc<EnumDef>),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Struct(schema) => schema.name(),
            Self::Enum(def) => def.name(),
        }
    }
}

/// Named structured types and enums, looked up by [`TypeRef::Named`].
///
/// Types are stored by name, so a structure may refer to itself or to
/// types registered after it. Registration order is kept for listings.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    types: HashMap<Arc<str>, TypeDef>,
    order: Vec<Arc<str>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding `T` and everything it depends on.
    ///
    /// # Errors
    ///
    /// Any error from building the schemas involved.
    pub fn of<T: BinaryLayout>() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        registry.register::<T>()?;
        Ok(registry)
    }

    fn insert(&mut self, name: Arc<str>, def: TypeDef) -> Result<(), SchemaError> {
        if self.types.contains_key(&name) {
            return Err(SchemaError::DuplicateType {
                name: name.to_string(),
            });
        }
        self.order.push(Arc::clone(&name));
        self.types.insert(name, def);
        Ok(())
    }

    /// # Errors
    ///
    /// [`SchemaError::DuplicateType`] if the name is taken.
    pub fn register_struct(&mut self, schema: StructSchema) -> Result<(), SchemaError> {
        self.insert(schema.shared_name(), TypeDef::Struct(Arc::new(schema)))
    }

    /// # Errors
    ///
    /// [`SchemaError::DuplicateType`] if the name is taken.
    pub fn register_enum(&mut self, def: EnumDef) -> Result<(), SchemaError> {
        let name: Arc<str> = Arc::from(def.name());
        self.insert(name, TypeDef::Enum(Arc::new(def)))
    }

    /// Register a typed layout and its dependencies.
    ///
    /// Registering the same type again is a no-op. The type is inserted
    /// before its dependencies so recursive layouts terminate.
    ///
    /// # Errors
    ///
    /// Any error from building the schemas involved.
    pub fn register<T: BinaryLayout>(&mut self) -> Result<(), SchemaError> {
        if self.types.contains_key(T::NAME) {
            return Ok(());
        }
        self.register_struct(T::schema()?)?;
        T::register_dependencies(self)
    }

    pub fn get(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// # Errors
    ///
    /// [`SchemaError::UnknownType`] if nothing is registered under `name`.
    pub fn lookup(&self, name: &str) -> Result<&TypeDef, SchemaError> {
        self.get(name).ok_or_else(|| SchemaError::UnknownType {
            name: name.to_string(),
        })
    }

    pub fn struct_schema(&self, name: &str) -> Option<&Arc<StructSchema>> {
        match self.types.get(name)? {
            TypeDef::Struct(schema) => Some(schema),
            TypeDef::Enum(_) => None,
        }
    }

    pub fn enum_def(&self, name: &str) -> Option<&Arc<EnumDef>> {
        match self.types.get(name)? {
            TypeDef::Enum(def) => Some(def),
            TypeDef::Struct(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &TypeDef> {
        self.order.iter().filter_map(|name| self.types.get(name))
    }

    /// Names referenced by registered structs that are not registered.
    pub fn unresolved_names(&self) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for def in self.iter() {
            let TypeDef::Struct(schema) = def else {
                continue;
            };
            for name in schema.dependencies() {
                if !self.contains(name) && !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
            }
        }
        missing
    }

    /// The default value of `ty`: numeric zero, empty string or array,
    /// enum raw zero, or a record of field defaults.
    ///
    /// # Errors
    ///
    /// - [`SchemaError::UnknownType`] for an unregistered name.
    /// - [`SchemaError::RecursionLimit`] when nested structs go deeper
    ///   than `max_depth`.
    pub fn default_value(&self, ty: &TypeRef, max_depth: usize) -> Result<Value, SchemaError> {
        self.default_at(ty, 0, max_depth)
    }

    fn default_at(&self, ty: &TypeRef, depth: usize, max_depth: usize) -> Result<Value, SchemaError> {
        Ok(match ty {
            TypeRef::Primitive(p) => Value::zero(*p),
            TypeRef::String => Value::String(String::new()),
            TypeRef::Array(element) if **element == TypeRef::U8 => Value::Bytes(Vec::new()),
            TypeRef::Array(_) => Value::Array(Vec::new()),
            TypeRef::Named(name) => match self.lookup(name)? {
                TypeDef::Enum(def) => Value::Enum(def.value(0)),
                TypeDef::Struct(schema) => {
                    if depth >= max_depth {
                        return Err(SchemaError::RecursionLimit {
                            type_name: schema.name().to_string(),
                            limit: max_depth,
                        });
                    }
                    let mut record = Record::new(schema.shared_name());
                    for field in schema.fields() {
                        record.push(field.name(), self.default_at(field.ty(), depth + 1, max_depth)?);
                    }
                    Value::Struct(record)
                }
            },
        })
    }
}

// ── Per-type cache ───────────────────────────────────────────────────

type Cache = RwLock<HashMap<TypeId, Arc<SchemaRegistry>>>;

fn cache() -> &'static Cache {
    static CACHE: OnceLock<Cache> = OnceLock::new();
    CACHE.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The registry for `T`, built on first use and shared process-wide.
///
/// A poisoned cache lock is bypassed: the registry is rebuilt for the
/// caller and not stored.
///
/// # Errors
///
/// Any error from building the schemas involved. Failures are not cached.
pub fn registry_for<T: BinaryLayout>() -> Result<Arc<SchemaRegistry>, SchemaError> {
    let key = TypeId::of::<T>();
    if let Some(hit) = cache().read().ok().and_then(|map| map.get(&key).cloned()) {
        return Ok(hit);
    }

    let built = Arc::new(SchemaRegistry::of::<T>()?);
    match cache().write() {
        Ok(mut map) => Ok(Arc::clone(map.entry(key).or_insert(built))),
        Err(_) => Ok(built),
    }
}
