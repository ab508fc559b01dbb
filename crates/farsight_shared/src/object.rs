//! # Object Model
//!
//! An `Object` is an id plus an insertion-ordered property map. Objects live
//! in a session-owned `ObjectRegistry`; everything else refers to them
//! through `ObjectRef`, which is resolved on every use and never cached.

use crate::enums::UiType;
use crate::error::{FarsightError, FarsightResult};
use crate::ids::{ObjectId, PropertyName};
use crate::value::Value;
use indexmap::IndexMap;
use std::collections::HashMap;

/// A typed property slot on an object.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Declared type, fixed for the lifetime of the object.
    pub ty: UiType,
    /// Current value.
    pub value: Value,
}

impl Property {
    /// Replaces the value if it matches the declared type.
    pub fn set(&mut self, value: Value) -> FarsightResult<()> {
        if value.ty() != self.ty {
            return Err(FarsightError::TypeMismatch {
                expected: self.ty,
                found: value.ty(),
            });
        }
        self.value = value;
        Ok(())
    }
}

/// A provider-owned data object.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    id: ObjectId,
    properties: IndexMap<PropertyName, Property>,
}

impl Object {
    /// Creates an object without properties.
    #[must_use]
    pub fn new(id: ObjectId) -> Self {
        Self {
            id,
            properties: IndexMap::new(),
        }
    }

    /// Returns the object id.
    #[must_use]
    pub const fn id(&self) -> ObjectId {
        self.id
    }

    /// Declares a property holding the default value of `ty`.
    pub fn add(&mut self, name: PropertyName, ty: UiType) -> FarsightResult<&mut Property> {
        self.add_value(name, Value::default_for(ty))
    }

    /// Declares a property with an initial value; its type becomes the
    /// declared type.
    pub fn add_value(&mut self, name: PropertyName, value: Value) -> FarsightResult<&mut Property> {
        if self.properties.contains_key(&name) {
            return Err(FarsightError::DuplicateProperty {
                object: self.id.raw(),
                property: name.raw(),
            });
        }
        let ty = value.ty();
        Ok(self.properties.entry(name).or_insert(Property { ty, value }))
    }

    /// Looks up a property.
    #[must_use]
    pub fn get(&self, name: PropertyName) -> Option<&Property> {
        self.properties.get(&name)
    }

    /// Looks up a property for writing.
    #[must_use]
    pub fn get_mut(&mut self, name: PropertyName) -> Option<&mut Property> {
        self.properties.get_mut(&name)
    }

    /// Iterates properties in declaration order.
    pub fn properties(&self) -> impl Iterator<Item = (&PropertyName, &Property)> {
        self.properties.iter()
    }

    /// Number of declared properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns true if no properties are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Sets a declared property, rejecting type changes.
    pub fn set(&mut self, name: PropertyName, value: Value) -> FarsightResult<()> {
        let id = self.id;
        self.properties
            .get_mut(&name)
            .ok_or(FarsightError::UnknownReference {
                kind: "property",
                id: name.raw(),
            })
            .and_then(|prop| {
                prop.set(value).map_err(|err| {
                    tracing::debug!("object {} property {}: {}", id.raw(), name.raw(), err);
                    err
                })
            })
    }

    /// Borrows an object-list property for mutation.
    pub fn list_mut(&mut self, name: PropertyName) -> FarsightResult<&mut Vec<ObjectRef>> {
        let prop = self.properties.get_mut(&name).ok_or(FarsightError::UnknownReference {
            kind: "property",
            id: name.raw(),
        })?;
        match &mut prop.value {
            Value::ObjectList(list) => Ok(list),
            other => Err(FarsightError::TypeMismatch {
                expected: UiType::ObjectList,
                found: other.ty(),
            }),
        }
    }

    /// Inserts references at `index`, appending when `index` is past the end.
    pub fn insert_range(
        &mut self,
        name: PropertyName,
        index: usize,
        items: &[ObjectRef],
    ) -> FarsightResult<()> {
        let list = self.list_mut(name)?;
        let at = index.min(list.len());
        list.splice(at..at, items.iter().copied());
        Ok(())
    }

    /// Removes up to `count` references starting at `index`.
    pub fn remove_range(&mut self, name: PropertyName, index: usize, count: usize) -> FarsightResult<()> {
        let list = self.list_mut(name)?;
        let start = index.min(list.len());
        let end = start.saturating_add(count).min(list.len());
        list.drain(start..end);
        Ok(())
    }

    /// Moves `count` references starting at `from` so they start at `to`
    /// in the resulting list. Both ends are clamped.
    pub fn move_range(
        &mut self,
        name: PropertyName,
        from: usize,
        to: usize,
        count: usize,
    ) -> FarsightResult<()> {
        let list = self.list_mut(name)?;
        let start = from.min(list.len());
        let end = start.saturating_add(count).min(list.len());
        let moved: Vec<ObjectRef> = list.drain(start..end).collect();
        let at = to.min(list.len());
        list.splice(at..at, moved);
        Ok(())
    }

    /// Empties an object-list property.
    pub fn clear_list(&mut self, name: PropertyName) -> FarsightResult<()> {
        self.list_mut(name)?.clear();
        Ok(())
    }
}

/// A non-owning handle to an object, resolved against a registry on use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    /// Target object id.
    pub id: ObjectId,
}

impl ObjectRef {
    /// A reference to nothing.
    pub const NULL: Self = Self { id: ObjectId::NULL };

    /// Creates a reference.
    #[must_use]
    pub const fn new(id: ObjectId) -> Self {
        Self { id }
    }

    /// Returns true if the target currently exists.
    #[must_use]
    pub fn is_resolvable(&self, registry: &ObjectRegistry) -> bool {
        !self.id.is_null() && registry.contains(self.id)
    }

    /// Resolves the reference.
    #[must_use]
    pub fn resolve<'r>(&self, registry: &'r ObjectRegistry) -> Option<&'r Object> {
        if self.id.is_null() {
            return None;
        }
        registry.get(self.id)
    }
}

/// Session-owned store of objects.
#[derive(Debug, Default)]
pub struct ObjectRegistry {
    objects: HashMap<ObjectId, Object>,
}

impl ObjectRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an object, fully replacing any object with the same id.
    pub fn add_or_update(&mut self, object: Object) {
        self.objects.insert(object.id(), object);
    }

    /// Removes an object.
    pub fn remove(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    /// Looks up an object.
    #[must_use]
    pub fn get(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    /// Looks up an object for writing.
    #[must_use]
    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Looks up an object, reporting absence as an error.
    pub fn require_mut(&mut self, id: ObjectId) -> FarsightResult<&mut Object> {
        self.objects.get_mut(&id).ok_or(FarsightError::UnknownReference {
            kind: "object",
            id: id.raw(),
        })
    }

    /// Returns true if the id is present.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Drops every object.
    pub fn clear(&mut self) {
        self.objects.clear();
    }
}
