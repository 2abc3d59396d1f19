//! Type-keyed resource container.
//!
//! One `Registry` backs the volume stack (effect settings looked up by type)
//! and another carries frame-scoped data such as the active color target.

use ahash::AHashMap;
use color_eyre::eyre::{eyre, ContextCompat};
use color_eyre::Result;
use pretty_type_name::pretty_type_name;
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::ops::{Deref, DerefMut};

pub trait Resource: 'static {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: 'static> Resource for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

pub struct Read<'a, R: Resource>(Ref<'a, R>);

impl<R: Resource> Deref for Read<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<R: Resource> AsRef<R> for Read<'_, R> {
    fn as_ref(&self) -> &R {
        &self.0
    }
}

pub struct Write<'a, R: Resource>(RefMut<'a, R>);

impl<R: Resource> Deref for Write<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<R: Resource> DerefMut for Write<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Default)]
pub struct Registry {
    resources: AHashMap<TypeId, RefCell<Box<dyn Resource>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<R: Resource>(&mut self, resource: R) {
        let id = TypeId::of::<R>();
        let returned = self.resources.insert(id, RefCell::new(Box::new(resource)));
        if returned.is_some() {
            let name = pretty_type_name::<R>();
            log::warn!("Replaced resource {} since it was already present", name);
        }
    }

    pub fn get<R: Resource>(&self) -> Result<Read<R>> {
        let cell = self
            .resources
            .get(&TypeId::of::<R>())
            .with_context(|| eyre!("Resource {} is not present", pretty_type_name::<R>()))?;
        let borrowed = cell.try_borrow()?;
        let borrowed = Ref::filter_map(borrowed, |boxed| boxed.as_ref().as_any().downcast_ref())
            .map_err(|_| eyre!("Resource {} has a foreign type", pretty_type_name::<R>()))?;
        Ok(Read(borrowed))
    }

    pub fn get_mut<R: Resource>(&self) -> Result<Write<R>> {
        let cell = self
            .resources
            .get(&TypeId::of::<R>())
            .with_context(|| eyre!("Resource {} is not present", pretty_type_name::<R>()))?;
        let borrowed = cell.try_borrow_mut()?;
        let borrowed =
            RefMut::filter_map(borrowed, |boxed| boxed.as_mut().as_any_mut().downcast_mut())
                .map_err(|_| eyre!("Resource {} has a foreign type", pretty_type_name::<R>()))?;
        Ok(Write(borrowed))
    }

    pub fn remove<R: Resource>(&mut self) -> Option<R> {
        let cell = self.resources.remove(&TypeId::of::<R>())?;
        cell.into_inner().into_any().downcast::<R>().ok().map(|boxed| *boxed)
    }

    pub fn contains<R: Resource>(&self) -> bool {
        self.resources.contains_key(&TypeId::of::<R>())
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
