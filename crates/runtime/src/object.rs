//! Object handles and the object table
//!
//! Every engine object is a slot in a global table holding its class name, its
//! reference-counting mode and, for user classes, the Rust instance. Handles are
//! plain keys; reference counts are managed explicitly by marshaling code with
//! [`retain`] and [`release`].

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::{Arc, LazyLock};

use gdbind_schema::VariantType;
use parking_lot::{Mutex, RwLock};
use slotmap::{new_key_type, SlotMap};

use crate::args::Arguments;
use crate::array::ArrayElement;
use crate::backend::CallError;
use crate::class::{CallOutcome, ExportedClass, GodotClass};
use crate::classdb::ClassDb;
use crate::variant::{FromVariant, ToVariant, Variant, VariantConversionError};

new_key_type! {
    /// Handle for a live engine object
    pub struct ObjectHandle;
}

/// Type-erased user instance attached to an object
trait Instance: Any + Send {
    fn call(&mut self, method: &str, args: &Arguments<'_>) -> CallOutcome;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: ExportedClass> Instance for T {
    fn call(&mut self, method: &str, args: &Arguments<'_>) -> CallOutcome {
        match self.dispatch_property(method, args) {
            CallOutcome::NotFound => self.dispatch_method(method, args),
            found => found,
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

type SharedInstance = Arc<Mutex<Box<dyn Instance>>>;

struct ObjectEntry {
    class: String,
    ref_counted: bool,
    refcount: u32,
    instance: Option<SharedInstance>,
}

static OBJECTS: LazyLock<RwLock<SlotMap<ObjectHandle, ObjectEntry>>> =
    LazyLock::new(|| RwLock::new(SlotMap::with_key()));

/// Allocate an object of `class`. Ref-counted objects start with no references.
pub fn create(class: &str, ref_counted: bool) -> ObjectHandle {
    let handle = OBJECTS.write().insert(ObjectEntry {
        class: class.to_string(),
        ref_counted,
        refcount: 0,
        instance: None,
    });
    tracing::trace!("Created {} object {:?}", class, handle);
    handle
}

/// Destroy an object regardless of its reference count
pub fn free(handle: ObjectHandle) -> bool {
    let removed = OBJECTS.write().remove(handle);
    if let Some(entry) = &removed {
        tracing::trace!("Freed {} object {:?}", entry.class, handle);
    }
    removed.is_some()
}

pub fn is_alive(handle: ObjectHandle) -> bool {
    OBJECTS.read().contains_key(handle)
}

/// Class the object was created as
pub fn class_of(handle: ObjectHandle) -> Option<String> {
    OBJECTS.read().get(handle).map(|e| e.class.clone())
}

/// The object's own reference-counting flag
pub fn is_ref_counted(handle: ObjectHandle) -> bool {
    OBJECTS.read().get(handle).is_some_and(|e| e.ref_counted)
}

pub fn reference_count(handle: ObjectHandle) -> Option<u32> {
    OBJECTS.read().get(handle).map(|e| e.refcount)
}

/// Take a reference to a ref-counted object
pub fn retain(handle: ObjectHandle) {
    match OBJECTS.write().get_mut(handle) {
        Some(entry) => entry.refcount += 1,
        None => tracing::warn!("retain on dead object {:?}", handle),
    }
}

/// Drop a reference; the object is destroyed when the last one goes.
/// Returns `true` if this call destroyed it.
pub fn release(handle: ObjectHandle) -> bool {
    let mut objects = OBJECTS.write();
    let Some(entry) = objects.get_mut(handle) else {
        tracing::warn!("release on dead object {:?}", handle);
        return false;
    };
    entry.refcount = entry.refcount.saturating_sub(1);
    if entry.refcount == 0 {
        objects.remove(handle);
        tracing::trace!("Last reference to {:?} released", handle);
        true
    } else {
        false
    }
}

/// [`retain`] if the object itself is ref-counted
pub fn retain_if_ref_counted(handle: ObjectHandle) {
    if is_ref_counted(handle) {
        retain(handle);
    }
}

/// [`release`] if the object itself is ref-counted
pub fn release_if_ref_counted(handle: ObjectHandle) {
    if is_ref_counted(handle) {
        release(handle);
    }
}

fn attach_instance(handle: ObjectHandle, instance: Box<dyn Instance>) {
    if let Some(entry) = OBJECTS.write().get_mut(handle) {
        entry.instance = Some(Arc::new(Mutex::new(instance)));
    }
}

fn instance_of(handle: ObjectHandle) -> Option<SharedInstance> {
    OBJECTS.read().get(handle).and_then(|e| e.instance.clone())
}

/// Invoke a user-class member by registry name
pub fn call(handle: ObjectHandle, method: &str, args: &[Variant]) -> Result<Option<Variant>, CallError> {
    let class = class_of(handle).ok_or(CallError::DeadObject)?;
    let instance = instance_of(handle).ok_or_else(|| CallError::NoInstance(class.clone()))?;
    let outcome = instance.lock().call(method, &Arguments::new(args));
    match outcome {
        CallOutcome::Returned(value) => Ok(value),
        CallOutcome::NotFound => Err(CallError::UnknownMethod {
            class,
            method: method.to_string(),
        }),
    }
}

/// A typed reference to an object
pub trait ObjectRef: Sized {
    /// Class every referenced object must be an instance of
    const CLASS: &'static str;

    /// Wrap `handle` without checking its class
    fn from_handle_unchecked(handle: ObjectHandle) -> Self;

    fn handle(&self) -> ObjectHandle;

    /// Wrap `handle` if the object is alive and an instance of [`ObjectRef::CLASS`]
    fn try_from_handle(handle: ObjectHandle) -> Result<Self, VariantConversionError> {
        let class = class_of(handle).ok_or(VariantConversionError::DeadObject)?;
        if ClassDb::is_subclass(&class, Self::CLASS) {
            Ok(Self::from_handle_unchecked(handle))
        } else {
            Err(VariantConversionError::WrongClass {
                expected: Self::CLASS.to_string(),
                found: class,
            })
        }
    }

    /// Whether the referenced object is ref-counted
    fn is_ref_counted(&self) -> bool {
        is_ref_counted(self.handle())
    }

    /// Checked conversion to another reference type
    fn cast<U: ObjectRef>(&self) -> Option<U> {
        U::try_from_handle(self.handle()).ok()
    }
}

impl<T: ObjectRef> ToVariant for T {
    fn to_variant(&self) -> Variant {
        Variant::Object(self.handle())
    }
}

impl<T: ObjectRef> FromVariant for T {
    fn from_variant(variant: &Variant) -> Result<Self, VariantConversionError> {
        match variant {
            Variant::Object(handle) => T::try_from_handle(*handle),
            other => Err(VariantConversionError::mismatch(VariantType::Object, other)),
        }
    }
}

impl<T: ObjectRef> ArrayElement for T {
    fn element_type() -> VariantType {
        VariantType::Object
    }

    fn element_class() -> Option<&'static str> {
        Some(T::CLASS)
    }
}

/// Typed handle to an instance of a user class
pub struct Gd<T: GodotClass> {
    handle: ObjectHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: GodotClass> Gd<T> {
    pub fn handle(&self) -> ObjectHandle {
        self.handle
    }
}

impl<T: ExportedClass> Gd<T> {
    /// Create the engine object and attach a new instance built by `init`
    pub fn new_with(init: impl FnOnce(Base<T::Base>) -> T) -> Self {
        let handle = create(T::CLASS_NAME, T::REF_COUNTED);
        let instance = init(Base::new(handle));
        attach_instance(handle, Box::new(instance));
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    /// Run `f` with shared access to the instance
    pub fn bind<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let instance = instance_of(self.handle)?;
        let guard = instance.lock();
        guard.as_any().downcast_ref::<T>().map(f)
    }

    /// Run `f` with exclusive access to the instance
    pub fn bind_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let instance = instance_of(self.handle)?;
        let mut guard = instance.lock();
        guard.as_any_mut().downcast_mut::<T>().map(f)
    }

    /// Call a registered member by name, as the engine would
    pub fn call(&self, method: &str, args: &[Variant]) -> Result<Option<Variant>, CallError> {
        call(self.handle, method, args)
    }
}

impl<T: GodotClass> ObjectRef for Gd<T> {
    const CLASS: &'static str = T::CLASS_NAME;

    fn from_handle_unchecked(handle: ObjectHandle) -> Self {
        Self {
            handle,
            _marker: PhantomData,
        }
    }

    fn handle(&self) -> ObjectHandle {
        self.handle
    }
}

impl<T: GodotClass> Clone for Gd<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: GodotClass> Copy for Gd<T> {}

impl<T: GodotClass> PartialEq for Gd<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl<T: GodotClass> Eq for Gd<T> {}

impl<T: GodotClass> fmt::Debug for Gd<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Gd<{}>({:?})", T::CLASS_NAME, self.handle)
    }
}

/// The engine-side part of a user class instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base<T: ObjectRef> {
    api: T,
}

impl<T: ObjectRef> Base<T> {
    pub fn new(handle: ObjectHandle) -> Self {
        Self {
            api: T::from_handle_unchecked(handle),
        }
    }

    pub fn handle(&self) -> ObjectHandle {
        self.api.handle()
    }
}

impl<T: ObjectRef> Deref for Base<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.api
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_frees_at_zero() {
        let handle = create("RefCounted", true);
        retain(handle);
        retain(handle);
        assert_eq!(reference_count(handle), Some(2));
        assert!(!release(handle));
        assert!(is_alive(handle));
        assert!(release(handle));
        assert!(!is_alive(handle));
        assert_eq!(reference_count(handle), None);
    }

    #[test]
    fn test_dynamic_retain_checks_flag() {
        let counted = create("RefCounted", true);
        let plain = create("Object", false);
        retain_if_ref_counted(counted);
        retain_if_ref_counted(plain);
        assert_eq!(reference_count(counted), Some(1));
        assert_eq!(reference_count(plain), Some(0));
        release_if_ref_counted(plain);
        assert!(is_alive(plain));
        assert!(free(plain));
        release_if_ref_counted(counted);
        assert!(!is_alive(counted));
    }

    #[test]
    fn test_dead_handle_conversion() {
        let handle = create("Object", false);
        free(handle);
        assert!(!is_alive(handle));
        assert_eq!(class_of(handle), None);
        assert!(!is_ref_counted(handle));
    }
}
