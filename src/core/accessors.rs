// src/core/accessors.rs

//! # Accessor Tables
//!
//! An action exposes its members to the strategies through an [`Accessors`]
//! table instead of runtime reflection. The table is declared once per type
//! with a typed builder and then erased, so strategies can read and write any
//! action through `&dyn Any`:
//!
//! ```ignore
//! Accessors::of::<CopyFiles>()
//!     .option("source", Marks::new().index(0).required(), |a| &a.source, |a| &mut a.source)
//!     .option("force", Marks::new().alias('f'), |a| &a.force, |a| &mut a.force)
//!     .getter("mode", |a| a.mode.clone())
//!     .setter("mode", |a, mode: String| a.mode = mode.to_lowercase())
//!     .build()
//! ```
//!
//! Members of an embedded base value are appended after the type's own
//! members, so scans see the most-derived members first.

use crate::models::{ConversionError, OptionValue, Value, ValueType};
use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("accessor for '{expected}' was applied to a value of another type")]
    WrongTarget { expected: &'static str },
    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

type Reader = Arc<dyn Fn(&dyn Any) -> Result<Option<Value>, AccessError> + Send + Sync>;
type Writer =
    Arc<dyn Fn(&mut dyn Any, Option<Value>) -> Result<(), AccessError> + Send + Sync>;

fn target<A: Any>(any: &dyn Any) -> Result<&A, AccessError> {
    any.downcast_ref::<A>().ok_or(AccessError::WrongTarget {
        expected: type_name::<A>(),
    })
}

fn target_mut<A: Any>(any: &mut dyn Any) -> Result<&mut A, AccessError> {
    any.downcast_mut::<A>().ok_or(AccessError::WrongTarget {
        expected: type_name::<A>(),
    })
}

/// Option markers attached to a field: alias, positional index, required flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Marks {
    pub alias: Option<char>,
    pub index: Option<usize>,
    pub required: bool,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alias(mut self, alias: char) -> Self {
        self.alias = Some(alias);
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    /// A stored value, readable and writable.
    Field,
    Getter,
    Setter,
}

/// One type-erased member of an action.
#[derive(Clone)]
pub struct Member {
    name: String,
    kind: MemberKind,
    marks: Option<Marks>,
    value_type: ValueType,
    read: Option<Reader>,
    write: Option<Writer>,
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("marks", &self.marks)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}

impl Member {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }

    /// Present only on fields declared with [`AccessorsBuilder::option`].
    pub fn marks(&self) -> Option<&Marks> {
        self.marks.as_ref()
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    pub fn is_writable(&self) -> bool {
        self.write.is_some()
    }

    /// Reads the member from `target`. A member without a reader yields `None`.
    pub fn read(&self, target: &dyn Any) -> Result<Option<Value>, AccessError> {
        match &self.read {
            Some(read) => read(target),
            None => Ok(None),
        }
    }

    /// Writes `value` into `target`. Returns `false` when the member has no writer.
    pub fn write(&self, target: &mut dyn Any, value: Option<Value>) -> Result<bool, AccessError> {
        match &self.write {
            Some(write) => write(target, value).map(|()| true),
            None => Ok(false),
        }
    }
}

/// The erased member table of one action type.
#[derive(Debug, Clone)]
pub struct Accessors {
    type_name: &'static str,
    members: Vec<Member>,
}

impl Accessors {
    pub fn of<A: Any>() -> AccessorsBuilder<A> {
        AccessorsBuilder {
            members: Vec::new(),
            _target: PhantomData,
        }
    }

    /// A table without members, for actions that take no options.
    pub fn empty<A: ?Sized>() -> Self {
        Self {
            type_name: type_name::<A>(),
            members: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// All members, own members first, then embedded ones.
    pub fn members(&self) -> &[Member] {
        &self.members
    }

    fn find(&self, name: &str, kind: MemberKind) -> Option<&Member> {
        self.members
            .iter()
            .find(|member| member.kind == kind && member.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Member> {
        self.find(name, MemberKind::Field)
    }

    pub fn getter(&self, name: &str) -> Option<&Member> {
        self.find(name, MemberKind::Getter)
    }

    pub fn setter(&self, name: &str) -> Option<&Member> {
        self.find(name, MemberKind::Setter)
    }
}

/// Typed builder for an [`Accessors`] table of type `A`.
pub struct AccessorsBuilder<A> {
    members: Vec<Member>,
    _target: PhantomData<fn() -> A>,
}

impl<A> fmt::Debug for AccessorsBuilder<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessorsBuilder")
            .field("target", &type_name::<A>())
            .field("members", &self.members)
            .finish()
    }
}

impl<A: Any> AccessorsBuilder<A> {
    fn push_field<T: OptionValue>(
        mut self,
        name: &str,
        marks: Option<Marks>,
        get: fn(&A) -> &T,
        get_mut: fn(&mut A) -> &mut T,
    ) -> Self {
        let read: Reader = Arc::new(move |any: &dyn Any| -> Result<Option<Value>, AccessError> {
            Ok(get(target::<A>(any)?).to_value()?)
        });
        let write: Writer = Arc::new(move |any: &mut dyn Any, value: Option<Value>| -> Result<(), AccessError> {
            let slot = get_mut(target_mut::<A>(any)?);
            *slot = T::from_value(value)?;
            Ok(())
        });
        self.members.push(Member {
            name: name.to_string(),
            kind: MemberKind::Field,
            marks,
            value_type: T::value_type(),
            read: Some(read),
            write: Some(write),
        });
        self
    }

    /// A field bindable as an option, with its markers.
    pub fn option<T: OptionValue>(
        self,
        name: &str,
        marks: Marks,
        get: fn(&A) -> &T,
        get_mut: fn(&mut A) -> &mut T,
    ) -> Self {
        self.push_field(name, Some(marks), get, get_mut)
    }

    /// A plain field. Not an option by itself, but usable as an accessor by
    /// description-based actions.
    pub fn field<T: OptionValue>(
        self,
        name: &str,
        get: fn(&A) -> &T,
        get_mut: fn(&mut A) -> &mut T,
    ) -> Self {
        self.push_field(name, None, get, get_mut)
    }

    pub fn getter<T: OptionValue>(mut self, name: &str, get: fn(&A) -> T) -> Self {
        let read: Reader = Arc::new(move |any: &dyn Any| -> Result<Option<Value>, AccessError> {
            Ok(get(target::<A>(any)?).to_value()?)
        });
        self.members.push(Member {
            name: name.to_string(),
            kind: MemberKind::Getter,
            marks: None,
            value_type: T::value_type(),
            read: Some(read),
            write: None,
        });
        self
    }

    pub fn setter<T: OptionValue>(mut self, name: &str, set: fn(&mut A, T)) -> Self {
        let write: Writer = Arc::new(move |any: &mut dyn Any, value: Option<Value>| -> Result<(), AccessError> {
            let value = T::from_value(value)?;
            set(target_mut::<A>(any)?, value);
            Ok(())
        });
        self.members.push(Member {
            name: name.to_string(),
            kind: MemberKind::Setter,
            marks: None,
            value_type: T::value_type(),
            read: None,
            write: Some(write),
        });
        self
    }

    /// Appends the members of an embedded base value, reached through `get`/`get_mut`.
    pub fn embed<B: Any>(
        mut self,
        get: fn(&A) -> &B,
        get_mut: fn(&mut A) -> &mut B,
        base: AccessorsBuilder<B>,
    ) -> Self {
        for member in base.members {
            let read = member.read.map(|inner| -> Reader {
                Arc::new(move |any: &dyn Any| -> Result<Option<Value>, AccessError> {
                    let base: &dyn Any = get(target::<A>(any)?);
                    inner(base)
                })
            });
            let write = member.write.map(|inner| -> Writer {
                Arc::new(move |any: &mut dyn Any, value: Option<Value>| -> Result<(), AccessError> {
                    let base: &mut dyn Any = get_mut(target_mut::<A>(any)?);
                    inner(base, value)
                })
            });
            self.members.push(Member {
                read,
                write,
                ..member
            });
        }
        self
    }

    pub fn build(self) -> Accessors {
        Accessors {
            type_name: type_name::<A>(),
            members: self.members,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Base {
        verbose: bool,
    }

    #[derive(Debug, Default)]
    struct Derived {
        base: Base,
        count: i64,
        label: Option<String>,
    }

    fn table() -> Accessors {
        let base = Accessors::of::<Base>().option(
            "verbose",
            Marks::new().alias('v'),
            |b| &b.verbose,
            |b| &mut b.verbose,
        );
        Accessors::of::<Derived>()
            .option("count", Marks::new().required(), |d| &d.count, |d| &mut d.count)
            .field("label", |d| &d.label, |d| &mut d.label)
            .getter("double", |d| d.count * 2)
            .setter("double", |d, v: i64| d.count = v / 2)
            .embed(|d| &d.base, |d| &mut d.base, base)
            .build()
    }

    #[test]
    fn test_members_keep_declaration_order() {
        let accessors = table();
        let names: Vec<_> = accessors.members().iter().map(Member::name).collect();
        assert_eq!(names, ["count", "label", "double", "double", "verbose"]);
        assert_eq!(accessors.type_name(), type_name::<Derived>());
    }

    #[test]
    fn test_field_read_write() {
        let accessors = table();
        let mut target = Derived::default();
        let count = accessors.field("count").unwrap();
        assert!(count.write(&mut target, Some(Value::Integer(5))).unwrap());
        assert_eq!(target.count, 5);
        assert_eq!(count.read(&target).unwrap(), Some(Value::Integer(5)));

        let label = accessors.field("label").unwrap();
        assert_eq!(label.read(&target).unwrap(), None);
        assert_eq!(label.value_type(), &ValueType::Text);
    }

    #[test]
    fn test_getter_setter_pair() {
        let accessors = table();
        let mut target = Derived::default();
        let setter = accessors.setter("double").unwrap();
        setter.write(&mut target, Some(Value::Integer(10))).unwrap();
        assert_eq!(target.count, 5);
        assert!(!setter.is_readable());
        let getter = accessors.getter("double").unwrap();
        assert_eq!(getter.read(&target).unwrap(), Some(Value::Integer(10)));
        assert!(!getter.write(&mut target, None).unwrap());
    }

    #[test]
    fn test_embedded_member_reaches_base() {
        let accessors = table();
        let mut target = Derived::default();
        let verbose = accessors.field("verbose").unwrap();
        assert_eq!(verbose.marks().and_then(|m| m.alias), Some('v'));
        verbose.write(&mut target, Some(Value::Bool(true))).unwrap();
        assert!(target.base.verbose);
    }

    #[test]
    fn test_wrong_target_is_reported() {
        let accessors = table();
        let wrong = Base::default();
        let err = accessors.field("count").unwrap().read(&wrong).unwrap_err();
        assert!(matches!(err, AccessError::WrongTarget { .. }));
    }
}
