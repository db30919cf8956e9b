// Copyright 2025 Cowboy AI, LLC.

//! Chain methods and their type-erased invocation
//!
//! Any `Fn(&mut Link<'_, L>, A1, .., An) -> O` with up to eight arguments is a
//! [`Method`] of layer `L`. Parameter types are recorded at declaration so the
//! builder can validate them and the engine can ask an
//! [`ArgumentSource`](crate::ArgumentSource) for each one.

use std::any::{type_name, Any, TypeId};
use std::marker::PhantomData;

use crate::chain::Control;
use crate::link::Link;
use crate::receiver::ReceiverDescriptor;

/// A resolved argument value
pub type ArgValue = Box<dyn Any>;

/// Type of one non-receiver method parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    type_id: TypeId,
    type_name: &'static str,
}

impl ParamInfo {
    /// Describe the parameter type `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
        }
    }

    /// Type id of the parameter
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Type name of the parameter
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Check whether the parameter has type `T`
    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

/// A resolved argument did not have the declared parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgumentMismatch {
    /// Zero-based parameter position
    pub index: usize,
    /// Declared parameter type
    pub expected: &'static str,
}

/// A function usable as a chain method of layer `L`
///
/// Implemented for closures and functions taking `&mut Link<'_, L>` followed by
/// up to eight arguments. The `Args` parameter only disambiguates arities.
pub trait Method<L, Args>: Send + Sync + 'static {
    /// Non-receiver parameter types, in order
    fn params(&self) -> Vec<ParamInfo>;

    /// Return type name, `None` for `()`
    fn returns(&self) -> Option<&'static str>;

    /// Invoke the method with resolved argument values
    fn call(&self, link: &mut Link<'_, L>, values: Vec<ArgValue>) -> Result<(), ArgumentMismatch>;
}

fn return_type<O: 'static>() -> Option<&'static str> {
    if TypeId::of::<O>() == TypeId::of::<()>() {
        None
    } else {
        Some(type_name::<O>())
    }
}

fn take_argument<T: 'static>(
    values: &mut std::vec::IntoIter<ArgValue>,
    index: &mut usize,
) -> Result<T, ArgumentMismatch> {
    let position = *index;
    *index += 1;
    let mismatch = ArgumentMismatch {
        index: position,
        expected: type_name::<T>(),
    };
    let value = values.next().ok_or(mismatch)?;
    value.downcast::<T>().map(|boxed| *boxed).map_err(|_| mismatch)
}

macro_rules! impl_method {
    ($($ty:ident),*) => {
        impl<L, F, O, $($ty,)*> Method<L, ($($ty,)*)> for F
        where
            L: 'static,
            F: Fn(&mut Link<'_, L> $(, $ty)*) -> O + Send + Sync + 'static,
            O: 'static,
            $($ty: 'static,)*
        {
            fn params(&self) -> Vec<ParamInfo> {
                vec![$(ParamInfo::of::<$ty>()),*]
            }

            fn returns(&self) -> Option<&'static str> {
                return_type::<O>()
            }

            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn call(&self, link: &mut Link<'_, L>, values: Vec<ArgValue>) -> Result<(), ArgumentMismatch> {
                let mut values = values.into_iter();
                let mut index = 0;
                $(
                    let $ty = take_argument::<$ty>(&mut values, &mut index)?;
                )*
                let _ = (self)(link $(, $ty)*);
                Ok(())
            }
        }
    };
}

impl_method!();
impl_method!(A1);
impl_method!(A1, A2);
impl_method!(A1, A2, A3);
impl_method!(A1, A2, A3, A4);
impl_method!(A1, A2, A3, A4, A5);
impl_method!(A1, A2, A3, A4, A5, A6);
impl_method!(A1, A2, A3, A4, A5, A6, A7);
impl_method!(A1, A2, A3, A4, A5, A6, A7, A8);

pub(crate) enum InvokeFailure {
    Receiver,
    Argument(ArgumentMismatch),
}

pub(crate) trait ErasedMethod: Send + Sync {
    fn invoke<'a>(
        &self,
        control: &'a mut dyn Control,
        receiver: &'a ReceiverDescriptor,
        values: Vec<ArgValue>,
    ) -> Result<(), InvokeFailure>;
}

/// Invokes a method on the layer inside the running instance
pub(crate) struct PointerMethod<L, Args, M> {
    method: M,
    _marker: PhantomData<fn() -> (L, Args)>,
}

impl<L, Args, M> PointerMethod<L, Args, M> {
    pub(crate) fn new(method: M) -> Self {
        Self {
            method,
            _marker: PhantomData,
        }
    }
}

impl<L, Args, M> ErasedMethod for PointerMethod<L, Args, M>
where
    L: 'static,
    Args: 'static,
    M: Method<L, Args>,
{
    fn invoke<'a>(
        &self,
        control: &'a mut dyn Control,
        receiver: &'a ReceiverDescriptor,
        values: Vec<ArgValue>,
    ) -> Result<(), InvokeFailure> {
        if receiver.project::<L>(control.instance()).is_none() {
            return Err(InvokeFailure::Receiver);
        }
        let mut link = Link::new(control, receiver, None);
        self.method.call(&mut link, values).map_err(InvokeFailure::Argument)
    }
}

/// Invokes a method on a copy of the layer taken at invocation time
pub(crate) struct ValueMethod<L, Args, M> {
    method: M,
    _marker: PhantomData<fn() -> (L, Args)>,
}

impl<L, Args, M> ValueMethod<L, Args, M> {
    pub(crate) fn new(method: M) -> Self {
        Self {
            method,
            _marker: PhantomData,
        }
    }
}

impl<L, Args, M> ErasedMethod for ValueMethod<L, Args, M>
where
    L: Clone + 'static,
    Args: 'static,
    M: Method<L, Args>,
{
    fn invoke<'a>(
        &self,
        control: &'a mut dyn Control,
        receiver: &'a ReceiverDescriptor,
        values: Vec<ArgValue>,
    ) -> Result<(), InvokeFailure> {
        let copy = receiver
            .project::<L>(control.instance())
            .cloned()
            .ok_or(InvokeFailure::Receiver)?;
        let mut link = Link::new(control, receiver, Some(copy));
        self.method.call(&mut link, values).map_err(InvokeFailure::Argument)
    }
}
