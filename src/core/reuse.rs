//! Purpose: Thread-safe reuse pools for per-call compilation objects.
//! Exports: `Reusable`, `ReusePool`, `Pooled`.
//! Role: Avoid reallocating descriptors and modifier sets under high call volume.
//! Invariants: A borrowed item is exclusively owned by its guard until dropped.
//! Invariants: Items are reset to their unset state before re-entering the pool.
//! Invariants: The pool never retains more than `capacity` idle items.
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, PoisonError};

use crate::core::command::CommandDescriptor;
use crate::core::modifier::ModifierSet;

pub const DEFAULT_POOL_CAPACITY: usize = 16;

/// An object that can be returned to its zero state for reuse.
pub trait Reusable: Default {
    fn reset(&mut self);
}

impl Reusable for ModifierSet {
    fn reset(&mut self) {
        ModifierSet::reset(self);
    }
}

impl Reusable for CommandDescriptor {
    fn reset(&mut self) {
        CommandDescriptor::reset(self);
    }
}

pub struct ReusePool<T: Reusable> {
    items: Mutex<Vec<T>>,
    capacity: usize,
}

impl<T: Reusable> ReusePool<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Mutex::new(Vec::with_capacity(capacity)),
            capacity,
        }
    }

    /// Borrow an item, allocating a fresh one when the pool is empty.
    pub fn acquire(&self) -> Pooled<'_, T> {
        let item = self
            .items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_default();
        Pooled {
            item: Some(item),
            pool: self,
        }
    }

    fn release(&self, mut item: T) {
        item.reset();
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        if items.len() < self.capacity {
            items.push(item);
        }
    }

    /// Number of idle items currently retained.
    pub fn available(&self) -> usize {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<T: Reusable> Default for ReusePool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl<T: Reusable> fmt::Debug for ReusePool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReusePool")
            .field("available", &self.available())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// Guard that resets and returns its item to the pool on drop.
pub struct Pooled<'a, T: Reusable> {
    item: Option<T>,
    pool: &'a ReusePool<T>,
}

impl<T: Reusable> Deref for Pooled<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        // Only `drop` takes the item.
        self.item.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable> DerefMut for Pooled<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.item.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T: Reusable> Drop for Pooled<'_, T> {
    fn drop(&mut self) {
        if let Some(item) = self.item.take() {
            self.pool.release(item);
        }
    }
}
