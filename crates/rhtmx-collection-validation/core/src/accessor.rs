// File: src/accessor.rs
// Purpose: Property accessors and collection views used instead of reflection

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type AccessorFn<T> = dyn Fn(&T) -> Option<Value> + Send + Sync;

/// Reads one named property off every element of a collection.
///
/// The closure returns `None` when the element does not expose the property,
/// which the evaluator reports as [`RuleError::UnknownProperty`](crate::RuleError).
pub struct PropertyAccessor<T> {
    name: String,
    display_name: Option<String>,
    read: Arc<AccessorFn<T>>,
}

impl<T> PropertyAccessor<T> {
    /// Create an accessor for a typed element
    ///
    /// # Example
    ///
    /// ```
    /// use rhtmx_collection_validation::PropertyAccessor;
    ///
    /// struct RoleRow { is_selected: bool }
    ///
    /// let accessor = PropertyAccessor::new("IsSelected", |row: &RoleRow| Some(row.is_selected.into()));
    /// assert_eq!(accessor.name(), "IsSelected");
    /// ```
    pub fn new<F>(name: impl Into<String>, read: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            display_name: None,
            read: Arc::new(read),
        }
    }

    /// Label used in error messages (defaults to the property name)
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }

    pub fn read(&self, item: &T) -> Option<Value> {
        (self.read)(item)
    }
}

impl PropertyAccessor<Value> {
    /// Accessor for dynamic elements: looks the key up on an object value.
    ///
    /// A missing key is only reported for the elements the evaluator reads.
    /// Elements after the point where the verdict is settled, and empty
    /// collections, are never inspected, so a misspelled key can go unnoticed
    /// until a collection reaches it.
    pub fn field(name: impl Into<String>) -> Self {
        let name = name.into();
        let key = name.clone();
        Self::new(name, move |item: &Value| item.get(&key).cloned())
    }
}

impl<T> Clone for PropertyAccessor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            read: Arc::clone(&self.read),
        }
    }
}

impl<T> fmt::Debug for PropertyAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyAccessor")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .finish_non_exhaustive()
    }
}

/// Shape of the value bound to a collection field
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectionView<'a, T> {
    /// The field holds no collection at all
    Missing,
    Items(&'a [T]),
    /// The field holds something that cannot be iterated
    NotEnumerable(&'static str),
}

/// Anything a collection rule can be attached to
pub trait AsCollection<T> {
    fn view(&self) -> CollectionView<'_, T>;
}

impl<T> AsCollection<T> for [T] {
    fn view(&self) -> CollectionView<'_, T> {
        CollectionView::Items(self)
    }
}

impl<T> AsCollection<T> for Vec<T> {
    fn view(&self) -> CollectionView<'_, T> {
        CollectionView::Items(self.as_slice())
    }
}

impl<T> AsCollection<T> for Option<Vec<T>> {
    fn view(&self) -> CollectionView<'_, T> {
        match self {
            Some(items) => CollectionView::Items(items.as_slice()),
            None => CollectionView::Missing,
        }
    }
}

impl AsCollection<Value> for Value {
    fn view(&self) -> CollectionView<'_, Value> {
        match self {
            Value::Null => CollectionView::Missing,
            Value::Array(items) => CollectionView::Items(items.as_slice()),
            other => CollectionView::NotEnumerable(other.type_name()),
        }
    }
}
