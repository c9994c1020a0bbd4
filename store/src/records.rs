//! Bookmark and category records.
//!
//! DESIGN
//! ======
//! A record is whatever JSON value the frontend stored. Nothing about its
//! shape is required: a record missing `title`, carrying extra keys or not
//! being an object at all still loads, and is written back exactly as it was
//! read (key order and explicit nulls included). The accessors read the
//! fields the manager understands and return `None` when they are absent or
//! not strings. Only a stored value that is not a JSON array resets a list.

#[cfg(test)]
#[path = "records_test.rs"]
mod records_test;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Storage key for the bookmark list.
pub const BOOKMARKS_KEY: &str = "bookmarks";

/// Storage key for the category list.
pub const CATEGORIES_KEY: &str = "categories";

fn str_field<'a>(value: &'a Value, name: &str) -> Option<&'a str> {
    value.get(name).and_then(Value::as_str)
}

/// Set or remove a string field. Non-object records are left untouched.
fn set_str_field(value: &mut Value, name: &str, field: Option<String>) {
    let Some(object) = value.as_object_mut() else {
        return;
    };
    match field {
        Some(field) => {
            object.insert(name.to_string(), Value::String(field));
        }
        None => {
            object.remove(name);
        }
    }
}

/// A saved link.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bookmark(Value);

impl Bookmark {
    #[must_use]
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("url".into(), Value::String(url.into()));
        fields.insert("title".into(), Value::String(title.into()));
        Self(Value::Object(fields))
    }

    /// Icon reference (URL or data URI) used for theming.
    #[must_use]
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        set_str_field(&mut self.0, "icon", Some(icon.into()));
        self
    }

    /// Name of the category to file this bookmark under.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.set_category(Some(category.into()));
        self
    }

    /// Identifying URL.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        str_field(&self.0, "url")
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        str_field(&self.0, "title")
    }

    #[must_use]
    pub fn icon(&self) -> Option<&str> {
        str_field(&self.0, "icon")
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        str_field(&self.0, "category")
    }

    /// File under `category`, or drop the `category` key with `None`.
    pub fn set_category(&mut self, category: Option<String>) {
        set_str_field(&mut self.0, "category", category);
    }

    /// Whether this bookmark is filed under `category` (`None` = uncategorized).
    #[must_use]
    pub fn is_in(&self, category: Option<&str>) -> bool {
        self.category() == category
    }

    /// The stored JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Bookmark {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// A named group of bookmarks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(Value);

impl Category {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::String(name.into()));
        Self(Value::Object(fields))
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }

    /// The stored JSON value.
    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for Category {
    fn from(value: Value) -> Self {
        Self(value)
    }
}
