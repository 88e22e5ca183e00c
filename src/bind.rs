//! Form and query binding.
//!
//! A [`FormData`] holds every value of every field of a url-encoded
//! payload. Types opt in with [`BindForm`], pulling each field through
//! [`FormData::field`]:
//!
//! ```rust
//! use rally::{BindForm, Error, FormData};
//!
//! #[derive(Default)]
//! struct Search {
//!     term: String,
//!     page: u32,
//!     tags: Vec<String>,
//! }
//!
//! impl BindForm for Search {
//!     fn bind_form(&mut self, form: &FormData) -> Result<(), Error> {
//!         form.field("term", &mut self.term)?;
//!         form.field("page", &mut self.page)?;
//!         form.field("tags", &mut self.tags)
//!     }
//! }
//!
//! let mut search = Search::default();
//! search.bind_form(&FormData::parse(b"term=rust&tags=a&tags=b")).unwrap();
//! assert_eq!(search.tags, ["a", "b"]);
//! ```
//!
//! Only the kinds implementing [`FormField`] can be bound: the integer
//! widths, `bool`, the float widths, `String`, and a `Vec` of any of those.

use std::collections::HashMap;

use crate::error::Error;

/// Decoded url-encoded fields, keeping every value in arrival order.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, Vec<String>>,
}

impl FormData {
    /// Parses `application/x-www-form-urlencoded` bytes.
    pub fn parse(input: &[u8]) -> Self {
        let mut fields: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in url::form_urlencoded::parse(input) {
            fields.entry(name.into_owned()).or_default().push(value.into_owned());
        }
        Self { fields }
    }

    /// Appends every value of `other` after the values already held.
    pub fn extend(&mut self, other: FormData) {
        for (name, values) in other.fields {
            self.fields.entry(name).or_default().extend(values);
        }
    }

    /// First value of `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.first().map(String::as_str)
    }

    /// Every value of `name`; empty if the field is absent.
    pub fn all(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Decodes field `name` into `target`. An absent field leaves `target`
    /// untouched.
    pub fn field<T: FormField>(&self, name: &str, target: &mut T) -> Result<(), Error> {
        match self.fields.get(name) {
            Some(values) if !values.is_empty() => {
                *target = T::from_values(name, values)?;
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

/// Types that bind themselves from a [`FormData`].
pub trait BindForm {
    fn bind_form(&mut self, form: &FormData) -> Result<(), Error>;
}

/// A type a single form field can decode into.
pub trait FormField: Sized {
    /// Scalars take the first of `values` and fail when it is empty.
    fn from_values(name: &str, values: &[String]) -> Result<Self, Error>;
}

/// A scalar decoded from one raw value. The empty string is the zero value.
trait FormScalar: Sized {
    fn parse_raw(raw: &str) -> Result<Self, String>;
}

macro_rules! numeric_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl FormScalar for $ty {
            fn parse_raw(raw: &str) -> Result<Self, String> {
                if raw.is_empty() {
                    return Ok(<$ty>::default());
                }
                raw.parse().map_err(|e| format!("{e}"))
            }
        }
    )*};
}

numeric_scalar!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl FormScalar for bool {
    fn parse_raw(raw: &str) -> Result<Self, String> {
        match raw {
            "" | "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            other => Err(format!("invalid boolean `{other}`")),
        }
    }
}

impl FormScalar for String {
    fn parse_raw(raw: &str) -> Result<Self, String> {
        Ok(raw.to_owned())
    }
}

fn scalar<T: FormScalar>(name: &str, raw: &str) -> Result<T, Error> {
    T::parse_raw(raw).map_err(|message| Error::Bind { field: name.to_owned(), message })
}

macro_rules! form_field {
    ($($ty:ty),* $(,)?) => {$(
        impl FormField for $ty {
            fn from_values(name: &str, values: &[String]) -> Result<Self, Error> {
                let raw = values.first().ok_or_else(|| Error::Bind {
                    field: name.to_owned(),
                    message: "no value".to_owned(),
                })?;
                scalar(name, raw)
            }
        }

        impl FormField for Vec<$ty> {
            fn from_values(name: &str, values: &[String]) -> Result<Self, Error> {
                values.iter().map(|raw| scalar(name, raw)).collect()
            }
        }
    )*};
}

form_field!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, bool, String);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, PartialEq)]
    struct Profile {
        name: String,
        age: i32,
        money: f64,
        alive: bool,
        scores: Vec<u16>,
    }

    impl BindForm for Profile {
        fn bind_form(&mut self, form: &FormData) -> Result<(), Error> {
            form.field("Name", &mut self.name)?;
            form.field("Age", &mut self.age)?;
            form.field("Money", &mut self.money)?;
            form.field("Alive", &mut self.alive)?;
            form.field("Scores", &mut self.scores)
        }
    }

    #[test]
    fn binds_every_supported_kind() {
        let form = FormData::parse(b"Name=%E5%90%B4&Age=23&Money=123.456&Alive=true&Scores=1&Scores=2");
        let mut profile = Profile::default();
        profile.bind_form(&form).unwrap();
        assert_eq!(
            profile,
            Profile {
                name: "吴".to_owned(),
                age: 23,
                money: 123.456,
                alive: true,
                scores: vec![1, 2],
            }
        );
    }

    #[test]
    fn empty_values_are_zero_and_missing_fields_untouched() {
        let mut profile = Profile { name: "kept".to_owned(), age: 9, ..Profile::default() };
        profile.bind_form(&FormData::parse(b"Age=&Alive=")).unwrap();
        assert_eq!(profile.name, "kept");
        assert_eq!(profile.age, 0);
        assert!(!profile.alive);
    }

    #[test]
    fn scalar_without_values_is_a_bind_error() {
        let err = u32::from_values("page", &[]).unwrap_err();
        assert!(matches!(err, Error::Bind { ref field, .. } if field == "page"));
        assert_eq!(Vec::<u32>::from_values("page", &[]).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn extend_keeps_earlier_values_first() {
        let mut form = FormData::parse(b"a=body");
        form.extend(FormData::parse(b"a=query&b=2"));
        assert_eq!(form.all("a"), ["body", "query"]);
        assert_eq!(form.first("b"), Some("2"));
    }

    #[test]
    fn parse_failures_name_the_field() {
        let mut profile = Profile::default();
        let err = profile.bind_form(&FormData::parse(b"Age=old")).unwrap_err();
        assert!(matches!(err, Error::Bind { ref field, .. } if field == "Age"));

        let err = profile.bind_form(&FormData::parse(b"Scores=1&Scores=-1")).unwrap_err();
        assert!(matches!(err, Error::Bind { ref field, .. } if field == "Scores"));
    }

    #[test]
    fn first_and_all_values() {
        let form = FormData::parse(b"a=1&a=2&b=");
        assert_eq!(form.first("a"), Some("1"));
        assert_eq!(form.all("a"), ["1", "2"]);
        assert_eq!(form.first("b"), Some(""));
        assert!(form.all("c").is_empty());
    }
}
