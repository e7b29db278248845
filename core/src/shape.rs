//! Cheap checks of a model's outermost serde shape.
//!
//! `shape_of` drives a value's `Serialize` impl just far enough to see which
//! serializer method it picks, then stops. `expects` does the same for a
//! `Deserialize` impl. Neither walks the whole value nor needs `'static`.

use std::convert::Infallible;
use std::fmt;

use serde::de::{self, Deserialize, Visitor};
use serde::ser::{self, Impossible, Serialize, Serializer};

/// Outermost shape of a serializable value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Serializes as a bare string (`String`, `&str`, `Cow<str>`, ...).
    Str(String),
    None,
    /// A struct, unit struct or newtype struct with its type name.
    Named(&'static str),
    /// A sequence; `element` is the first element's type name when it has one.
    Seq { empty: bool, element: Option<&'static str> },
    Other,
}

pub(crate) fn shape_of<T: Serialize + ?Sized>(value: &T) -> Shape {
    match value.serialize(ShapeSerializer) {
        Ok(never) => match never {},
        Err(Found(shape)) => shape,
    }
}

#[derive(Debug)]
struct Found(Shape);

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape {:?}", self.0)
    }
}

impl std::error::Error for Found {}

impl ser::Error for Found {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Found(Shape::Other)
    }
}

fn found(shape: Shape) -> Result<Infallible, Found> {
    Err(Found(shape))
}

struct ShapeSerializer;

macro_rules! other {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, _v: $ty) -> Result<Infallible, Found> {
                found(Shape::Other)
            }
        )*
    };
}

impl Serializer for ShapeSerializer {
    type Ok = Infallible;
    type Error = Found;
    type SerializeSeq = FirstElement;
    type SerializeTuple = Impossible<Infallible, Found>;
    type SerializeTupleStruct = Impossible<Infallible, Found>;
    type SerializeTupleVariant = Impossible<Infallible, Found>;
    type SerializeMap = Impossible<Infallible, Found>;
    type SerializeStruct = Impossible<Infallible, Found>;
    type SerializeStructVariant = Impossible<Infallible, Found>;

    other! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_bytes: &[u8],
    }

    fn serialize_str(self, v: &str) -> Result<Infallible, Found> {
        found(Shape::Str(v.to_owned()))
    }

    fn serialize_none(self) -> Result<Infallible, Found> {
        found(Shape::None)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, _value: &T) -> Result<Infallible, Found> {
        found(Shape::Other)
    }

    fn serialize_unit(self) -> Result<Infallible, Found> {
        found(Shape::Other)
    }

    fn serialize_unit_struct(self, name: &'static str) -> Result<Infallible, Found> {
        found(Shape::Named(name))
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
    ) -> Result<Infallible, Found> {
        found(Shape::Other)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        _value: &T,
    ) -> Result<Infallible, Found> {
        found(Shape::Named(name))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Infallible, Found> {
        found(Shape::Other)
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<FirstElement, Found> {
        Ok(FirstElement)
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple, Found> {
        Err(Found(Shape::Other))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleStruct, Found> {
        Err(Found(Shape::Other))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant, Found> {
        Err(Found(Shape::Other))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap, Found> {
        Err(Found(Shape::Other))
    }

    fn serialize_struct(self, name: &'static str, _len: usize) -> Result<Self::SerializeStruct, Found> {
        Err(Found(Shape::Named(name)))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant, Found> {
        Err(Found(Shape::Other))
    }
}

/// Stops at the first element.
struct FirstElement;

impl ser::SerializeSeq for FirstElement {
    type Ok = Infallible;
    type Error = Found;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), Found> {
        let element = match shape_of(value) {
            Shape::Named(name) => Some(name),
            _ => None,
        };
        Err(Found(Shape::Seq { empty: false, element }))
    }

    fn end(self) -> Result<Infallible, Found> {
        found(Shape::Seq {
            empty: true,
            element: None,
        })
    }
}

/// What a `Deserialize` impl asks its deserializer for first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Expects {
    /// An owned string (`String`, `Box<str>`, `Cow<str>`, ...).
    String,
    Seq,
    Other,
}

pub(crate) fn expects<T: for<'de> Deserialize<'de>>() -> Expects {
    match T::deserialize(Asked) {
        Err(Answer(expects)) => expects,
        Ok(_) => Expects::Other,
    }
}

#[derive(Debug)]
struct Answer(Expects);

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expects {:?}", self.0)
    }
}

impl std::error::Error for Answer {}

impl de::Error for Answer {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Answer(Expects::Other)
    }
}

struct Asked;

impl<'de> de::Deserializer<'de> for Asked {
    type Error = Answer;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Answer> {
        Err(Answer(Expects::Other))
    }

    fn deserialize_string<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Answer> {
        Err(Answer(Expects::String))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Answer> {
        Err(Answer(Expects::Seq))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str bytes
        byte_buf option unit unit_struct newtype_struct tuple tuple_struct
        map struct enum identifier ignored_any
    }
}
