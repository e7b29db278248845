//! XML bodies on top of `quick_xml`'s serde support.
//!
//! # Design
//! A struct is written with its type name as the root element. A top-level
//! sequence is wrapped the way .NET-style services expect it:
//!
//! ```xml
//! <ArrayOfItem><Item>..</Item><Item>..</Item></ArrayOfItem>
//! ```
//!
//! and a sequence target reads any such wrapper back, whatever the element
//! names. Struct fields holding `None` are left out so they read back as
//! `None` instead of `Some("")`. A struct field holding an empty sequence
//! writes no element at all and would read back as a missing field, so it is
//! rejected; mark such fields
//! `#[serde(default, skip_serializing_if = "Vec::is_empty")]` to send them.

use serde::de::value::{Error as ValueError, SeqDeserializer};
use serde::de::{DeserializeOwned, Deserializer};
use serde::ser::{self, Serialize, Serializer};
use serde::Deserialize;

use crate::codec::{deserialization, serialization};
use crate::error::ClientError;
use crate::shape::{expects, shape_of, Expects, Shape};

/// Element name for sequence items that have no type name (primitives, maps).
const DEFAULT_ITEM: &str = "item";

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, ClientError> {
    let text = match shape_of(value) {
        Shape::None => return Err(ClientError::InvalidArgument("request_model")),
        Shape::Seq { element, .. } => {
            let item = element.unwrap_or(DEFAULT_ITEM);
            let root = array_root(item);
            let items = quick_xml::se::to_string_with_root(item, &Fields(value)).map_err(serialization)?;
            format!("<{root}>{items}</{root}>")
        }
        _ => quick_xml::se::to_string(&Fields(value)).map_err(serialization)?,
    };
    if text.is_empty() {
        return Err(ClientError::InvalidArgument("request_model"));
    }
    Ok(text.into_bytes())
}

pub(crate) fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ClientError> {
    if text.trim().is_empty() {
        return Err(ClientError::Deserialization("empty XML document".to_string()));
    }
    if expects::<T>() == Expects::Seq {
        let array: ArrayOf<T> = quick_xml::de::from_str(text).map_err(deserialization)?;
        return match array.items {
            Some(items) => Ok(items),
            None => T::deserialize(SeqDeserializer::<_, ValueError>::new(std::iter::empty::<()>()))
                .map_err(deserialization),
        };
    }
    quick_xml::de::from_str(text).map_err(deserialization)
}

/// `Item` -> `ArrayOfItem`, `item` -> `ArrayOfItem`.
fn array_root(item: &str) -> String {
    let mut chars = item.chars();
    match chars.next() {
        Some(first) => format!("ArrayOf{}{}", first.to_ascii_uppercase(), chars.as_str()),
        None => "ArrayOf".to_string(),
    }
}

/// Root element whose children, whatever their names, are the items.
#[derive(Deserialize)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
struct ArrayOf<T> {
    #[serde(rename = "$value", default, deserialize_with = "present")]
    items: Option<T>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    T::deserialize(deserializer).map(Some)
}

/// Serializes the wrapped value through `FieldFilter`, at every depth.
struct Fields<'a, T: ?Sized>(&'a T);

impl<T: Serialize + ?Sized> Serialize for Fields<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(FieldFilter(serializer))
    }
}

/// Forwards to the inner serializer, skipping `None` struct fields and
/// rejecting empty sequence fields.
struct FieldFilter<S>(S);

/// Decide what a struct field becomes. `Ok(false)` means skip it.
fn keep_field<E: ser::Error, T: Serialize + ?Sized>(key: &str, value: &T) -> Result<bool, E> {
    match shape_of(value) {
        Shape::None => Ok(false),
        Shape::Seq { empty: true, .. } => Err(E::custom(format!(
            "field `{key}` is an empty sequence, which XML cannot distinguish from a missing field"
        ))),
        _ => Ok(true),
    }
}

macro_rules! forward {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<S::Ok, S::Error> {
                self.0.$method(v)
            }
        )*
    };
}

impl<S: Serializer> Serializer for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;
    type SerializeSeq = FieldFilter<S::SerializeSeq>;
    type SerializeTuple = FieldFilter<S::SerializeTuple>;
    type SerializeTupleStruct = FieldFilter<S::SerializeTupleStruct>;
    type SerializeTupleVariant = FieldFilter<S::SerializeTupleVariant>;
    type SerializeMap = FieldFilter<S::SerializeMap>;
    type SerializeStruct = FieldFilter<S::SerializeStruct>;
    type SerializeStructVariant = FieldFilter<S::SerializeStructVariant>;

    forward! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
        serialize_str: &str,
        serialize_bytes: &[u8],
        serialize_unit_struct: &'static str,
    }

    fn serialize_none(self) -> Result<S::Ok, S::Error> {
        self.0.serialize_none()
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<S::Ok, S::Error> {
        self.0.serialize_some(&Fields(value))
    }

    fn serialize_unit(self) -> Result<S::Ok, S::Error> {
        self.0.serialize_unit()
    }

    fn serialize_unit_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
    ) -> Result<S::Ok, S::Error> {
        self.0.serialize_unit_variant(name, variant_index, variant)
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error> {
        self.0.serialize_newtype_struct(name, &Fields(value))
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<S::Ok, S::Error> {
        self.0
            .serialize_newtype_variant(name, variant_index, variant, &Fields(value))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq, S::Error> {
        self.0.serialize_seq(len).map(FieldFilter)
    }

    fn serialize_tuple(self, len: usize) -> Result<Self::SerializeTuple, S::Error> {
        self.0.serialize_tuple(len).map(FieldFilter)
    }

    fn serialize_tuple_struct(
        self,
        name: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleStruct, S::Error> {
        self.0.serialize_tuple_struct(name, len).map(FieldFilter)
    }

    fn serialize_tuple_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, S::Error> {
        self.0
            .serialize_tuple_variant(name, variant_index, variant, len)
            .map(FieldFilter)
    }

    fn serialize_map(self, len: Option<usize>) -> Result<Self::SerializeMap, S::Error> {
        self.0.serialize_map(len).map(FieldFilter)
    }

    fn serialize_struct(self, name: &'static str, len: usize) -> Result<Self::SerializeStruct, S::Error> {
        self.0.serialize_struct(name, len).map(FieldFilter)
    }

    fn serialize_struct_variant(
        self,
        name: &'static str,
        variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, S::Error> {
        self.0
            .serialize_struct_variant(name, variant_index, variant, len)
            .map(FieldFilter)
    }

    fn is_human_readable(&self) -> bool {
        self.0.is_human_readable()
    }
}

impl<S: ser::SerializeSeq> ser::SerializeSeq for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), S::Error> {
        self.0.serialize_element(&Fields(value))
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeTuple> ser::SerializeTuple for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), S::Error> {
        self.0.serialize_element(&Fields(value))
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeTupleStruct> ser::SerializeTupleStruct for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), S::Error> {
        self.0.serialize_field(&Fields(value))
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeTupleVariant> ser::SerializeTupleVariant for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), S::Error> {
        self.0.serialize_field(&Fields(value))
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeMap> ser::SerializeMap for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), S::Error> {
        self.0.serialize_key(key)
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), S::Error> {
        self.0.serialize_value(&Fields(value))
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeStruct> ser::SerializeStruct for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), S::Error> {
        if keep_field::<S::Error, T>(key, value)? {
            self.0.serialize_field(key, &Fields(value))
        } else {
            self.0.skip_field(key)
        }
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), S::Error> {
        self.0.skip_field(key)
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

impl<S: ser::SerializeStructVariant> ser::SerializeStructVariant for FieldFilter<S> {
    type Ok = S::Ok;
    type Error = S::Error;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), S::Error> {
        if keep_field::<S::Error, T>(key, value)? {
            self.0.serialize_field(key, &Fields(value))
        } else {
            self.0.skip_field(key)
        }
    }

    fn skip_field(&mut self, key: &'static str) -> Result<(), S::Error> {
        self.0.skip_field(key)
    }

    fn end(self) -> Result<S::Ok, S::Error> {
        self.0.end()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Draft {
        name: String,
        note: Option<String>,
        tags: Vec<String>,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Tagged {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
    }

    fn items() -> Vec<Item> {
        vec![
            Item {
                id: 1,
                name: "a".to_string(),
            },
            Item {
                id: 2,
                name: "b".to_string(),
            },
        ]
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn sequence_is_wrapped_in_array_root() {
        let xml = text(encode(&items()).unwrap());
        assert_eq!(
            xml,
            "<ArrayOfItem><Item><id>1</id><name>a</name></Item><Item><id>2</id><name>b</name></Item></ArrayOfItem>"
        );
        let back: Vec<Item> = decode(&xml).unwrap();
        assert_eq!(back, items());
    }

    #[test]
    fn empty_sequence_round_trips() {
        let xml = text(encode(&Vec::<Item>::new()).unwrap());
        assert_eq!(xml, "<ArrayOfItem></ArrayOfItem>");
        let back: Vec<Item> = decode(&xml).unwrap();
        assert!(back.is_empty());
        let self_closing: Vec<Item> = decode("<ArrayOfItem/>").unwrap();
        assert!(self_closing.is_empty());
    }

    #[test]
    fn sequence_decode_ignores_element_names() {
        let xml = "<Items><row><id>5</id><name>e</name></row></Items>";
        let back: Vec<Item> = decode(xml).unwrap();
        assert_eq!(
            back,
            [Item {
                id: 5,
                name: "e".to_string()
            }]
        );
    }

    #[test]
    fn none_fields_are_left_out() {
        let draft = Draft {
            name: "d".to_string(),
            note: None,
            tags: vec!["t".to_string()],
        };
        let xml = text(encode(&draft).unwrap());
        assert_eq!(xml, "<Draft><name>d</name><tags>t</tags></Draft>");
        let back: Draft = decode(&xml).unwrap();
        assert_eq!(back, draft);
    }

    #[test]
    fn option_and_vec_fields_round_trip() {
        let cases = [
            Draft {
                name: String::new(),
                note: Some("n".to_string()),
                tags: vec!["a".to_string(), "b".to_string()],
            },
            Draft {
                name: "x".to_string(),
                note: None,
                tags: vec!["only".to_string()],
            },
        ];
        for draft in cases {
            let xml = text(encode(&draft).unwrap());
            let back: Draft = decode(&xml).unwrap();
            assert_eq!(back, draft, "{xml}");
        }

        for tags in [vec![], vec!["a".to_string()]] {
            let tagged = Tagged {
                name: "t".to_string(),
                tags,
            };
            let back: Tagged = decode(&text(encode(&tagged).unwrap())).unwrap();
            assert_eq!(back, tagged);
        }
    }

    #[test]
    fn empty_sequence_field_is_rejected() {
        let draft = Draft {
            name: "d".to_string(),
            note: None,
            tags: Vec::new(),
        };
        let err = encode(&draft).unwrap_err();
        assert!(
            matches!(err, ClientError::Serialization(ref msg) if msg.contains("`tags`")),
            "{err:?}"
        );
    }

    #[test]
    fn missing_model_is_rejected() {
        let err = encode(&None::<Item>).unwrap_err();
        assert!(matches!(err, ClientError::InvalidArgument("request_model")));
    }

    #[test]
    fn array_root_capitalizes() {
        assert_eq!(array_root("Item"), "ArrayOfItem");
        assert_eq!(array_root("item"), "ArrayOfItem");
    }
}
